// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the USSD Plus SMS bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OS-enforced capabilities the bridge may need before touching a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Read access to the SMS content provider.
    ReadSms,
}

impl Capability {
    /// Fully-qualified Android permission name.
    pub fn android_permission(&self) -> &'static str {
        match self {
            Capability::ReadSms => "android.permission.READ_SMS",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.android_permission())
    }
}

/// A single typed cell read from a store row.
///
/// The variants mirror both the Android `Cursor.getType()` field types and
/// the SQLite storage classes, so either backend can hand rows over without
/// loss.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    /// Short name of the stored type, used in coercion error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Integer(_) => "integer",
            CellValue::Real(_) => "real",
            CellValue::Text(_) => "text",
            CellValue::Blob(_) => "blob",
        }
    }
}

/// One SMS from the inbox, as returned across the method channel.
///
/// Field names on the wire match the Android `sms` table columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsMessage {
    /// Row identifier in the message store.
    #[serde(rename = "_id")]
    pub id: i64,
    /// Sender address. Empty when the store has none.
    pub address: String,
    /// Message text. Empty when the store has none.
    pub body: String,
    /// Send/receive time in milliseconds since the Unix epoch.
    pub date: i64,
}

impl SmsMessage {
    /// The `date` field as a UTC timestamp, or `None` if it is out of range.
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.date)
    }
}
