// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error replies sent back across the method channel.
//
// Every failure of a channel call is reduced to one of two machine-readable
// kinds plus a message. The application shell switches on the kind; the
// message is for logs and diagnostics.

use crate::error::UssdPlusError;

/// Machine-readable failure kind carried in an error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Capability not granted. The caller may retry after the user grants it.
    PermissionDenied,
    /// Store access or row mapping failed for this call.
    SmsError,
}

impl ErrorKind {
    /// Wire code string.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::SmsError => "SMS_ERROR",
        }
    }

    /// Parse a wire code string back into its kind.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PERMISSION_DENIED" => Some(ErrorKind::PermissionDenied),
            "SMS_ERROR" => Some(ErrorKind::SmsError),
            _ => None,
        }
    }

    /// Whether re-invoking the same call can succeed without a code change.
    pub fn recoverable(&self) -> bool {
        matches!(self, ErrorKind::PermissionDenied)
    }
}

/// A classified error ready to be encoded into an error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyError {
    pub kind: ErrorKind,
    /// Human-readable message. For `SMS_ERROR` this is the underlying error text.
    pub message: String,
}

impl ReplyError {
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// Map an error onto the two-kind reply taxonomy.
pub fn classify(err: &UssdPlusError) -> ErrorKind {
    match err {
        UssdPlusError::PermissionDenied(_) => ErrorKind::PermissionDenied,
        UssdPlusError::Store(_)
        | UssdPlusError::MissingColumn(_)
        | UssdPlusError::Coercion { .. }
        | UssdPlusError::Codec(_)
        | UssdPlusError::Database(_)
        | UssdPlusError::Config(_)
        | UssdPlusError::Io(_)
        | UssdPlusError::Serialization(_)
        | UssdPlusError::Bridge(_)
        | UssdPlusError::PlatformUnavailable => ErrorKind::SmsError,
    }
}

/// Build the reply for an error.
pub fn reply_error(err: &UssdPlusError) -> ReplyError {
    let kind = classify(err);
    let message = match kind {
        ErrorKind::PermissionDenied => "SMS permission not granted".to_string(),
        ErrorKind::SmsError => err.to_string(),
    };
    ReplyError { kind, message }
}
