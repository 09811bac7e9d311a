// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the OS collaborators the SMS
// handler depends on.
//
// The handler never reaches for global OS state itself. Permission state and
// the message store are injected through these traits so that the same
// handler runs against the Android content provider, a desktop SQLite inbox,
// or a test fake.

use ussdplus_core::error::Result;
use ussdplus_core::types::{Capability, CellValue};

/// Unified bridge that groups the native capabilities the handler needs.
pub trait PlatformBridge: PermissionGate + MessageStore {
    /// Human-readable platform name (e.g. "Android").
    fn platform_name(&self) -> &str;
}

/// Runtime permission subsystem.
pub trait PermissionGate: Send + Sync {
    /// Whether the capability is currently granted.
    fn is_granted(&self, capability: Capability) -> Result<bool>;

    /// Ask the OS to prompt the user for the capability.
    ///
    /// Fire-and-forget: returns once the prompt has been dispatched. The
    /// user's answer arrives (if at all) through a channel this crate does not
    /// consume.
    fn request(&self, capability: Capability) -> Result<()>;
}

/// Read-only access to the SMS inbox.
pub trait MessageStore: Send + Sync {
    /// Run `query` and lend the resulting cursor to `visit`.
    ///
    /// The store owns the cursor: it is opened before `visit` runs and
    /// released exactly once afterwards, whether `visit` returns `Ok`, returns
    /// `Err`, or the query itself fails part way. A store that produces no
    /// cursor at all may return `Ok(())` without calling `visit`.
    fn query_inbox(
        &self,
        query: &InboxQuery,
        visit: &mut dyn FnMut(&mut dyn InboxCursor) -> Result<()>,
    ) -> Result<()>;
}

/// Forward-only row sequence over a store query.
pub trait InboxCursor {
    /// Column names in row order.
    fn column_names(&self) -> &[String];

    /// Advance to the next row and return its cells, or `None` at the end.
    fn next_row(&mut self) -> Result<Option<Vec<CellValue>>>;
}

/// Parameters for an inbox query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxQuery {
    /// Content URI of the inbox (ignored by stores that only have one).
    pub uri: String,
    /// Columns to fetch. `None` fetches every column.
    pub projection: Option<Vec<String>>,
    /// Column the rows are ordered by, newest first.
    pub order_by: String,
    /// Maximum number of rows.
    pub limit: usize,
}

/// Columns the handler reads from every inbox row.
pub const SMS_COLUMNS: [&str; 4] = ["_id", "address", "body", "date"];

impl InboxQuery {
    /// Most recent `limit` inbox messages, newest first.
    pub fn recent(uri: impl Into<String>, limit: usize) -> Self {
        Self {
            uri: uri.into(),
            projection: Some(SMS_COLUMNS.iter().map(|c| c.to_string()).collect()),
            order_by: "date".into(),
            limit,
        }
    }

    /// Same query but fetching every column.
    pub fn with_wildcard_projection(mut self) -> Self {
        self.projection = None;
        self
    }

    /// Android `sortOrder` argument: `"date DESC LIMIT 100"`.
    pub fn sort_order(&self) -> String {
        format!("{} DESC LIMIT {}", self.order_by, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_query_projects_sms_columns() {
        let query = InboxQuery::recent("content://sms/inbox", 100);
        assert_eq!(
            query.projection.as_deref(),
            Some(&["_id".to_string(), "address".into(), "body".into(), "date".into()][..])
        );
        assert_eq!(query.sort_order(), "date DESC LIMIT 100");
    }

    #[test]
    fn wildcard_drops_projection() {
        let query = InboxQuery::recent("content://sms/inbox", 5).with_wildcard_projection();
        assert!(query.projection.is_none());
        assert_eq!(query.limit, 5);
    }
}
