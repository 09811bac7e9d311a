// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SQLite-backed SMS inbox for desktop hosts and CI.
//
// The table mirrors the columns of the Android telephony `sms` table that
// the bridge cares about, so a fixture database behaves like the content
// provider: inbox rows are `type = 1`, dates are epoch milliseconds, and
// `address`/`body` may be NULL.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, Rows, params};
use tracing::{debug, instrument};

use ussdplus_core::error::{Result, UssdPlusError};
use ussdplus_core::types::CellValue;

use crate::traits::{InboxCursor, InboxQuery, MessageStore};

/// SQLite schema for the sms table.
const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS sms (
        _id       INTEGER PRIMARY KEY AUTOINCREMENT,
        thread_id INTEGER,
        address   TEXT,
        date      INTEGER NOT NULL DEFAULT 0,
        read      INTEGER NOT NULL DEFAULT 0,
        type      INTEGER NOT NULL DEFAULT 1,
        body      TEXT
    );
    CREATE INDEX IF NOT EXISTS sms_date ON sms(date);
"#;

/// `type` value of received messages.
const MESSAGE_TYPE_INBOX: i32 = 1;
/// `type` value of sent messages.
const MESSAGE_TYPE_SENT: i32 = 2;

/// Convert a `rusqlite::Error` into a `UssdPlusError::Database`.
fn db_err(e: rusqlite::Error) -> UssdPlusError {
    UssdPlusError::Database(e.to_string())
}

/// A message to insert into the fixture store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSms {
    pub thread_id: i64,
    pub address: Option<String>,
    pub body: Option<String>,
    pub date: i64,
    pub read: bool,
    pub message_type: i32,
}

impl NewSms {
    /// A received (inbox) message.
    pub fn received(address: Option<&str>, body: Option<&str>, date: i64) -> Self {
        Self {
            thread_id: 1,
            address: address.map(str::to_string),
            body: body.map(str::to_string),
            date,
            read: false,
            message_type: MESSAGE_TYPE_INBOX,
        }
    }

    /// A sent message. Never returned by inbox queries.
    pub fn sent(address: &str, body: &str, date: i64) -> Self {
        Self {
            message_type: MESSAGE_TYPE_SENT,
            read: true,
            ..Self::received(Some(address), Some(body), date)
        }
    }
}

/// SMS store backed by a SQLite database.
///
/// `rusqlite::Connection` is `Send` but not `Sync`, so it sits behind a
/// `Mutex`. Overlapping queries serialise on the lock; each still opens and
/// releases its own statement.
pub struct SqliteInbox {
    conn: Mutex<Connection>,
}

impl SqliteInbox {
    /// Open (or create) the inbox database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| UssdPlusError::Database(format!("WAL pragma: {e}")))?;
        Self::init(conn)
    }

    /// Open an in-memory inbox. Used by tests and demos.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| UssdPlusError::Database(format!("create table: {e}")))?;
        debug!("sms table ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| UssdPlusError::Database("inbox connection lock poisoned".into()))
    }

    /// Insert a message and return its `_id`.
    pub fn insert(&self, sms: &NewSms) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sms (thread_id, address, date, read, type, body)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                sms.thread_id,
                sms.address,
                sms.date,
                sms.read as i32,
                sms.message_type,
                sms.body,
            ],
        )
        .map_err(db_err)?;
        Ok(conn.last_insert_rowid())
    }

    /// Number of inbox (received) messages.
    pub fn count(&self) -> Result<u64> {
        self.lock()?
            .query_row(
                "SELECT COUNT(*) FROM sms WHERE type = ?1",
                params![MESSAGE_TYPE_INBOX],
                |row| row.get(0),
            )
            .map_err(db_err)
    }
}

/// Accept only plain column identifiers; they are interpolated into SQL.
fn column_ident(name: &str) -> Result<&str> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(UssdPlusError::Store(format!("invalid column name: {name:?}")))
    }
}

fn select_sql(query: &InboxQuery) -> Result<String> {
    let columns = match &query.projection {
        Some(cols) => cols
            .iter()
            .map(|c| column_ident(c))
            .collect::<Result<Vec<_>>>()?
            .join(", "),
        None => "*".to_string(),
    };
    Ok(format!(
        "SELECT {columns} FROM sms WHERE type = ?1 ORDER BY {} DESC LIMIT ?2",
        column_ident(&query.order_by)?
    ))
}

impl MessageStore for SqliteInbox {
    #[instrument(skip_all, fields(limit = query.limit))]
    fn query_inbox(
        &self,
        query: &InboxQuery,
        visit: &mut dyn FnMut(&mut dyn InboxCursor) -> Result<()>,
    ) -> Result<()> {
        let conn = self.lock()?;
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);

        let mut stmt = conn
            .prepare(&select_sql(query)?)
            .map_err(|e| UssdPlusError::Store(e.to_string()))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt
            .query(params![MESSAGE_TYPE_INBOX, limit])
            .map_err(|e| UssdPlusError::Store(e.to_string()))?;

        // Rows and statement are released when they leave this scope, on
        // every path out of `visit`.
        let mut cursor = SqliteCursor { columns, rows };
        visit(&mut cursor)
    }
}

/// Cursor over a live SQLite statement.
struct SqliteCursor<'stmt> {
    columns: Vec<String>,
    rows: Rows<'stmt>,
}

impl InboxCursor for SqliteCursor<'_> {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<CellValue>>> {
        let width = self.columns.len();
        let Some(row) = self
            .rows
            .next()
            .map_err(|e| UssdPlusError::Store(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut cells = Vec::with_capacity(width);
        for idx in 0..width {
            let value = row
                .get_ref(idx)
                .map_err(|e| UssdPlusError::Store(e.to_string()))?;
            let cell = match value {
                ValueRef::Null => CellValue::Null,
                ValueRef::Integer(i) => CellValue::Integer(i),
                ValueRef::Real(f) => CellValue::Real(f),
                ValueRef::Text(bytes) => {
                    let text = std::str::from_utf8(bytes).map_err(|e| UssdPlusError::Coercion {
                        column: self.columns[idx].clone(),
                        detail: e.to_string(),
                    })?;
                    CellValue::Text(text.to_string())
                }
                ValueRef::Blob(bytes) => CellValue::Blob(bytes.to_vec()),
            };
            cells.push(cell);
        }
        Ok(Some(cells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(inbox: &SqliteInbox, query: &InboxQuery) -> (Vec<String>, Vec<Vec<CellValue>>) {
        let mut columns = Vec::new();
        let mut rows = Vec::new();
        inbox
            .query_inbox(query, &mut |cursor| {
                columns = cursor.column_names().to_vec();
                while let Some(row) = cursor.next_row()? {
                    rows.push(row);
                }
                Ok(())
            })
            .unwrap();
        (columns, rows)
    }

    #[test]
    fn newest_first_and_limited() {
        let inbox = SqliteInbox::open_in_memory().unwrap();
        for i in 0..150 {
            inbox
                .insert(&NewSms::received(Some("+254700000000"), Some("hi"), 1_000 + i))
                .unwrap();
        }

        let (columns, rows) = collect(&inbox, &InboxQuery::recent("content://sms/inbox", 100));
        assert_eq!(columns, vec!["_id", "address", "body", "date"]);
        assert_eq!(rows.len(), 100);
        assert_eq!(rows[0][3], CellValue::Integer(1_149));
        assert_eq!(rows[99][3], CellValue::Integer(1_050));
    }

    #[test]
    fn sent_messages_excluded() {
        let inbox = SqliteInbox::open_in_memory().unwrap();
        inbox.insert(&NewSms::received(Some("BANK"), Some("in"), 10)).unwrap();
        inbox.insert(&NewSms::sent("BANK", "out", 20)).unwrap();

        assert_eq!(inbox.count().unwrap(), 1);
        let (_, rows) = collect(&inbox, &InboxQuery::recent("content://sms/inbox", 100));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][2], CellValue::Text("in".into()));
    }

    #[test]
    fn null_address_is_null_cell() {
        let inbox = SqliteInbox::open_in_memory().unwrap();
        inbox.insert(&NewSms::received(None, None, 5)).unwrap();

        let (_, rows) = collect(&inbox, &InboxQuery::recent("content://sms/inbox", 100));
        assert_eq!(rows[0][1], CellValue::Null);
        assert_eq!(rows[0][2], CellValue::Null);
    }

    #[test]
    fn wildcard_returns_all_columns() {
        let inbox = SqliteInbox::open_in_memory().unwrap();
        inbox.insert(&NewSms::received(Some("a"), Some("b"), 1)).unwrap();

        let query = InboxQuery::recent("content://sms/inbox", 10).with_wildcard_projection();
        let (columns, rows) = collect(&inbox, &query);
        assert!(columns.iter().any(|c| c == "thread_id"));
        assert_eq!(rows[0].len(), columns.len());
    }

    #[test]
    fn visitor_error_propagates_and_releases_statement() {
        let inbox = SqliteInbox::open_in_memory().unwrap();
        for i in 0..5 {
            inbox.insert(&NewSms::received(Some("a"), Some("b"), i)).unwrap();
        }

        let query = InboxQuery::recent("content://sms/inbox", 100);
        let result = inbox.query_inbox(&query, &mut |cursor| {
            cursor.next_row()?;
            Err(UssdPlusError::Store("visitor gave up".into()))
        });
        assert!(matches!(result, Err(UssdPlusError::Store(_))));

        // The connection is free again once the statement has been released.
        inbox.insert(&NewSms::received(Some("c"), Some("d"), 99)).unwrap();
        let (_, rows) = collect(&inbox, &query);
        assert_eq!(rows.len(), 6);
    }

    #[test]
    fn unknown_column_is_store_error() {
        let inbox = SqliteInbox::open_in_memory().unwrap();
        let mut query = InboxQuery::recent("content://sms/inbox", 10);
        query.projection = Some(vec!["subject_line".into()]);

        let result = inbox.query_inbox(&query, &mut |_| Ok(()));
        assert!(matches!(result, Err(UssdPlusError::Store(_))));
    }

    #[test]
    fn injected_column_name_rejected() {
        let inbox = SqliteInbox::open_in_memory().unwrap();
        let mut query = InboxQuery::recent("content://sms/inbox", 10);
        query.order_by = "date; DROP TABLE sms".into();

        let result = inbox.query_inbox(&query, &mut |_| Ok(()));
        assert!(matches!(result, Err(UssdPlusError::Store(_))));
        assert_eq!(inbox.count().unwrap(), 0);
    }

    #[test]
    fn file_backed_inbox_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.db");
        {
            let inbox = SqliteInbox::open(&path).unwrap();
            inbox.insert(&NewSms::received(Some("x"), Some("y"), 42)).unwrap();
        }
        let inbox = SqliteInbox::open(&path).unwrap();
        assert_eq!(inbox.count().unwrap(), 1);
    }
}
