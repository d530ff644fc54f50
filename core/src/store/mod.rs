//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database. Components call store
//! methods — they never execute SQL directly. SQLite transactions are the
//! "transactional record store" boundary: the escalation-log append and
//! the state-field update it documents commit together or not at all.

mod dispute;
mod entity;
mod ledger;
mod pattern;
mod report;
mod response;
mod violation;
mod watch;

pub use report::ReportAccountRow;
pub use response::FingerprintResponseRow;

use crate::error::CoreResult;
use chrono::NaiveDate;
use rusqlite::Connection;

pub struct CoreStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for a file
}

impl CoreStore {
    pub fn open(path: &str) -> CoreResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> CoreResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database. For in-memory
    /// databases this returns a fresh, isolated database.
    pub fn reopen(&self) -> CoreResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> CoreResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Column conversion helpers ──────────────────────────────────

pub(crate) fn sql_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn sql_date_opt(date: Option<NaiveDate>) -> Option<String> {
    date.map(sql_date)
}

pub(crate) fn read_date(s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn read_date_opt(s: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    s.map(|v| read_date(&v)).transpose()
}

pub(crate) fn bad_column(column: &'static str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        format!("unrecognized {column}: '{value}'").into(),
    )
}

pub(crate) fn json_vec(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn read_json_vec(s: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}
