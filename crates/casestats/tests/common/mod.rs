#![allow(dead_code)]

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use casestats::query::{AggregateRow, AggregateStatement, AggregateStore};
use casestats::sqlite::{SqliteMart, ensure_sqlite_schema, open_sqlite_connection};
use rusqlite::Connection;

pub fn store() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory db should open");
    ensure_sqlite_schema(&connection).expect("schema should apply");
    connection
}

pub fn seed(connection: &Connection, sql: &str) {
    connection.execute_batch(sql).expect("fixture rows should insert");
}

pub fn mart(sql: &str) -> SqliteMart {
    let connection = store();
    seed(&connection, sql);
    SqliteMart::new(connection).expect("text functions should register")
}

pub fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}-{nanos}"))
}

/// Creates a store file on disk with the given rows.
pub fn store_file(path: &Path, sql: &str) {
    let connection = open_sqlite_connection(path).expect("store file should open");
    ensure_sqlite_schema(&connection).expect("schema should apply");
    seed(&connection, sql);
}

/// Two consultations in person, one by phone, one cancelled; all in March 2024.
pub const CONSULTATION_ROWS: &str = r#"
INSERT INTO clients (id, role, age, gender_identity, residence, nationality, contact_point)
VALUES
    (1, 'affected', 24, 'cis-female', 'leipzig-city', 'German', 'Polizei Leipzig'),
    (2, 'affected', 35, 'trans-male', 'abroad', 'Polish', 'Über eine Freundin');
INSERT INTO cases (id, client_id, status, start_date)
VALUES
    (1, 1, 'open', '2024-03-01'),
    (2, 2, 'closed', '2024-03-02');
INSERT INTO consultations (id, counseling_office, scheduled_at, duration, status, interpreter_hours, session_count, "type", case_id)
VALUES
    (1, 'leipzig-city', '2024-03-05T10:00:00', 60, 'occurred', 1.5, NULL, 'in-person', 1),
    (2, 'leipzig-city', '2024-03-12T10:00:00', 45, 'occurred', NULL, 2, 'in-person', 1),
    (3, 'north-saxony', '2024-03-20T14:30:00', 30, 'occurred', 0.25, 1, 'phone', 2),
    (4, 'north-saxony', '2024-03-21T09:00:00', 50, 'cancelled', 2.0, 1, 'video', 2);
"#;

/// Delegates to a real store and counts how often it was asked.
pub struct SpyStore {
    inner: Option<SqliteMart>,
    calls: Cell<usize>,
}

impl SpyStore {
    pub fn empty() -> Self {
        Self {
            inner: None,
            calls: Cell::new(0),
        }
    }

    pub fn wrapping(mart: SqliteMart) -> Self {
        Self {
            inner: Some(mart),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl AggregateStore for SpyStore {
    fn fetch_groups(&self, statement: &AggregateStatement) -> Result<Vec<AggregateRow>> {
        self.calls.set(self.calls.get() + 1);
        match &self.inner {
            Some(mart) => mart.fetch_groups(statement),
            None => Ok(Vec::new()),
        }
    }
}
