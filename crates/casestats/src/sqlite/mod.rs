use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags, params, params_from_iter};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::query::{AggregateRow, AggregateStatement, AggregateStore};

pub const SQLITE_SCHEMA_VERSION: &str = "casestats.fields.v1.sqlite.v1";
pub const SCHEMA_META_TABLE: &str = "casestats_schema_meta";

/// Unicode lowercase scalar used by case-insensitive text lookups.
pub const CASEFOLD_FUNCTION: &str = "casefold";

const CREATE_CLIENTS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY,
    role TEXT,
    pseudonym TEXT,
    age INTEGER,
    gender_identity TEXT,
    sexuality TEXT,
    residence TEXT,
    nationality TEXT,
    occupation TEXT,
    severe_disability TEXT,
    disability_detail TEXT,
    migration_background TEXT,
    contact_point TEXT,
    interpreter_languages TEXT,
    created_at TEXT
);
"#;

const CREATE_CASES_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS cases (
    id INTEGER PRIMARY KEY,
    client_id INTEGER REFERENCES clients (id),
    staff_id INTEGER,
    status TEXT NOT NULL DEFAULT 'open',
    start_date TEXT,
    notes TEXT
);
"#;

const CREATE_CONSULTATIONS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS consultations (
    id INTEGER PRIMARY KEY,
    counseling_office TEXT,
    scheduled_at TEXT,
    duration INTEGER,
    status TEXT NOT NULL DEFAULT 'planned',
    interpreter_hours REAL,
    session_count INTEGER,
    "type" TEXT,
    notes TEXT,
    counselor_id INTEGER,
    case_id INTEGER REFERENCES cases (id)
);
"#;

const CREATE_ACCOMPANIMENTS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS accompaniments (
    id INTEGER PRIMARY KEY,
    "date" TEXT,
    institution TEXT,
    interpreter_hours REAL,
    notes TEXT,
    client_id INTEGER REFERENCES clients (id),
    case_id INTEGER REFERENCES cases (id)
);
"#;

const CREATE_VIOLENCE_INCIDENTS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS violence_incidents (
    id INTEGER PRIMARY KEY,
    incident_date TEXT,
    location TEXT,
    postal_code TEXT,
    violence_type TEXT,
    incident_count TEXT,
    perpetrator_count TEXT,
    report_filed TEXT,
    medical_care TEXT,
    evidence_collected TEXT,
    affected_children INTEGER,
    directly_affected_children INTEGER,
    client_id INTEGER REFERENCES clients (id),
    case_id INTEGER REFERENCES cases (id)
);
"#;

const CREATE_VIOLENCE_CONSEQUENCES_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS violence_consequences (
    id INTEGER PRIMARY KEY,
    incident_id INTEGER NOT NULL UNIQUE REFERENCES violence_incidents (id),
    psychological TEXT,
    physical TEXT,
    work_impairment TEXT,
    financial_hardship TEXT,
    job_loss TEXT,
    social_isolation TEXT,
    suicidality TEXT,
    unspecified TEXT,
    lasting_impairments TEXT,
    other_text TEXT,
    notes TEXT
);
"#;

const CREATE_REQUESTS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS requests (
    id INTEGER PRIMARY KEY,
    channel TEXT,
    request_date TEXT NOT NULL,
    location TEXT,
    requester TEXT,
    request_kind TEXT,
    follow_up_required INTEGER NOT NULL DEFAULT 0,
    consultation_id INTEGER REFERENCES consultations (id),
    case_id INTEGER REFERENCES cases (id),
    staff_id INTEGER,
    created_at TEXT,
    CHECK (follow_up_required IN (0, 1))
);
"#;

const CREATE_INDEX_CASES_START_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_cases_start_date ON cases (start_date);
"#;

const CREATE_INDEX_CONSULTATIONS_CASE_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_consultations_case_time
ON consultations (case_id, scheduled_at);
"#;

const CREATE_INDEX_ACCOMPANIMENTS_CASE_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_accompaniments_case_date
ON accompaniments (case_id, "date");
"#;

const CREATE_INDEX_INCIDENTS_CASE_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_violence_incidents_case
ON violence_incidents (case_id);
"#;

const CREATE_INDEX_REQUESTS_DATE_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_requests_date ON requests (request_date);
"#;

const CREATE_META_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS casestats_schema_meta (
    schema_version TEXT NOT NULL,
    applied_at_utc TEXT NOT NULL
);
"#;

#[must_use]
pub fn schema_statements() -> &'static [&'static str] {
    &[
        CREATE_CLIENTS_TABLE_SQL,
        CREATE_CASES_TABLE_SQL,
        CREATE_CONSULTATIONS_TABLE_SQL,
        CREATE_ACCOMPANIMENTS_TABLE_SQL,
        CREATE_VIOLENCE_INCIDENTS_TABLE_SQL,
        CREATE_VIOLENCE_CONSEQUENCES_TABLE_SQL,
        CREATE_REQUESTS_TABLE_SQL,
        CREATE_INDEX_CASES_START_SQL,
        CREATE_INDEX_CONSULTATIONS_CASE_SQL,
        CREATE_INDEX_ACCOMPANIMENTS_CASE_SQL,
        CREATE_INDEX_INCIDENTS_CASE_SQL,
        CREATE_INDEX_REQUESTS_DATE_SQL,
        CREATE_META_TABLE_SQL,
    ]
}

#[must_use]
pub fn create_schema_sql() -> String {
    schema_statements().join("\n")
}

/// Opens (creating if needed) a writable store. Used by fixtures and loaders.
pub fn open_sqlite_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create sqlite parent directory: {}",
                parent.display()
            )
        })?;
    }

    Connection::open(path)
        .with_context(|| format!("failed to open sqlite database: {}", path.display()))
}

/// Opens an existing store without write access.
pub fn open_read_only(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        bail!("case store not found: {}", path.display());
    }

    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open case store read-only: {}", path.display()))
}

pub fn ensure_sqlite_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(&create_schema_sql())
        .context("failed to create sqlite schema")?;

    if schema_meta_has_version(connection, SQLITE_SCHEMA_VERSION)? {
        return Ok(());
    }

    let applied_at_utc = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("failed to format sqlite schema applied timestamp")?;
    connection
        .execute(
            &format!(
                "INSERT INTO {SCHEMA_META_TABLE} (schema_version, applied_at_utc) VALUES (?1, ?2)"
            ),
            params![SQLITE_SCHEMA_VERSION, applied_at_utc],
        )
        .context("failed to write sqlite schema meta row")?;

    Ok(())
}

fn schema_meta_has_version(connection: &Connection, schema_version: &str) -> Result<bool> {
    let query = format!(
        "SELECT EXISTS(SELECT 1 FROM {SCHEMA_META_TABLE} WHERE schema_version = ?1 LIMIT 1)"
    );
    let exists = connection
        .query_row(&query, [schema_version], |row| row.get::<usize, i64>(0))
        .context("failed to query sqlite schema version metadata")?;
    Ok(exists != 0)
}

/// Column names of a table as reported by `PRAGMA table_info`.
pub fn table_columns(connection: &Connection, table: &str) -> Result<Vec<String>> {
    let pragma_sql = format!("PRAGMA table_info({})", sqlite_single_quoted(table));
    let mut statement = connection
        .prepare(&pragma_sql)
        .with_context(|| format!("failed to prepare column introspection for `{table}`"))?;

    let column_rows = statement
        .query_map([], |row| row.get::<usize, String>(1))
        .with_context(|| format!("failed to execute column introspection for `{table}`"))?;

    column_rows
        .map(|row| row.context("failed to decode table_info row"))
        .collect()
}

fn sqlite_single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Registers `casefold(text)`; SQLite's own `lower` and `LIKE` fold ASCII only.
/// NULL stays NULL so it never matches a pattern.
pub fn register_text_functions(connection: &Connection) -> Result<()> {
    connection
        .create_scalar_function(
            CASEFOLD_FUNCTION,
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |context| {
                Ok(match context.get_raw(0) {
                    ValueRef::Null => None,
                    ValueRef::Integer(value) => Some(value.to_string()),
                    ValueRef::Real(value) => Some(value.to_string()),
                    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                        Some(String::from_utf8_lossy(bytes).to_lowercase())
                    }
                })
            },
        )
        .with_context(|| format!("failed to register sqlite function `{CASEFOLD_FUNCTION}`"))
}

/// SQLite-backed case store.
#[derive(Debug)]
pub struct SqliteMart {
    connection: Connection,
}

impl SqliteMart {
    pub fn new(connection: Connection) -> Result<Self> {
        register_text_functions(&connection)?;
        Ok(Self { connection })
    }

    pub fn open_read_only(path: &Path) -> Result<Self> {
        Self::new(open_read_only(path)?)
    }

    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl AggregateStore for SqliteMart {
    fn fetch_groups(&self, statement: &AggregateStatement) -> Result<Vec<AggregateRow>> {
        let mut prepared = self
            .connection
            .prepare(&statement.sql)
            .context("failed to prepare aggregate query")?;
        let rows = prepared
            .query_map(params_from_iter(statement.params.iter()), |row| {
                Ok(AggregateRow {
                    group: row.get::<usize, SqlValue>(0)?,
                    value: row.get::<usize, SqlValue>(1)?,
                })
            })
            .context("failed to execute aggregate query")?;

        rows.map(|row| row.context("failed to decode aggregate row"))
            .collect()
    }
}
