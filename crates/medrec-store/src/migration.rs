//! Database schema migrations for SQLite.
//!
//! A simple versioned migration system: each migration is a SQL batch that
//! transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent - safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Principals: display-name source for read-side joins
        CREATE TABLE principals (
            principal_id TEXT PRIMARY KEY,     -- 16 bytes, hex
            name TEXT NOT NULL,
            role TEXT NOT NULL,                -- 'requester' | 'subject'
            created_at INTEGER NOT NULL
        );

        -- Consent requests: one row per authorization negotiation
        CREATE TABLE consent_requests (
            request_id TEXT PRIMARY KEY,       -- 16 bytes, hex
            requester_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            duration TEXT,                     -- '24h' | 'permanent', set on grant
            data_scope TEXT,                   -- free-form, set on grant
            expires_at INTEGER,                -- set iff duration = '24h'
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Medical records: insert-only, sensitive fields are vault envelopes
        CREATE TABLE medical_records (
            record_id TEXT PRIMARY KEY,        -- 16 bytes, hex
            subject_id TEXT NOT NULL,
            author_name TEXT NOT NULL,
            diagnosis TEXT NOT NULL,           -- vault envelope
            notes TEXT NOT NULL,               -- vault envelope
            attachment_ref TEXT,
            created_at INTEGER NOT NULL
        );

        -- Integrity chain: insert-only, no update or delete path exists.
        -- UNIQUE(previous_hash) backstops the no-shared-predecessor invariant.
        CREATE TABLE ledger_blocks (
            block_id INTEGER PRIMARY KEY AUTOINCREMENT,
            record_id TEXT NOT NULL REFERENCES medical_records(record_id),
            data_hash TEXT NOT NULL,           -- 64 hex chars
            previous_hash TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        );

        -- Indexes for common queries
        CREATE INDEX idx_consent_pair ON consent_requests(requester_id, subject_id, created_at);
        CREATE INDEX idx_consent_subject ON consent_requests(subject_id, created_at);
        CREATE INDEX idx_records_subject ON medical_records(subject_id, created_at);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"principals".to_string()));
        assert!(tables.contains(&"consent_requests".to_string()));
        assert!(tables.contains(&"medical_records".to_string()));
        assert!(tables.contains(&"ledger_blocks".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }
}
