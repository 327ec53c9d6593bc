//! Incident store table contract.
//!
//! Report SQL is written against these table and column names. The
//! `severity_segments` and `status_segments` reference tables are seeded
//! with the fixed buckets the general severity and status reports join
//! against.

use std::path::Path;

use duckdb::Connection;

use crate::StoreError;

/// Opens (or creates) a store database at `path` and ensures the schema
/// exists.
///
/// # Errors
///
/// Returns [`StoreError`] if the connection or schema creation fails.
pub fn open(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    create_schema(&conn)?;

    Ok(conn)
}

/// Opens an in-memory store with the schema applied.
///
/// # Errors
///
/// Returns [`StoreError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Creates every store table if missing and seeds the segment tables.
///
/// # Errors
///
/// Returns [`StoreError`] if any statement fails.
pub fn create_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS categories (
            id BIGINT PRIMARY KEY,
            top_category TEXT,
            sub_category TEXT,
            sn_top_category TEXT,
            tm_top_category TEXT,
            sn_sub_category TEXT,
            tm_sub_category TEXT
        );

        CREATE TABLE IF NOT EXISTS channels (
            id BIGINT PRIMARY KEY,
            name TEXT
        );

        CREATE TABLE IF NOT EXISTS districts (
            code TEXT PRIMARY KEY,
            name TEXT
        );

        CREATE TABLE IF NOT EXISTS incidents (
            id TEXT NOT NULL PRIMARY KEY,
            ref_id TEXT,
            created_date TIMESTAMP NOT NULL,
            occurred_date TIMESTAMP,
            category BIGINT,
            info_channel BIGINT,
            district TEXT,
            province TEXT,
            di_division TEXT,
            police_division TEXT,
            police_station TEXT,
            severity INTEGER,
            current_status TEXT,
            incident_type TEXT,
            created_by TEXT
        );

        CREATE TABLE IF NOT EXISTS incident_statuses (
            incident_id TEXT NOT NULL,
            current_status TEXT,
            created_date TIMESTAMP NOT NULL
        );

        CREATE TABLE IF NOT EXISTS close_workflows (
            incident_id TEXT NOT NULL,
            department TEXT,
            created_date TIMESTAMP NOT NULL
        );

        CREATE TABLE IF NOT EXISTS severity_segments (
            name TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS status_segments (
            name TEXT PRIMARY KEY
        );

        INSERT OR IGNORE INTO severity_segments VALUES ('High'), ('Medium'), ('Low');
        INSERT OR IGNORE INTO status_segments VALUES ('Resolved'), ('Unresolved');",
    )?;

    log::debug!("Incident store schema ensured");

    Ok(())
}
