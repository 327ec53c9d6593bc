//! Taxonomy and incident loaders.
//!
//! These read whole reference tables (categories, channels, districts) in
//! store order, plus the incident slices the in-memory summaries walk.

use chrono::NaiveDateTime;
use duckdb::Connection;
use incident_report_models::{
    Category, District, IncidentReference, IncidentSummary, IncidentType,
};

use crate::{StoreError, format_timestamp, parse_timestamp};

/// Loads the full category taxonomy in store (id) order.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub fn load_categories(conn: &Connection) -> Result<Vec<Category>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id,
                COALESCE(top_category, ''),
                COALESCE(sub_category, ''),
                COALESCE(sn_top_category, ''),
                COALESCE(tm_top_category, ''),
                COALESCE(sn_sub_category, ''),
                COALESCE(tm_sub_category, '')
         FROM categories
         ORDER BY id",
    )?;

    let rows = stmt.query_map([], category_from_row)?;

    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Looks up one category by id.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub fn find_category(conn: &Connection, id: i64) -> Result<Option<Category>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id,
                COALESCE(top_category, ''),
                COALESCE(sub_category, ''),
                COALESCE(sn_top_category, ''),
                COALESCE(tm_top_category, ''),
                COALESCE(sn_sub_category, ''),
                COALESCE(tm_sub_category, '')
         FROM categories
         WHERE id = ?",
    )?;
    match stmt.query_row([id], category_from_row) {
        Ok(category) => Ok(Some(category)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StoreError::DuckDb(e)),
    }
}

fn category_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        top_category: row.get(1)?,
        sub_category: row.get(2)?,
        sn_top_category: row.get(3)?,
        tm_top_category: row.get(4)?,
        sn_sub_category: row.get(5)?,
        tm_sub_category: row.get(6)?,
    })
}

/// Loads all districts in code order.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub fn load_districts(conn: &Connection) -> Result<Vec<District>, StoreError> {
    let mut stmt = conn.prepare("SELECT code, COALESCE(name, '') FROM districts ORDER BY code")?;
    let rows = stmt.query_map([], |row| {
        Ok(District {
            code: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Distinct non-null top-level category labels, sorted.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub fn distinct_top_categories(conn: &Connection) -> Result<Vec<String>, StoreError> {
    distinct_labels(
        conn,
        "SELECT DISTINCT top_category FROM categories
         WHERE top_category IS NOT NULL
         ORDER BY top_category",
    )
}

/// Distinct non-null channel names, sorted.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub fn distinct_channel_names(conn: &Connection) -> Result<Vec<String>, StoreError> {
    distinct_labels(
        conn,
        "SELECT DISTINCT name FROM channels
         WHERE name IS NOT NULL
         ORDER BY name",
    )
}

fn distinct_labels(conn: &Connection, sql: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Looks up an incident's public reference number and category.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub fn find_incident_reference(
    conn: &Connection,
    id: &str,
) -> Result<Option<IncidentReference>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, ref_id, category FROM incidents WHERE id = ?")?;
    let result = stmt.query_row([id], |row| {
        Ok(IncidentReference {
            id: row.get(0)?,
            ref_id: row.get(1)?,
            category: row.get(2)?,
        })
    });
    match result {
        Ok(reference) => Ok(Some(reference)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StoreError::DuckDb(e)),
    }
}

/// Loads incidents created in `[from, until)` (UTC), in id order.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails or a timestamp cannot be
/// parsed.
pub fn load_incidents_created_in(
    conn: &Connection,
    from: &NaiveDateTime,
    until: &NaiveDateTime,
) -> Result<Vec<IncidentSummary>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, category, district, severity, current_status, incident_type, created_by,
                strftime(created_date, '%Y-%m-%d %H:%M:%S')
         FROM incidents
         WHERE created_date >= CAST(? AS TIMESTAMP) AND created_date < CAST(? AS TIMESTAMP)
         ORDER BY id",
    )?;

    let raw = stmt
        .query_map([format_timestamp(from), format_timestamp(until)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<i32>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(id, category, district, severity, status, incident_type, created_by, created)| {
            let incident_type = incident_type.and_then(|t| {
                t.parse::<IncidentType>()
                    .inspect_err(|_| log::warn!("Incident {id} has unknown type {t:?}"))
                    .ok()
            });
            Ok(IncidentSummary {
                created_date: parse_timestamp(&created)?,
                id,
                category,
                district,
                severity,
                current_status: status,
                incident_type,
                created_by,
            })
        })
        .collect()
}
