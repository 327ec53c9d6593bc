//! Seeding helpers for tests.
//!
//! The report builder only reads the store; these inserts exist so tests in
//! this workspace can build small in-memory datasets.

use chrono::NaiveDateTime;
use duckdb::{Connection, params};
use incident_report_models::{Category, Channel, District};

use crate::{StoreError, format_timestamp};

/// A row for the `incidents` table with every column optional except the id
/// and creation timestamp.
#[derive(Debug, Clone, Default)]
pub struct IncidentFixture {
    /// Primary key.
    pub id: String,
    /// Public reference number.
    pub ref_id: Option<String>,
    /// Creation timestamp (UTC).
    pub created_date: NaiveDateTime,
    /// Occurrence timestamp (UTC).
    pub occurred_date: Option<NaiveDateTime>,
    /// Category reference.
    pub category: Option<i64>,
    /// Channel reference.
    pub info_channel: Option<i64>,
    /// District code.
    pub district: Option<String>,
    /// Province name.
    pub province: Option<String>,
    /// DI division name.
    pub di_division: Option<String>,
    /// Police division name.
    pub police_division: Option<String>,
    /// Police station name.
    pub police_station: Option<String>,
    /// Raw severity score.
    pub severity: Option<i32>,
    /// Current status.
    pub current_status: Option<String>,
    /// `COMPLAINT` or `INQUIRY`.
    pub incident_type: Option<String>,
    /// Creating user reference.
    pub created_by: Option<String>,
}

/// Builds a category whose localized names equal the English ones.
#[must_use]
pub fn category(id: i64, top: &str, sub: &str) -> Category {
    Category {
        id,
        top_category: top.to_string(),
        sub_category: sub.to_string(),
        sn_top_category: top.to_string(),
        tm_top_category: top.to_string(),
        sn_sub_category: sub.to_string(),
        tm_sub_category: sub.to_string(),
    }
}

/// Inserts a category.
///
/// # Errors
///
/// Returns [`StoreError`] if the insert fails.
pub fn insert_category(conn: &Connection, category: &Category) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO categories (
            id, top_category, sub_category,
            sn_top_category, tm_top_category, sn_sub_category, tm_sub_category
        ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            category.id,
            category.top_category,
            category.sub_category,
            category.sn_top_category,
            category.tm_top_category,
            category.sn_sub_category,
            category.tm_sub_category,
        ],
    )?;
    Ok(())
}

/// Inserts a channel.
///
/// # Errors
///
/// Returns [`StoreError`] if the insert fails.
pub fn insert_channel(conn: &Connection, channel: &Channel) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO channels (id, name) VALUES (?, ?)",
        params![channel.id, channel.name],
    )?;
    Ok(())
}

/// Inserts a district.
///
/// # Errors
///
/// Returns [`StoreError`] if the insert fails.
pub fn insert_district(conn: &Connection, district: &District) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO districts (code, name) VALUES (?, ?)",
        params![district.code, district.name],
    )?;
    Ok(())
}

/// Inserts an incident.
///
/// # Errors
///
/// Returns [`StoreError`] if the insert fails.
pub fn insert_incident(conn: &Connection, incident: &IncidentFixture) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO incidents (
            id, ref_id, created_date, occurred_date, category, info_channel, district,
            province, di_division, police_division, police_station,
            severity, current_status, incident_type, created_by
        ) VALUES (
            ?, ?, CAST(? AS TIMESTAMP), CAST(? AS TIMESTAMP), ?, ?, ?,
            ?, ?, ?, ?,
            ?, ?, ?, ?
        )",
        params![
            incident.id,
            incident.ref_id,
            format_timestamp(&incident.created_date),
            incident.occurred_date.as_ref().map(format_timestamp),
            incident.category,
            incident.info_channel,
            incident.district,
            incident.province,
            incident.di_division,
            incident.police_division,
            incident.police_station,
            incident.severity,
            incident.current_status,
            incident.incident_type,
            incident.created_by,
        ],
    )?;
    Ok(())
}

/// Inserts a status-history record.
///
/// # Errors
///
/// Returns [`StoreError`] if the insert fails.
pub fn insert_status(
    conn: &Connection,
    incident_id: &str,
    status: &str,
    created_date: &NaiveDateTime,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO incident_statuses (incident_id, current_status, created_date)
         VALUES (?, ?, CAST(? AS TIMESTAMP))",
        params![incident_id, status, format_timestamp(created_date)],
    )?;
    Ok(())
}

/// Inserts a close-workflow record.
///
/// # Errors
///
/// Returns [`StoreError`] if the insert fails.
pub fn insert_close_workflow(
    conn: &Connection,
    incident_id: &str,
    department: Option<&str>,
    created_date: &NaiveDateTime,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO close_workflows (incident_id, department, created_date)
         VALUES (?, ?, CAST(? AS TIMESTAMP))",
        params![incident_id, department, format_timestamp(created_date)],
    )?;
    Ok(())
}
