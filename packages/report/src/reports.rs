//! Per-dimension report entry points.
//!
//! Each wraps one of the shapes in [`crate::aggregate`] with the pivot or
//! taxonomy logic for its dimension. Requests are validated before any
//! query runs; query errors propagate unchanged.

use std::collections::BTreeMap;

use duckdb::Connection;
use incident_report_models::{PoliceDivisionRow, ReportTable};
use incident_report_store::taxonomy::{distinct_channel_names, distinct_top_categories};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::ReportError;
use crate::aggregate::{
    CATEGORY, CHANNEL, DISTRICT, Pivot, SEVERITY_SEGMENTS, STATUS_SEGMENTS, SUBCATEGORY,
    date_series_report, detailed_report, general_report, scoped_general_report, segment_report,
};
use crate::config::ReportConfig;
use crate::filter::{Fragment, ReportRequest};
use crate::html;

const CATEGORY_JOIN: &str = "LEFT JOIN categories AS c ON i.category = c.id";
const CHANNEL_JOIN: &str = "LEFT JOIN channels AS ch ON i.info_channel = ch.id";

/// The catalogue of filtered reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum ReportKind {
    /// Top-level categories.
    Category,
    /// Sub-categories (sectioned by top category when detailed).
    Subcategory,
    /// Reporting channel.
    Mode,
    /// Per-day series.
    IncidentDate,
    /// Districts.
    District,
    /// Severity buckets.
    Severity,
    /// Resolution status buckets.
    Status,
}

impl ReportKind {
    /// Whether the kind has a per-district pivot variant.
    #[must_use]
    pub const fn has_detailed_variant(self) -> bool {
        matches!(
            self,
            Self::Category | Self::Subcategory | Self::Mode | Self::Severity | Self::Status
        )
    }
}

/// A generated report: one table, or one table per section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// A single table.
    Table(ReportTable),
    /// Tables rendered one after another.
    Sections(Vec<ReportTable>),
}

impl Report {
    /// The report's tables in display order.
    #[must_use]
    pub fn tables(&self) -> &[ReportTable] {
        match self {
            Self::Table(table) => std::slice::from_ref(table),
            Self::Sections(tables) => tables,
        }
    }

    /// HTML for the document renderer.
    #[must_use]
    pub fn to_html(&self) -> String {
        html::tables_to_html(self.tables())
    }

    /// Flat `{column: count}` totals of the first table, for dashboards.
    #[must_use]
    pub fn totals_by_column(&self) -> BTreeMap<String, i64> {
        self.tables()
            .first()
            .map(ReportTable::totals_by_column)
            .unwrap_or_default()
    }
}

/// Generates the report of `kind` for `request`.
///
/// # Errors
///
/// * [`ReportError::EmptyTypeFilter`] if no incident type is selected
/// * [`ReportError::InvalidDateRange`] if the end date precedes the start
/// * [`ReportError::DuckDb`] / [`ReportError::Store`] if a query fails
pub fn generate(
    conn: &Connection,
    kind: ReportKind,
    request: &ReportRequest,
    config: &ReportConfig,
) -> Result<Report, ReportError> {
    let filter = request.filter()?;

    if request.detailed && !kind.has_detailed_variant() {
        log::debug!("{kind} report has no detailed variant, generating the general report");
    }

    let report = match kind {
        ReportKind::Category => Report::Table(category_report(conn, request.detailed, &filter)?),
        ReportKind::Subcategory => subcategory_report(conn, request.detailed, &filter)?,
        ReportKind::Mode => Report::Table(mode_report(conn, request.detailed, &filter)?),
        ReportKind::IncidentDate => Report::Table(date_series_report(
            conn,
            request.start_date,
            request.end_date,
            config.time.incident_day_offset_hours,
            &filter,
        )?),
        ReportKind::District => Report::Table(general_report(conn, &DISTRICT, &filter)?),
        ReportKind::Severity => Report::Table(severity_report(conn, request.detailed, &filter)?),
        ReportKind::Status => Report::Table(status_report(conn, request.detailed, &filter)?),
    };

    log::info!(
        "Generated {kind} report for {}..={} ({} tables)",
        request.start_date,
        request.end_date,
        report.tables().len()
    );

    Ok(report)
}

/// Category report: per top category, or pivoted by top category per
/// district.
///
/// # Errors
///
/// Returns [`ReportError`] if a query fails.
pub fn category_report(
    conn: &Connection,
    detailed: bool,
    filter: &Fragment,
) -> Result<ReportTable, ReportError> {
    if detailed {
        let labels = distinct_top_categories(conn)?;
        detailed_report(conn, &Pivot::by_label("c.top_category", CATEGORY_JOIN, &labels, filter))
    } else {
        general_report(conn, &CATEGORY, filter)
    }
}

/// Sub-category report. The detailed variant is one general table per top
/// category rather than a pivot.
///
/// # Errors
///
/// Returns [`ReportError`] if a query fails.
pub fn subcategory_report(
    conn: &Connection,
    detailed: bool,
    filter: &Fragment,
) -> Result<Report, ReportError> {
    if !detailed {
        return Ok(Report::Table(general_report(conn, &SUBCATEGORY, filter)?));
    }

    let top_categories = distinct_top_categories(conn)?;
    if top_categories.is_empty() {
        log::warn!("No top categories in the taxonomy, falling back to the general report");
        return Ok(Report::Table(general_report(conn, &SUBCATEGORY, filter)?));
    }

    let sections = top_categories
        .iter()
        .map(|top| scoped_general_report(conn, &SUBCATEGORY, "top_category", top, filter))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Report::Sections(sections))
}

/// Mode (channel) report: per channel, or pivoted by channel per district.
///
/// # Errors
///
/// Returns [`ReportError`] if a query fails.
pub fn mode_report(
    conn: &Connection,
    detailed: bool,
    filter: &Fragment,
) -> Result<ReportTable, ReportError> {
    if detailed {
        let labels = distinct_channel_names(conn)?;
        detailed_report(conn, &Pivot::by_label("ch.name", CHANNEL_JOIN, &labels, filter))
    } else {
        general_report(conn, &CHANNEL, filter)
    }
}

/// Severity report over the High / Medium / Low buckets. Unset severities
/// count as Low.
///
/// # Errors
///
/// Returns [`ReportError`] if a query fails.
pub fn severity_report(
    conn: &Connection,
    detailed: bool,
    filter: &Fragment,
) -> Result<ReportTable, ReportError> {
    if detailed {
        detailed_report(conn, &Pivot::by_case(SEVERITY_SEGMENTS.cases, filter))
    } else {
        segment_report(conn, &SEVERITY_SEGMENTS, filter)
    }
}

/// Status report over the Resolved / Unresolved buckets.
///
/// # Errors
///
/// Returns [`ReportError`] if a query fails.
pub fn status_report(
    conn: &Connection,
    detailed: bool,
    filter: &Fragment,
) -> Result<ReportTable, ReportError> {
    if detailed {
        detailed_report(conn, &Pivot::by_case(STATUS_SEGMENTS.cases, filter))
    } else {
        segment_report(conn, &STATUS_SEGMENTS, filter)
    }
}

/// Incidents per province / DI division / police division, each joined to
/// its most recent status record. Not filtered by date or type.
///
/// Rows are sorted by province, DI division and police division;
/// `province_total` repeats the sum of `division_total` over the row's
/// province.
///
/// # Errors
///
/// Returns [`ReportError::DuckDb`] if the query fails.
pub fn police_division_report(conn: &Connection) -> Result<Vec<PoliceDivisionRow>, ReportError> {
    let query = Fragment::raw(
        "SELECT i.province, i.di_division, i.police_division, \
                COUNT(i.police_station), \
                COUNT(i.id), \
                COUNT(CASE WHEN latest.current_status <> 'CLOSED' THEN 1 END), \
                COUNT(CASE WHEN latest.current_status = 'CLOSED' THEN 1 END) \
         FROM incidents AS i \
         JOIN (\
             SELECT s.incident_id, s.current_status \
             FROM incident_statuses AS s \
             JOIN (\
                 SELECT incident_id, MAX(created_date) AS latest_date \
                 FROM incident_statuses GROUP BY incident_id\
             ) AS m ON m.incident_id = s.incident_id AND m.latest_date = s.created_date\
         ) AS latest ON latest.incident_id = i.id \
         GROUP BY i.province, i.di_division, i.police_division \
         ORDER BY i.province NULLS LAST, i.di_division NULLS LAST, i.police_division NULLS LAST",
    );

    let mut rows = query.query_map(conn, |row| {
        Ok(PoliceDivisionRow {
            province: row.get(0)?,
            di_division: row.get(1)?,
            police_division: row.get(2)?,
            police_station_count: row.get(3)?,
            division_total: row.get(4)?,
            open_total: row.get(5)?,
            closed_total: row.get(6)?,
            province_total: 0,
        })
    })?;

    let mut province_totals: BTreeMap<Option<String>, i64> = BTreeMap::new();
    for row in &rows {
        *province_totals.entry(row.province.clone()).or_default() += row.division_total;
    }
    for row in &mut rows {
        row.province_total = province_totals.get(&row.province).copied().unwrap_or_default();
    }

    log::info!("Generated police division report ({} rows)", rows.len());

    Ok(rows)
}
