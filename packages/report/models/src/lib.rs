#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident taxonomy types, report tables, and summary export documents.
//!
//! The entity types mirror the rows owned by the incident store (categories,
//! channels, districts, incidents). The report types are derived, ephemeral
//! structures produced by the aggregators in `incident_report` and consumed
//! by the document renderer, either as HTML tables or serialized JSON.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Label of the synthetic row/column for incidents without a taxonomy value.
pub const UNASSIGNED: &str = "Unassigned";

/// Label of the trailing grand-total row in general reports.
pub const TOTAL_ROW_LABEL: &str = "(Total No. of Incidents)";

/// Header of the per-row total column.
pub const TOTAL_COLUMN: &str = "Total";

/// Status value that marks an incident as resolved.
pub const CLOSED_STATUS: &str = "CLOSED";

/// Whether an incident was filed as a complaint or an inquiry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentType {
    /// A complaint lodged against some party.
    Complaint,
    /// A request for information or advice.
    Inquiry,
}

/// A category taxonomy entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Store identifier.
    pub id: i64,
    /// Top-level grouping label (e.g. "Violence").
    pub top_category: String,
    /// Sub-category label.
    pub sub_category: String,
    /// Sinhala top-level label.
    pub sn_top_category: String,
    /// Tamil top-level label.
    pub tm_top_category: String,
    /// Sinhala sub-category label.
    pub sn_sub_category: String,
    /// Tamil sub-category label.
    pub tm_sub_category: String,
}

/// A reporting channel (how the incident reached the organization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Store identifier.
    pub id: i64,
    /// Channel name.
    pub name: String,
}

/// An administrative district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    /// District code referenced by incidents.
    pub code: String,
    /// District name.
    pub name: String,
}

/// The slice of an incident the in-memory summaries need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentSummary {
    /// Store identifier.
    pub id: String,
    /// Category reference, if assigned.
    pub category: Option<i64>,
    /// District code, if assigned.
    pub district: Option<String>,
    /// Raw severity score (0 = unset).
    pub severity: Option<i32>,
    /// Current status.
    pub current_status: Option<String>,
    /// Complaint or inquiry.
    pub incident_type: Option<IncidentType>,
    /// Creating user reference.
    pub created_by: Option<String>,
    /// Creation timestamp (UTC).
    pub created_date: NaiveDateTime,
}

/// An incident's public reference number and category, for slip exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentReference {
    /// Store identifier.
    pub id: String,
    /// Public reference number, if issued.
    pub ref_id: Option<String>,
    /// Category reference, if assigned.
    pub category: Option<i64>,
}

/// Distinguishes data rows from the synthetic total row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// One dimension value (or one district in detailed reports).
    Data,
    /// The trailing grand total.
    Total,
}

/// One row of a [`ReportTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Row label (dimension value, district, or day).
    pub label: String,
    /// One count per [`ReportTable::columns`] entry.
    pub values: Vec<i64>,
    /// Whether this is a data row or the total row.
    pub kind: RowKind,
}

impl ReportRow {
    /// Creates a data row.
    #[must_use]
    pub fn data(label: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            label: label.into(),
            values,
            kind: RowKind::Data,
        }
    }

    /// Creates a total row.
    #[must_use]
    pub fn total(label: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            label: label.into(),
            values,
            kind: RowKind::Total,
        }
    }
}

/// A computed report: a label column followed by integer count columns.
///
/// General reports have a single `Total` column and one row per dimension
/// value. Detailed reports have one column per pivoted dimension value
/// followed by `Total`, with one row per district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTable {
    /// Optional caption (used when several tables are concatenated).
    pub title: Option<String>,
    /// Header of the label column.
    pub label_header: String,
    /// Display headers of the count columns.
    pub columns: Vec<String>,
    /// Rows in display order; the total row is last.
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    /// Creates an empty table with the given headers.
    #[must_use]
    pub fn new(label_header: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            title: None,
            label_header: label_header.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Sets the caption.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Position of a count column by header.
    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Looks up a row by label.
    #[must_use]
    pub fn row(&self, label: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Count at `(row label, column header)`.
    #[must_use]
    pub fn value(&self, label: &str, column: &str) -> Option<i64> {
        let idx = self.column_index(column)?;
        self.row(label)?.values.get(idx).copied()
    }

    /// Iterates over the non-total rows.
    pub fn data_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| r.kind == RowKind::Data)
    }

    /// The trailing total row, if present.
    #[must_use]
    pub fn total_row(&self) -> Option<&ReportRow> {
        self.rows.iter().rev().find(|r| r.kind == RowKind::Total)
    }

    /// Flat `{column: count}` mapping of the total row, for dashboards.
    #[must_use]
    pub fn totals_by_column(&self) -> BTreeMap<String, i64> {
        let Some(total) = self.total_row() else {
            return BTreeMap::new();
        };
        self.columns
            .iter()
            .cloned()
            .zip(total.values.iter().copied())
            .collect()
    }
}

/// One row of the police-division report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliceDivisionRow {
    /// Province name.
    pub province: Option<String>,
    /// DI division name.
    pub di_division: Option<String>,
    /// Police division name.
    pub police_division: Option<String>,
    /// Incidents with a police station recorded.
    pub police_station_count: i64,
    /// Incidents received in the division.
    pub division_total: i64,
    /// Incidents whose latest status is not `CLOSED`.
    pub open_total: i64,
    /// Incidents whose latest status is `CLOSED`.
    pub closed_total: i64,
    /// Sum of `division_total` across the province.
    pub province_total: i64,
}

/// A subcategory leaf of the category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategoryCount {
    /// Localized (Sinhala) sub-category name.
    pub name: String,
    /// Matching incidents.
    pub count: u64,
}

/// A top-level node of the category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    /// Top-level label as stored in the taxonomy.
    pub top_category: String,
    /// Sinhala top-level label.
    pub category_name_sinhala: String,
    /// Tamil top-level label.
    pub category_name_tamil: String,
    /// Subcategories in taxonomy order.
    pub sub_categories: Vec<SubCategoryCount>,
}

impl CategoryNode {
    /// Sum of the subcategory counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.sub_categories.iter().map(|s| s.count).sum()
    }
}

/// Incident counts folded into the three summary top categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotals {
    /// "Violence" incidents.
    pub disputes: u64,
    /// "Violation of election law" incidents.
    pub violation_of_laws: u64,
    /// "Other" incidents.
    pub others: u64,
    /// Every incident counted, whatever its category.
    pub amount: u64,
}

/// Severity counts for the district-wise summary.
///
/// Unlike the severity report, which folds an unset severity into `Low`, an
/// unset severity (`0`) is left out of the three buckets here and only shows
/// up in `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityTotals {
    /// Severity 1 through 3.
    pub minor: u64,
    /// Severity 4 through 7.
    pub general: u64,
    /// Severity above 7.
    pub major: u64,
    /// Every incident counted.
    pub total: u64,
}

impl SeverityTotals {
    /// Adds `count` incidents of the given raw severity.
    pub const fn add(&mut self, severity: i32, count: u64) {
        match severity {
            1..=3 => self.minor += count,
            4..=7 => self.general += count,
            8.. => self.major += count,
            _ => {}
        }
        self.total += count;
    }
}

/// Category totals split by the creating organization unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintSummary {
    /// Created by headquarters users.
    pub national: CategoryTotals,
    /// Created by district office users.
    pub district: CategoryTotals,
    /// Created by any user of the organization.
    pub totals: CategoryTotals,
}

/// Daily complaint summary export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryExport {
    /// Renderer template path.
    pub template: String,
    /// Report date (`YYYY/MM/DD`).
    pub date: String,
    /// Totals over today's window.
    pub complaints_summary: ComplaintSummary,
    /// Totals over the 24 hours before the report was generated.
    pub complaints_past24hours: ComplaintSummary,
}

/// Complaint counts for the district-wise summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictSummaryRow {
    /// "Violence" complaints.
    pub violence: u64,
    /// "Violation of election law" complaints.
    pub breach_of_election_laws: u64,
    /// "Other" complaints.
    pub other: u64,
    /// Severity 1 through 3.
    pub minor: u64,
    /// Severity 4 through 7.
    pub general: u64,
    /// Severity above 7.
    pub major: u64,
    /// All complaints in the district.
    pub total: u64,
}

impl std::ops::AddAssign for DistrictSummaryRow {
    fn add_assign(&mut self, rhs: Self) {
        self.violence += rhs.violence;
        self.breach_of_election_laws += rhs.breach_of_election_laws;
        self.other += rhs.other;
        self.minor += rhs.minor;
        self.general += rhs.general;
        self.major += rhs.major;
        self.total += rhs.total;
    }
}

/// One district of the district-wise summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictSummary {
    /// District code.
    pub district: String,
    /// District name.
    pub district_name: String,
    /// Counts for the district.
    #[serde(flatten)]
    pub counts: DistrictSummaryRow,
}

/// District-wise daily complaint summary export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictSummaryExport {
    /// Renderer template path.
    pub template: String,
    /// Report date (`YYYY/MM/DD`).
    pub date: String,
    /// One row per district in store order.
    pub complaint_by_district: Vec<DistrictSummary>,
    /// Column totals across districts.
    pub complaint_totals_by_type: DistrictSummaryRow,
}

/// Category-tree export (daily, time-filtered, or weekly closed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummaryExport {
    /// Renderer template path.
    pub template: String,
    /// Report date (`YYYY/MM/DD`), for single-day exports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Range start as supplied, for ranged exports.
    #[serde(rename = "StartDate", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Range end as supplied, for ranged exports.
    #[serde(rename = "EndDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Matching incidents.
    pub total: u64,
    /// Category tree over the matching incidents.
    pub categories: Vec<CategoryNode>,
}

/// Closed incidents for one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentTotal {
    /// Department name (`None` when the workflow named none).
    pub departments: Option<String>,
    /// Close actions recorded.
    pub total: u64,
}

/// Weekly closed-by-department export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentClosedExport {
    /// Renderer template path.
    pub template: String,
    /// Report date (`YYYY/MM/DD`).
    pub date: String,
    /// One entry per department.
    pub total: Vec<DepartmentTotal>,
}

/// Incidents for one category identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// Category reference (`None` for uncategorized incidents).
    pub category: Option<i64>,
    /// Matching incidents.
    pub total: u64,
}

/// Per-category totals over a time span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotalsExport {
    /// Renderer template path.
    pub template: String,
    /// Report date (`YYYY/MM/DD`).
    pub date: String,
    /// One entry per category present in the span.
    pub total_per_category: Vec<CategoryTotal>,
}

/// Inquiry slip export for one incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquirySlipExport {
    /// Renderer template path.
    pub template: String,
    /// Incident reference number.
    pub reference_number: Option<String>,
    /// Report date (`YYYY/MM/DD`).
    pub date: String,
    /// Category identifier.
    pub category_code: i64,
    /// Sub-category name in English.
    pub category_name_en: String,
    /// Sub-category name in Sinhala.
    pub category_name_sn: String,
    /// Sub-category name in Tamil.
    pub category_name_tm: String,
    /// Name of the institution the inquiry is addressed to.
    pub institution_name: String,
}
