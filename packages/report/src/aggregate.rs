//! Report shapes.
//!
//! * [`general_report`]: one row per taxonomy value, an `Unassigned` row and
//!   a grand total row.
//! * [`segment_report`]: the general shape over a fixed bucket reference
//!   table (severity, status).
//! * [`detailed_report`]: one row per district with a one-hot [`Pivot`]
//!   column per taxonomy value, summed, plus a total row.
//! * [`date_series_report`]: per-day counts over a zero-filled calendar.
//!
//! Table and column names come from the `&'static` descriptors below. Every
//! label and date reaches SQL as a bound parameter.

use chrono::NaiveDate;
use duckdb::Connection;
use incident_report_models::{ReportRow, ReportTable, TOTAL_COLUMN, TOTAL_ROW_LABEL, UNASSIGNED};

use crate::ReportError;
use crate::filter::{Fragment, date_list_query};
use crate::taxonomy::{encode_column_names, is_encodable};

/// A taxonomy table incidents reference by foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionSource {
    /// Expression over `d` (the taxonomy table) yielding the display value.
    pub value_expr: &'static str,
    /// Header of the label column.
    pub display_label: &'static str,
    /// Taxonomy table name.
    pub table: &'static str,
    /// Column of `incidents` referencing `table`.
    pub foreign_key: &'static str,
    /// Referenced key column of `table`.
    pub primary_key: &'static str,
}

/// Top-level categories.
pub const CATEGORY: DimensionSource = DimensionSource {
    value_expr: "d.top_category",
    display_label: "Category",
    table: "categories",
    foreign_key: "category",
    primary_key: "id",
};

/// Sub-categories.
pub const SUBCATEGORY: DimensionSource = DimensionSource {
    value_expr: "d.sub_category",
    display_label: "Subcategory",
    table: "categories",
    foreign_key: "category",
    primary_key: "id",
};

/// Reporting channels.
pub const CHANNEL: DimensionSource = DimensionSource {
    value_expr: "d.name",
    display_label: "Mode",
    table: "channels",
    foreign_key: "info_channel",
    primary_key: "id",
};

/// Districts, labelled by name (or code when the name is unset).
pub const DISTRICT: DimensionSource = DimensionSource {
    value_expr: "COALESCE(d.name, d.code)",
    display_label: "District",
    table: "districts",
    foreign_key: "district",
    primary_key: "code",
};

/// A fixed bucket reference table and the predicates assigning incidents
/// to its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSource {
    /// Header of the label column.
    pub display_label: &'static str,
    /// Reference table with one `name` row per bucket.
    pub table: &'static str,
    /// `(bucket name, predicate over i)` pairs in report order. Predicates
    /// are mutually exclusive and cover every incident.
    pub cases: &'static [(&'static str, &'static str)],
}

impl SegmentSource {
    fn position(&self, name: &str) -> Option<usize> {
        self.cases.iter().position(|(label, _)| *label == name)
    }
}

/// Severity buckets. Unset severities fall into `Low`.
pub const SEVERITY_SEGMENTS: SegmentSource = SegmentSource {
    display_label: "Severity",
    table: "severity_segments",
    cases: &[
        ("High", "COALESCE(i.severity, 0) > 7"),
        ("Medium", "COALESCE(i.severity, 0) BETWEEN 4 AND 7"),
        ("Low", "COALESCE(i.severity, 0) < 4"),
    ],
};

/// Status buckets.
pub const STATUS_SEGMENTS: SegmentSource = SegmentSource {
    display_label: "Status",
    table: "status_segments",
    cases: &[
        ("Resolved", "i.current_status = 'CLOSED'"),
        ("Unresolved", "i.current_status IS DISTINCT FROM 'CLOSED'"),
    ],
};

fn count_filtered(conn: &Connection, filter: &Fragment) -> Result<i64, ReportError> {
    let mut query = Fragment::raw("SELECT COUNT(*) FROM incidents AS i WHERE ");
    query.push(filter);
    query.query_count(conn)
}

fn single_column_table(label_header: &str) -> ReportTable {
    ReportTable::new(label_header, vec![TOTAL_COLUMN.to_string()])
}

fn warn_on_mismatch(table: &ReportTable, total: i64) {
    let sum: i64 = table.data_rows().map(|row| row.values[0]).sum();
    if sum != total {
        log::warn!(
            "{} report rows sum to {sum} but {total} incidents matched",
            table.label_header
        );
    }
}

/// General report over `source`.
///
/// Every taxonomy value gets a row, zero-filled when nothing matches.
/// Incidents with no foreign key, or one missing from the taxonomy, are
/// counted in the `Unassigned` row. The last row counts every incident
/// matching `filter`.
///
/// # Errors
///
/// Returns [`ReportError::DuckDb`] if a query fails.
pub fn general_report(
    conn: &Connection,
    source: &DimensionSource,
    filter: &Fragment,
) -> Result<ReportTable, ReportError> {
    let DimensionSource {
        value_expr,
        table,
        foreign_key,
        primary_key,
        ..
    } = *source;

    let mut grouped = Fragment::raw(format!(
        "SELECT {value_expr}, COUNT(i.id) \
         FROM {table} AS d \
         LEFT JOIN incidents AS i ON i.{foreign_key} = d.{primary_key} AND ("
    ));
    grouped.push(filter).push_sql(&format!(
        ") GROUP BY {value_expr} ORDER BY {value_expr} NULLS LAST"
    ));
    let counts = grouped.query_map(conn, |row| {
        Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut orphans = Fragment::raw("SELECT COUNT(*) FROM incidents AS i WHERE (");
    orphans.push(filter).push_sql(&format!(
        ") AND (i.{foreign_key} IS NULL OR i.{foreign_key} NOT IN \
         (SELECT d.{primary_key} FROM {table} AS d WHERE d.{primary_key} IS NOT NULL))"
    ));
    let mut unassigned = orphans.query_count(conn)?;

    let total = count_filtered(conn, filter)?;

    let mut report = single_column_table(source.display_label);
    for (label, count) in counts {
        match label {
            Some(label) if label != UNASSIGNED => {
                report.rows.push(ReportRow::data(label, vec![count]));
            }
            _ => unassigned += count,
        }
    }
    report.rows.push(ReportRow::data(UNASSIGNED, vec![unassigned]));
    report.rows.push(ReportRow::total(TOTAL_ROW_LABEL, vec![total]));

    warn_on_mismatch(&report, total);
    log::debug!(
        "{} general report: {} rows, {total} incidents",
        source.display_label,
        report.rows.len()
    );

    Ok(report)
}

/// General report over the `source` values whose `scope_column` equals
/// `scope_value`, titled with `scope_value`.
///
/// There is no `Unassigned` row; the total row sums the values, which is
/// the number of matching incidents inside the scope.
///
/// # Errors
///
/// Returns [`ReportError::DuckDb`] if the query fails.
pub fn scoped_general_report(
    conn: &Connection,
    source: &DimensionSource,
    scope_column: &'static str,
    scope_value: &str,
    filter: &Fragment,
) -> Result<ReportTable, ReportError> {
    let DimensionSource {
        value_expr,
        table,
        foreign_key,
        primary_key,
        ..
    } = *source;

    let mut query = Fragment::raw(format!(
        "SELECT {value_expr}, COUNT(i.id) \
         FROM {table} AS d \
         LEFT JOIN incidents AS i ON i.{foreign_key} = d.{primary_key} AND ("
    ));
    query
        .push(filter)
        .push_sql(&format!(") WHERE d.{scope_column} = "))
        .push_param(scope_value)
        .push_sql(&format!(
            " GROUP BY {value_expr} ORDER BY {value_expr} NULLS LAST"
        ));
    let counts = query.query_map(conn, |row| {
        Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut report = single_column_table(source.display_label).with_title(scope_value);
    let mut total = 0;
    for (label, count) in counts {
        total += count;
        report.rows.push(ReportRow::data(
            label.unwrap_or_else(|| UNASSIGNED.to_string()),
            vec![count],
        ));
    }
    report.rows.push(ReportRow::total(TOTAL_ROW_LABEL, vec![total]));

    Ok(report)
}

/// General report over a fixed bucket reference table.
///
/// Rows follow [`SegmentSource::cases`]. Reference rows outside that list
/// are dropped and missing ones are skipped, both with a warning.
///
/// # Errors
///
/// Returns [`ReportError::DuckDb`] if a query fails.
pub fn segment_report(
    conn: &Connection,
    source: &SegmentSource,
    filter: &Fragment,
) -> Result<ReportTable, ReportError> {
    let mut names = Fragment::raw(format!("SELECT name FROM {} ORDER BY name", source.table))
        .query_map(conn, |row| row.get::<_, String>(0))?;

    let mut buckets = Fragment::raw("SELECT CASE");
    for (idx, (_, predicate)) in source.cases.iter().enumerate() {
        buckets.push_sql(&format!(" WHEN ({predicate}) THEN CAST({idx} AS BIGINT)"));
    }
    buckets.push_sql(" END AS bucket, COUNT(*) FROM incidents AS i WHERE ");
    buckets.push(filter).push_sql(" GROUP BY 1");
    let subtotals = buckets.query_map(conn, |row| {
        Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, i64>(1)?))
    })?;

    names.retain(|name| {
        let known = source.position(name).is_some();
        if !known {
            log::warn!("Ignoring unknown {} segment {name:?}", source.table);
        }
        known
    });
    names.sort_by_key(|name| source.position(name));

    for (expected, _) in source.cases {
        if !names.iter().any(|name| name.as_str() == *expected) {
            log::warn!("{} is missing segment {expected:?}", source.table);
        }
    }

    let counts = names.into_iter().map(|name| {
        let idx = source.position(&name).and_then(|idx| i64::try_from(idx).ok());
        let count = subtotals
            .iter()
            .filter(|(bucket, _)| *bucket == idx)
            .map(|(_, count)| count)
            .sum::<i64>();
        (name, count)
    });

    let total = count_filtered(conn, filter)?;

    let mut report = single_column_table(source.display_label);
    report
        .rows
        .extend(counts.map(|(name, count)| ReportRow::data(name, vec![count])));
    report.rows.push(ReportRow::total(TOTAL_ROW_LABEL, vec![total]));

    warn_on_mismatch(&report, total);

    Ok(report)
}

/// One pivot column: a display label and its encoded token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotColumn {
    /// Display label.
    pub label: String,
    /// Encoded column token.
    pub token: String,
}

impl PivotColumn {
    fn alias(&self) -> String {
        format!("\"p_{}\"", self.token)
    }
}

/// A per-incident one-hot query: the incident's district, one 0/1 column
/// per taxonomy value, and a constant 1 `row_total` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pivot {
    columns: Vec<PivotColumn>,
    select: Fragment,
}

impl Pivot {
    /// Pivots on equality of `value_expr` with each of `labels`.
    ///
    /// An `Unassigned` column is prepended and catches every incident whose
    /// value is null or not among the kept labels. Labels that are blank,
    /// have nothing encodable, repeat, or are literally `Unassigned` are
    /// dropped (and so fold into `Unassigned`).
    ///
    /// `join` is spliced after `FROM incidents AS i` and may bring the
    /// taxonomy table referenced by `value_expr` into scope.
    #[must_use]
    pub fn by_label<S: AsRef<str>>(
        value_expr: &'static str,
        join: &'static str,
        labels: &[S],
        filter: &Fragment,
    ) -> Self {
        let mut kept: Vec<String> = Vec::with_capacity(labels.len());
        for label in labels {
            let label = label.as_ref();
            if label == UNASSIGNED || !is_encodable(label) || kept.iter().any(|k| k == label) {
                log::warn!("Folding pivot label {label:?} into {UNASSIGNED}");
                continue;
            }
            kept.push(label.to_string());
        }

        let mut all_labels = Vec::with_capacity(kept.len() + 1);
        all_labels.push(UNASSIGNED.to_string());
        all_labels.extend(kept.iter().cloned());
        let columns = zip_columns(all_labels);

        let mut select = Fragment::raw("SELECT i.district AS district, ");
        if kept.is_empty() {
            select.push_sql(&format!("1 AS {}", columns[0].alias()));
        } else {
            select.push_sql(&format!("CASE WHEN {value_expr} IS NULL OR {value_expr} NOT IN ("));
            for (idx, label) in kept.iter().enumerate() {
                if idx > 0 {
                    select.push_sql(", ");
                }
                select.push_param(label.as_str());
            }
            select.push_sql(&format!(") THEN 1 ELSE 0 END AS {}", columns[0].alias()));
        }
        for column in &columns[1..] {
            select
                .push_sql(&format!(", CASE WHEN {value_expr} = "))
                .push_param(column.label.as_str())
                .push_sql(&format!(" THEN 1 ELSE 0 END AS {}", column.alias()));
        }
        select.push_sql(&format!(", 1 AS row_total FROM incidents AS i {join} WHERE "));
        select.push(filter);

        Self { columns, select }
    }

    /// Pivots on fixed `(label, predicate)` pairs. Predicates must be
    /// mutually exclusive and cover every incident.
    #[must_use]
    pub fn by_case(cases: &[(&str, &'static str)], filter: &Fragment) -> Self {
        let columns = zip_columns(cases.iter().map(|(label, _)| (*label).to_string()).collect());

        let mut select = Fragment::raw("SELECT i.district AS district");
        for (column, (_, predicate)) in columns.iter().zip(cases) {
            select.push_sql(&format!(
                ", CASE WHEN {predicate} THEN 1 ELSE 0 END AS {}",
                column.alias()
            ));
        }
        select.push_sql(", 1 AS row_total FROM incidents AS i WHERE ");
        select.push(filter);

        Self { columns, select }
    }

    /// Pivot columns in output order.
    #[must_use]
    pub fn columns(&self) -> &[PivotColumn] {
        &self.columns
    }

    /// The per-incident one-hot query.
    #[must_use]
    pub const fn select(&self) -> &Fragment {
        &self.select
    }
}

fn zip_columns(labels: Vec<String>) -> Vec<PivotColumn> {
    let tokens = encode_column_names(&labels);
    labels
        .into_iter()
        .zip(tokens)
        .map(|(label, token)| PivotColumn { label, token })
        .collect()
}

/// Sums `pivot` by district.
///
/// Columns are the pivot labels followed by `Total`; rows are districts in
/// code order (a missing district reads `Unassigned`), then a `Total` row of
/// column sums.
///
/// # Errors
///
/// Returns [`ReportError::DuckDb`] if the query fails.
pub fn detailed_report(conn: &Connection, pivot: &Pivot) -> Result<ReportTable, ReportError> {
    let sums = pivot
        .columns
        .iter()
        .map(|column| format!("CAST(SUM({}) AS BIGINT)", column.alias()))
        .collect::<Vec<_>>()
        .join(", ");

    let mut query = Fragment::raw(format!(
        "SELECT district, {sums}, CAST(SUM(row_total) AS BIGINT) FROM ("
    ));
    query
        .push(&pivot.select)
        .push_sql(") AS pivot GROUP BY district ORDER BY district NULLS LAST");

    let width = pivot.columns.len() + 1;
    let rows = query.query_map(conn, |row| {
        let district = row.get::<_, Option<String>>(0)?;
        let values = (1..=width)
            .map(|idx| row.get::<_, i64>(idx))
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok((district, values))
    })?;

    let mut columns: Vec<String> = pivot.columns.iter().map(|c| c.label.clone()).collect();
    columns.push(TOTAL_COLUMN.to_string());
    let mut report = ReportTable::new("district", columns);

    let mut totals = vec![0; width];
    for (district, values) in rows {
        for (total, value) in totals.iter_mut().zip(&values) {
            *total += value;
        }
        report.rows.push(ReportRow::data(
            district.unwrap_or_else(|| UNASSIGNED.to_string()),
            values,
        ));
    }
    report.rows.push(ReportRow::total(TOTAL_COLUMN, totals));

    log::debug!(
        "Detailed report: {} districts x {} columns",
        report.rows.len() - 1,
        width
    );

    Ok(report)
}

/// Per-day incident counts over `[start_date, end_date]`.
///
/// Occurrence timestamps are shifted by `day_offset_hours` before truncating
/// to a day. Every calendar day appears, zero-filled, in chronological
/// order, followed by a total row counting every incident matching
/// `filter`.
///
/// # Errors
///
/// * [`ReportError::InvalidDateRange`] if the end date precedes the start
/// * [`ReportError::DuckDb`] if a query fails
pub fn date_series_report(
    conn: &Connection,
    start_date: NaiveDate,
    end_date: NaiveDate,
    day_offset_hours: i32,
    filter: &Fragment,
) -> Result<ReportTable, ReportError> {
    let calendar = date_list_query(start_date, end_date)?;

    let mut query = Fragment::raw(
        "SELECT incident_date, CAST(SUM(total) AS BIGINT) FROM (\
         SELECT strftime(i.occurred_date + to_hours(CAST(",
    );
    query
        .push_param(day_offset_hours.to_string())
        .push_sql(
            " AS BIGINT)), '%Y-%m-%d') AS incident_date, 1 AS total \
             FROM incidents AS i WHERE ",
        )
        .push(filter)
        .push_sql(
            " UNION ALL SELECT strftime(selected_date, '%Y-%m-%d') AS incident_date, total \
             FROM (",
        )
        .push(&calendar)
        .push_sql(") AS date_ranges) AS result GROUP BY incident_date ORDER BY incident_date");

    let days = query.query_map(conn, |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    let total = count_filtered(conn, filter)?;

    let mut report = single_column_table("Incident Date");
    report.rows.extend(
        days.into_iter()
            .map(|(day, count)| ReportRow::data(day, vec![count])),
    );
    report.rows.push(ReportRow::total(TOTAL_ROW_LABEL, vec![total]));

    Ok(report)
}
