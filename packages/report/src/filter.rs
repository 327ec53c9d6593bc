//! Filter compiler.
//!
//! Compiles report inputs into [`Fragment`]s: SQL text with positional `?`
//! placeholders plus the values bound to them, in textual order. Fragments
//! are spliced verbatim into the enclosing aggregate queries, so the same
//! incident filter is applied identically to every report shape.
//!
//! Predicates refer to the incidents table through the alias `i`.

use chrono::NaiveDate;
use duckdb::Connection;
use incident_report_models::IncidentType;

use crate::ReportError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQL text with its bound parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    sql: String,
    params: Vec<String>,
}

impl Fragment {
    /// A fragment with no placeholders.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// A fragment with `params` bound to its placeholders in order.
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// The SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound values, in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Appends literal SQL text.
    pub fn push_sql(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Appends a placeholder bound to `value`.
    pub fn push_param(&mut self, value: impl Into<String>) -> &mut Self {
        self.sql.push('?');
        self.params.push(value.into());
        self
    }

    /// Appends another fragment, keeping its parameters in order.
    pub fn push(&mut self, other: &Self) -> &mut Self {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params.iter().cloned());
        self
    }

    /// `(self) AND (other)`.
    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        let mut combined = Self::raw("(");
        combined.push(self).push_sql(") AND (").push(other).push_sql(")");
        combined
    }

    /// Runs the fragment as a query, mapping each row with `f`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::DuckDb`] if the query fails.
    pub fn query_map<T, F>(&self, conn: &Connection, f: F) -> Result<Vec<T>, ReportError>
    where
        F: FnMut(&duckdb::Row<'_>) -> duckdb::Result<T>,
    {
        log::debug!(
            "Running report query ({} params):\n{}",
            self.params.len(),
            self.sql
        );
        let mut stmt = conn.prepare(&self.sql)?;
        let rows = stmt.query_map(duckdb::params_from_iter(self.params.iter()), f)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Runs the fragment as a single-row, single-column count query.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::DuckDb`] if the query fails.
    pub fn query_count(&self, conn: &Connection) -> Result<i64, ReportError> {
        log::debug!(
            "Running report count ({} params):\n{}",
            self.params.len(),
            self.sql
        );
        let mut stmt = conn.prepare(&self.sql)?;
        Ok(stmt.query_row(duckdb::params_from_iter(self.params.iter()), |row| {
            row.get::<_, Option<i64>>(0)
        })?
        .unwrap_or(0))
    }
}

/// Which incident types a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeFilter {
    /// Include `COMPLAINT` incidents.
    pub complaints: bool,
    /// Include `INQUIRY` incidents.
    pub inquiries: bool,
}

impl TypeFilter {
    /// Both types.
    pub const ALL: Self = Self {
        complaints: true,
        inquiries: true,
    };

    /// Complaints only.
    pub const COMPLAINTS: Self = Self {
        complaints: true,
        inquiries: false,
    };

    /// Inquiries only.
    pub const INQUIRIES: Self = Self {
        complaints: false,
        inquiries: true,
    };

    /// Whether neither type is selected.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.complaints && !self.inquiries
    }

    /// Compiles the selection, see [`incident_type_query`].
    #[must_use]
    pub fn predicate(self) -> Fragment {
        incident_type_query(self.complaints, self.inquiries)
    }
}

/// Predicate selecting incidents of the requested types.
///
/// Both flags false matches nothing; both true matches every incident.
#[must_use]
pub fn incident_type_query(include_complaints: bool, include_inquiries: bool) -> Fragment {
    let only = |incident_type: IncidentType| {
        let mut fragment = Fragment::raw("i.incident_type = ");
        fragment.push_param(incident_type.as_ref());
        fragment
    };

    match (include_complaints, include_inquiries) {
        (true, true) => Fragment::raw("TRUE"),
        (true, false) => only(IncidentType::Complaint),
        (false, true) => only(IncidentType::Inquiry),
        (false, false) => Fragment::raw("FALSE"),
    }
}

/// The incident list filter: `type_predicate` and an inclusive bound on the
/// occurrence date.
///
/// # Errors
///
/// Returns [`ReportError::InvalidDateRange`] if `end_date < start_date`.
pub fn incident_list_query(
    start_date: NaiveDate,
    end_date: NaiveDate,
    type_predicate: &Fragment,
) -> Result<Fragment, ReportError> {
    check_range(start_date, end_date)?;

    let mut range = Fragment::raw("CAST(i.occurred_date AS DATE) BETWEEN CAST(");
    range
        .push_param(start_date.format(DATE_FORMAT).to_string())
        .push_sql(" AS DATE) AND CAST(")
        .push_param(end_date.format(DATE_FORMAT).to_string())
        .push_sql(" AS DATE)");

    Ok(type_predicate.and(&range))
}

/// A calendar subquery with one `(selected_date DATE, total INTEGER)` row
/// per day in `[start_date, end_date]`, each with a zero total.
///
/// # Errors
///
/// Returns [`ReportError::InvalidDateRange`] if `end_date < start_date`.
pub fn date_list_query(
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Fragment, ReportError> {
    check_range(start_date, end_date)?;

    let mut calendar = Fragment::raw(
        "SELECT CAST(calendar_day AS DATE) AS selected_date, 0 AS total FROM (\
         SELECT unnest(generate_series(CAST(",
    );
    calendar
        .push_param(start_date.format(DATE_FORMAT).to_string())
        .push_sql(" AS TIMESTAMP), CAST(")
        .push_param(end_date.format(DATE_FORMAT).to_string())
        .push_sql(" AS TIMESTAMP), INTERVAL 1 DAY)) AS calendar_day) AS calendar");

    Ok(calendar)
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), ReportError> {
    if end < start {
        return Err(ReportError::InvalidDateRange { start, end });
    }
    Ok(())
}

/// Inputs shared by every filtered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRequest {
    /// First occurrence date included.
    pub start_date: NaiveDate,
    /// Last occurrence date included.
    pub end_date: NaiveDate,
    /// Incident types included.
    pub types: TypeFilter,
    /// Produce the per-district pivot instead of the general summary.
    pub detailed: bool,
}

impl ReportRequest {
    /// A general (non-detailed) request.
    #[must_use]
    pub const fn new(start_date: NaiveDate, end_date: NaiveDate, types: TypeFilter) -> Self {
        Self {
            start_date,
            end_date,
            types,
            detailed: false,
        }
    }

    /// The same request with the detail flag set.
    #[must_use]
    pub const fn detailed(mut self) -> Self {
        self.detailed = true;
        self
    }

    /// Validates the request and compiles its incident list filter.
    ///
    /// # Errors
    ///
    /// * [`ReportError::EmptyTypeFilter`] if no incident type is selected
    /// * [`ReportError::InvalidDateRange`] if the end date precedes the start
    pub fn filter(&self) -> Result<Fragment, ReportError> {
        if self.types.is_empty() {
            return Err(ReportError::EmptyTypeFilter);
        }
        incident_list_query(self.start_date, self.end_date, &self.types.predicate())
    }
}

#[cfg(test)]
mod tests {
    use incident_report_store::fixtures::IncidentFixture;

    use super::*;
    use crate::test_support::{complaint, insert, store, ts};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn count_matching(conn: &Connection, filter: &Fragment) -> i64 {
        let mut query = Fragment::raw("SELECT COUNT(*) FROM incidents AS i WHERE ");
        query.push(filter);
        query.query_count(conn).unwrap()
    }

    #[test]
    fn fragments_keep_params_in_textual_order() {
        let filter = incident_list_query(
            date("2020-04-01"),
            date("2020-04-30"),
            &incident_type_query(false, true),
        )
        .unwrap();

        assert_eq!(filter.sql().matches('?').count(), filter.params().len());
        assert_eq!(filter.params(), ["INQUIRY", "2020-04-01", "2020-04-30"]);
    }

    #[test]
    fn type_query_matches_requested_types() {
        let conn = store();
        insert(&conn, &complaint("c1", "2020-04-20 10:00:00"));
        insert(
            &conn,
            &IncidentFixture {
                incident_type: Some("INQUIRY".to_string()),
                ..complaint("q1", "2020-04-20 10:00:00")
            },
        );
        insert(
            &conn,
            &IncidentFixture {
                incident_type: None,
                ..complaint("n1", "2020-04-20 10:00:00")
            },
        );

        assert_eq!(count_matching(&conn, &incident_type_query(true, true)), 3);
        assert_eq!(count_matching(&conn, &incident_type_query(true, false)), 1);
        assert_eq!(count_matching(&conn, &incident_type_query(false, true)), 1);
        assert_eq!(count_matching(&conn, &incident_type_query(false, false)), 0);
    }

    #[test]
    fn list_query_bounds_occurrence_date_inclusively() {
        let conn = store();
        insert(&conn, &complaint("before", "2020-04-09 23:59:59"));
        insert(&conn, &complaint("first", "2020-04-10 00:00:00"));
        insert(&conn, &complaint("last", "2020-04-12 23:59:59"));
        insert(&conn, &complaint("after", "2020-04-13 00:00:00"));
        insert(
            &conn,
            &IncidentFixture {
                occurred_date: None,
                created_date: ts("2020-04-11 00:00:00"),
                ..complaint("undated", "2020-04-11 00:00:00")
            },
        );

        let filter =
            incident_list_query(date("2020-04-10"), date("2020-04-12"), &Fragment::raw("TRUE"))
                .unwrap();
        assert_eq!(count_matching(&conn, &filter), 2);
    }

    #[test]
    fn date_list_has_one_row_per_day() {
        let conn = store();
        for (start, end, days) in [
            ("2020-04-10", "2020-04-10", 1),
            ("2020-04-10", "2020-04-16", 7),
            ("2020-02-27", "2020-03-01", 4),
            ("2019-12-30", "2020-01-02", 4),
        ] {
            let mut query = Fragment::raw(
                "SELECT COUNT(DISTINCT selected_date), COUNT(*), CAST(SUM(total) AS BIGINT), \
                 CAST(MAX(selected_date) - MIN(selected_date) AS BIGINT) FROM (",
            );
            query
                .push(&date_list_query(date(start), date(end)).unwrap())
                .push_sql(") AS dates");

            let (distinct, rows, total, span): (i64, i64, i64, i64) = conn
                .query_row(
                    query.sql(),
                    duckdb::params_from_iter(query.params().iter()),
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .unwrap();

            assert_eq!(rows, days, "{start}..{end}");
            assert_eq!(distinct, days);
            assert_eq!(total, 0);
            assert_eq!(span, days - 1);
        }
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert!(matches!(
            date_list_query(date("2020-04-12"), date("2020-04-10")),
            Err(ReportError::InvalidDateRange { .. })
        ));
        assert!(matches!(
            incident_list_query(date("2020-04-12"), date("2020-04-10"), &Fragment::raw("TRUE")),
            Err(ReportError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn request_without_types_is_rejected() {
        let request = ReportRequest::new(
            date("2020-04-01"),
            date("2020-04-30"),
            TypeFilter {
                complaints: false,
                inquiries: false,
            },
        );
        assert!(matches!(request.filter(), Err(ReportError::EmptyTypeFilter)));
    }
}
