//! Template documents for the PDF-style exports.
//!
//! Each export pairs a renderer template path with totals computed over a
//! time window taken from [`TimeWindows`]. Window bounds are half-open and
//! compared against the UTC creation timestamp.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, FixedOffset, NaiveDate};
use duckdb::Connection;
use incident_report_models::{
    CLOSED_STATUS, Category, CategoryTotal, CategoryTotals, CategorySummaryExport,
    CategoryTotalsExport, ComplaintSummary, DailySummaryExport, DepartmentClosedExport,
    DepartmentTotal, DistrictSummary, DistrictSummaryExport, DistrictSummaryRow, IncidentSummary,
    IncidentType, InquirySlipExport, SeverityTotals,
};
use incident_report_store::format_timestamp;
use incident_report_store::taxonomy::{
    find_category, find_incident_reference, load_categories, load_districts,
    load_incidents_created_in,
};

use crate::ReportError;
use crate::config::{ReportConfig, SummaryCategories};
use crate::filter::Fragment;
use crate::hierarchy::{build_category_tree, count_by_category};
use crate::time_window::{Clock, TimeWindow, TimeWindows};

/// Daily complaint summary template.
pub const DAILY_SUMMARY_TEMPLATE: &str = "/incidents/complaints/daily_summary_report.js";
/// District-wise daily summary template.
pub const DISTRICT_SUMMARY_TEMPLATE: &str =
    "/incidents/complaints/daily_summary_report_districtwise.js";
/// Daily category tree template.
pub const DAILY_CATEGORY_TEMPLATE: &str =
    "/incidents/complaints/daily_summery_report_categorywise.js";
/// Category tree over a caller-supplied span; also used for per-category
/// totals.
pub const CATEGORY_TIMEFILTER_TEMPLATE: &str =
    "/incidents/complaints/daily_summery_report_categorywise_with_timefilter.js";
/// Organization-wise category tree template.
pub const ORGANIZATION_TIMEFILTER_TEMPLATE: &str =
    "/incidents/complaints/summery_report_organizationwise_with_timefilter.js";
/// Weekly closed incidents by category.
pub const WEEKLY_CLOSED_CATEGORY_TEMPLATE: &str =
    "/incidents/complaints/weeekly_closed_request_report_categorywise.js";
/// Weekly closed incidents by department.
pub const WEEKLY_CLOSED_ORGANIZATION_TEMPLATE: &str =
    "/incidents/complaints/weeekly_closed_request_report_organizationwise.js";
/// Inquiry slip template.
pub const INQUIRY_SLIP_TEMPLATE: &str = "incidents/inquiry/inquiry_slip.js";

const EXPORT_DATE_FORMAT: &str = "%Y/%m/%d";
const RANGE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Incident creators split by organization unit, as resolved by the
/// identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatorSegments {
    /// Users of headquarters divisions.
    pub headquarters: BTreeSet<String>,
    /// Users of district divisions.
    pub district: BTreeSet<String>,
}

impl CreatorSegments {
    fn is_headquarters(&self, incident: &IncidentSummary) -> bool {
        incident
            .created_by
            .as_ref()
            .is_some_and(|user| self.headquarters.contains(user))
    }

    fn is_district(&self, incident: &IncidentSummary) -> bool {
        incident
            .created_by
            .as_ref()
            .is_some_and(|user| self.district.contains(user))
    }
}

/// Folds per-category counts into the three summary top categories.
///
/// `amount` counts every incident, including those whose category is
/// under none of the three labels or missing from `taxonomy`.
#[must_use]
pub fn map_category(
    labels: &SummaryCategories,
    taxonomy: &[Category],
    counts: &HashMap<i64, u64>,
) -> CategoryTotals {
    let top_by_id: HashMap<i64, &str> = taxonomy
        .iter()
        .map(|c| (c.id, c.top_category.as_str()))
        .collect();

    let mut totals = CategoryTotals::default();
    for (id, count) in counts {
        match top_by_id.get(id) {
            Some(top) if *top == labels.violence => totals.disputes += count,
            Some(top) if *top == labels.election_law => totals.violation_of_laws += count,
            Some(top) if *top == labels.other => totals.others += count,
            _ => {}
        }
        totals.amount += count;
    }
    totals
}

/// Folds per-severity counts into minor / general / major.
///
/// An unset severity (`0`) only counts towards `total`.
#[must_use]
pub fn map_severity(counts: impl IntoIterator<Item = (i32, u64)>) -> SeverityTotals {
    let mut totals = SeverityTotals::default();
    for (severity, count) in counts {
        totals.add(severity, count);
    }
    totals
}

/// Builds the summary exports from one store connection.
#[derive(Debug)]
pub struct Summaries<'a, C: Clock> {
    conn: &'a Connection,
    config: &'a ReportConfig,
    windows: TimeWindows<C>,
}

impl<'a, C: Clock> Summaries<'a, C> {
    /// Creates a builder reading "now" from `windows`.
    pub const fn new(
        conn: &'a Connection,
        config: &'a ReportConfig,
        windows: TimeWindows<C>,
    ) -> Self {
        Self {
            conn,
            config,
            windows,
        }
    }

    fn export_date(&self) -> String {
        self.windows.today().format(EXPORT_DATE_FORMAT).to_string()
    }

    fn incidents_in(&self, window: &TimeWindow) -> Result<Vec<IncidentSummary>, ReportError> {
        Ok(load_incidents_created_in(
            self.conn,
            &window.start_utc(),
            &window.end_utc(),
        )?)
    }

    fn complaint_summary(
        &self,
        taxonomy: &[Category],
        creators: &CreatorSegments,
        incidents: &[IncidentSummary],
    ) -> ComplaintSummary {
        let labels = &self.config.categories;
        let hq = incidents.iter().filter(|i| creators.is_headquarters(i));
        let district = incidents.iter().filter(|i| creators.is_district(i));
        let all = incidents
            .iter()
            .filter(|i| creators.is_headquarters(i) || creators.is_district(i));

        ComplaintSummary {
            national: map_category(labels, taxonomy, &count_by_category(hq)),
            district: map_category(labels, taxonomy, &count_by_category(district)),
            totals: map_category(labels, taxonomy, &count_by_category(all)),
        }
    }

    /// Category totals of incidents created by the organization's users,
    /// split into headquarters and district creators, over today and over
    /// the past 24 hours.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if a store query fails.
    pub fn daily_summary(
        &self,
        creators: &CreatorSegments,
    ) -> Result<DailySummaryExport, ReportError> {
        let taxonomy = load_categories(self.conn)?;
        let today = self.incidents_in(&self.windows.today_window()?)?;
        let past_day = self.incidents_in(&self.windows.past_24_hours())?;

        log::info!(
            "Daily summary: {} incidents today, {} in the past 24 hours",
            today.len(),
            past_day.len()
        );

        Ok(DailySummaryExport {
            template: DAILY_SUMMARY_TEMPLATE.to_string(),
            date: self.export_date(),
            complaints_summary: self.complaint_summary(&taxonomy, creators, &today),
            complaints_past24hours: self.complaint_summary(&taxonomy, creators, &past_day),
        })
    }

    /// Per-district complaint category and severity totals over the
    /// configured look-back, ending at local midnight today.
    ///
    /// Every district gets a row, in store order. Incidents without a
    /// severity are left out of the severity columns and `total`.
    ///
    /// # Errors
    ///
    /// * [`ReportError::Config`] if the look-back is out of range
    /// * [`ReportError::Store`] if a store query fails
    pub fn district_summary(&self) -> Result<DistrictSummaryExport, ReportError> {
        let taxonomy = load_categories(self.conn)?;
        let districts = load_districts(self.conn)?;
        let window = self
            .windows
            .days_before_today(self.config.summary.district_window_days)?;
        let complaints: Vec<IncidentSummary> = self
            .incidents_in(&window)?
            .into_iter()
            .filter(|i| i.incident_type == Some(IncidentType::Complaint))
            .collect();

        let labels = &self.config.categories;
        let mut totals = DistrictSummaryRow::default();
        let rows: Vec<DistrictSummary> = districts
            .iter()
            .map(|district| {
                let in_district: Vec<&IncidentSummary> = complaints
                    .iter()
                    .filter(|i| i.district.as_deref() == Some(district.code.as_str()))
                    .collect();

                let categories = map_category(
                    labels,
                    &taxonomy,
                    &count_by_category(in_district.iter().copied()),
                );
                let severities =
                    map_severity(in_district.iter().filter_map(|i| i.severity).map(|s| (s, 1)));

                let counts = DistrictSummaryRow {
                    violence: categories.disputes,
                    breach_of_election_laws: categories.violation_of_laws,
                    other: categories.others,
                    minor: severities.minor,
                    general: severities.general,
                    major: severities.major,
                    total: severities.total,
                };
                totals += counts;
                DistrictSummary {
                    district: district.code.clone(),
                    district_name: district.name.clone(),
                    counts,
                }
            })
            .collect();

        log::info!(
            "District summary: {} complaints across {} districts",
            complaints.len(),
            rows.len()
        );

        Ok(DistrictSummaryExport {
            template: DISTRICT_SUMMARY_TEMPLATE.to_string(),
            date: self.export_date(),
            complaint_by_district: rows,
            complaint_totals_by_type: totals,
        })
    }

    fn category_export(
        &self,
        template: &str,
        incidents: &[IncidentSummary],
    ) -> Result<CategorySummaryExport, ReportError> {
        let taxonomy = load_categories(self.conn)?;
        Ok(CategorySummaryExport {
            template: template.to_string(),
            date: None,
            start_date: None,
            end_date: None,
            total: incidents.len() as u64,
            categories: build_category_tree(&taxonomy, incidents),
        })
    }

    /// Today's incident total and category tree.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if a store query fails.
    pub fn daily_category_summary(&self) -> Result<CategorySummaryExport, ReportError> {
        let incidents = self.incidents_in(&self.windows.today_window()?)?;
        Ok(CategorySummaryExport {
            date: Some(self.export_date()),
            ..self.category_export(DAILY_CATEGORY_TEMPLATE, &incidents)?
        })
    }

    /// Today's incident total and category tree, for the organization-wise
    /// template.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if a store query fails.
    pub fn organization_summary(&self) -> Result<CategorySummaryExport, ReportError> {
        let incidents = self.incidents_in(&self.windows.today_window()?)?;
        Ok(CategorySummaryExport {
            date: Some(self.export_date()),
            ..self.category_export(ORGANIZATION_TIMEFILTER_TEMPLATE, &incidents)?
        })
    }

    fn parse_span(
        &self,
        start: &str,
        end: &str,
    ) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>), ReportError> {
        let from = self.windows.parse_zoned(start)?;
        let until = self.windows.parse_zoned(end)?;
        if until < from {
            return Err(ReportError::InvalidDateRange {
                start: from.date_naive(),
                end: until.date_naive(),
            });
        }
        Ok((from, until))
    }

    /// Incident total and category tree for incidents created in
    /// `[start, end)`, both parsed as local time.
    ///
    /// # Errors
    ///
    /// * [`ReportError::InvalidDateTime`] if either bound is malformed
    /// * [`ReportError::InvalidDateRange`] if `end` precedes `start`
    /// * [`ReportError::Store`] if a store query fails
    pub fn category_summary_between(
        &self,
        start: &str,
        end: &str,
    ) -> Result<CategorySummaryExport, ReportError> {
        let (from, until) = self.parse_span(start, end)?;
        let incidents = self.incidents_in(&TimeWindow {
            start: from,
            end: until,
        })?;
        Ok(CategorySummaryExport {
            start_date: Some(start.to_string()),
            end_date: Some(end.to_string()),
            ..self.category_export(CATEGORY_TIMEFILTER_TEMPLATE, &incidents)?
        })
    }

    /// This week's (Sunday to Saturday) closed incidents as a category tree.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if a store query fails.
    pub fn weekly_closed_category_summary(&self) -> Result<CategorySummaryExport, ReportError> {
        let week = self.windows.week_window()?;
        let closed: Vec<IncidentSummary> = self
            .incidents_in(&week)?
            .into_iter()
            .filter(|i| i.current_status.as_deref() == Some(CLOSED_STATUS))
            .collect();

        Ok(CategorySummaryExport {
            start_date: Some(format_day(week.first_day())),
            end_date: Some(format_day(week.last_day())),
            ..self.category_export(WEEKLY_CLOSED_CATEGORY_TEMPLATE, &closed)?
        })
    }

    /// Close actions per department over the seven days before today.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::DuckDb`] if the query fails.
    pub fn weekly_closed_by_department(&self) -> Result<DepartmentClosedExport, ReportError> {
        let window = self.windows.days_before_today(7)?;

        let mut query = Fragment::raw(
            "SELECT department, COUNT(*) FROM close_workflows \
             WHERE created_date >= CAST(",
        );
        query
            .push_param(format_timestamp(&window.start_utc()))
            .push_sql(" AS TIMESTAMP) AND created_date < CAST(")
            .push_param(format_timestamp(&window.end_utc()))
            .push_sql(" AS TIMESTAMP) GROUP BY department ORDER BY department NULLS LAST");

        let total = query.query_map(self.conn, |row| {
            Ok(DepartmentTotal {
                departments: row.get(0)?,
                total: row.get(1)?,
            })
        })?;

        Ok(DepartmentClosedExport {
            template: WEEKLY_CLOSED_ORGANIZATION_TEMPLATE.to_string(),
            date: self.export_date(),
            total,
        })
    }

    /// Incidents per category id created in `[start, end)`, both parsed as
    /// local time.
    ///
    /// # Errors
    ///
    /// * [`ReportError::InvalidDateTime`] if either bound is malformed
    /// * [`ReportError::InvalidDateRange`] if `end` precedes `start`
    /// * [`ReportError::DuckDb`] if the query fails
    pub fn category_totals_between(
        &self,
        start: &str,
        end: &str,
    ) -> Result<CategoryTotalsExport, ReportError> {
        let (from, until) = self.parse_span(start, end)?;

        let mut query = Fragment::raw(
            "SELECT category, COUNT(*) FROM incidents \
             WHERE created_date >= CAST(",
        );
        query
            .push_param(format_timestamp(&from.naive_utc()))
            .push_sql(" AS TIMESTAMP) AND created_date < CAST(")
            .push_param(format_timestamp(&until.naive_utc()))
            .push_sql(" AS TIMESTAMP) GROUP BY category ORDER BY category NULLS LAST");

        let total_per_category = query.query_map(self.conn, |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total: row.get(1)?,
            })
        })?;

        Ok(CategoryTotalsExport {
            template: CATEGORY_TIMEFILTER_TEMPLATE.to_string(),
            date: self.export_date(),
            total_per_category,
        })
    }
}

impl<C: Clock> Summaries<'_, C> {
    /// Inquiry slip for `incident_id`, addressed to `institution_name`.
    ///
    /// The institution directory lives outside the store, so the caller
    /// resolves the name.
    ///
    /// # Errors
    ///
    /// * [`ReportError::IncidentNotFound`] if no incident has that id
    /// * [`ReportError::UnknownCategory`] if its category is unset or not in
    ///   the taxonomy
    /// * [`ReportError::Store`] if a store query fails
    pub fn slip_data(
        &self,
        incident_id: &str,
        institution_name: &str,
    ) -> Result<InquirySlipExport, ReportError> {
        let incident = find_incident_reference(self.conn, incident_id)?.ok_or_else(|| {
            ReportError::IncidentNotFound {
                id: incident_id.to_string(),
            }
        })?;

        let unknown = || ReportError::UnknownCategory {
            incident: incident.id.clone(),
            category: incident.category,
        };
        let category_id = incident.category.ok_or_else(unknown)?;
        let category = find_category(self.conn, category_id)?.ok_or_else(unknown)?;

        Ok(InquirySlipExport {
            template: INQUIRY_SLIP_TEMPLATE.to_string(),
            reference_number: incident.ref_id.clone(),
            date: self.export_date(),
            category_code: category.id,
            category_name_en: category.sub_category,
            category_name_sn: category.sn_sub_category,
            category_name_tm: category.tm_sub_category,
            institution_name: institution_name.to_string(),
        })
    }
}

fn format_day(day: NaiveDate) -> String {
    day.format(RANGE_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use incident_report_models::District;
    use incident_report_store::fixtures::{self, IncidentFixture};

    use super::*;
    use crate::test_support::{complaint, insert, store, ts};
    use crate::time_window::FixedClock;

    /// Wednesday 2020-04-22 12:00 in +05:30.
    fn windows() -> TimeWindows<FixedClock> {
        let zone = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        let now = Utc.from_utc_datetime(&ts("2020-04-22 06:30:00"));
        TimeWindows::new(zone, FixedClock(now))
    }

    fn seed_taxonomy(conn: &Connection) -> Vec<Category> {
        let taxonomy = vec![
            fixtures::category(1, "Violence", "Assault"),
            fixtures::category(2, "Violation of election law", "Posters"),
            fixtures::category(3, "Other", "Misc"),
            fixtures::category(4, "Unlisted", "Unlisted"),
        ];
        for category in &taxonomy {
            fixtures::insert_category(conn, category).unwrap();
        }
        taxonomy
    }

    fn created(id: &str, at: &str, category: i64, creator: &str) -> IncidentFixture {
        IncidentFixture {
            category: Some(category),
            created_by: Some(creator.to_string()),
            ..complaint(id, at)
        }
    }

    #[test]
    fn map_category_counts_amount_for_every_category() {
        let taxonomy = vec![
            fixtures::category(1, "Violence", "Assault"),
            fixtures::category(2, "Violence", "Arson"),
            fixtures::category(3, "Unlisted", "X"),
        ];
        let counts = HashMap::from([(1, 2), (2, 1), (3, 4), (99, 1)]);

        let totals = map_category(&SummaryCategories::default(), &taxonomy, &counts);

        assert_eq!(totals.disputes, 3);
        assert_eq!(totals.violation_of_laws, 0);
        assert_eq!(totals.others, 0);
        assert_eq!(totals.amount, 8);
    }

    #[test]
    fn map_severity_leaves_unset_out_of_buckets() {
        let totals = map_severity([0, 1, 3, 4, 7, 8, 10].map(|s| (s, 1)));

        assert_eq!(totals.minor, 2);
        assert_eq!(totals.general, 2);
        assert_eq!(totals.major, 2);
        assert_eq!(totals.total, 7);
    }

    #[test]
    fn daily_summary_splits_by_creator_segment() {
        let conn = store();
        seed_taxonomy(&conn);
        // Today in +05:30 starts at 2020-04-21 18:30 UTC.
        insert(&conn, &created("a", "2020-04-21 19:00:00", 1, "hq1"));
        insert(&conn, &created("b", "2020-04-22 01:00:00", 2, "dist1"));
        insert(&conn, &created("c", "2020-04-22 02:00:00", 3, "outsider"));
        insert(&conn, &created("d", "2020-04-21 10:00:00", 1, "dist1"));

        let creators = CreatorSegments {
            headquarters: BTreeSet::from(["hq1".to_string()]),
            district: BTreeSet::from(["dist1".to_string()]),
        };
        let config = ReportConfig::default();
        let export = Summaries::new(&conn, &config, windows())
            .daily_summary(&creators)
            .unwrap();

        assert_eq!(export.template, DAILY_SUMMARY_TEMPLATE);
        assert_eq!(export.date, "2020/04/22");
        let today = export.complaints_summary;
        assert_eq!(today.national.disputes, 1);
        assert_eq!(today.district.violation_of_laws, 1);
        assert_eq!(today.totals.amount, 2);
        // d was created 20.5 hours before now.
        let past = export.complaints_past24hours;
        assert_eq!(past.district.disputes, 1);
        assert_eq!(past.totals.amount, 3);
    }

    #[test]
    fn district_summary_has_a_row_per_district_and_totals() {
        let conn = store();
        seed_taxonomy(&conn);
        for code in ["CMB", "GAM", "KAN"] {
            fixtures::insert_district(
                &conn,
                &District {
                    code: code.to_string(),
                    name: code.to_string(),
                },
            )
            .unwrap();
        }
        for (id, district, category, severity) in [
            ("a", "CMB", 1, Some(9)),
            ("b", "CMB", 2, Some(0)),
            ("c", "GAM", 3, Some(5)),
            ("d", "GAM", 1, None),
        ] {
            insert(
                &conn,
                &IncidentFixture {
                    district: Some(district.to_string()),
                    severity,
                    ..created(id, "2020-04-10 10:00:00", category, "u")
                },
            );
        }
        insert(
            &conn,
            &IncidentFixture {
                district: Some("CMB".to_string()),
                incident_type: Some("INQUIRY".to_string()),
                ..created("q", "2020-04-10 10:00:00", 1, "u")
            },
        );

        let config = ReportConfig::default();
        let export = Summaries::new(&conn, &config, windows())
            .district_summary()
            .unwrap();

        assert_eq!(export.complaint_by_district.len(), 3);
        assert_eq!(export.complaint_by_district[0].district, "CMB");
        let cmb = export.complaint_by_district[0].counts;
        assert_eq!(cmb.violence, 1);
        assert_eq!(cmb.breach_of_election_laws, 1);
        assert_eq!(cmb.major, 1);
        assert_eq!(cmb.minor, 0);
        assert_eq!(cmb.total, 2);
        assert_eq!(export.complaint_by_district[2].district, "KAN");
        assert_eq!(export.complaint_by_district[2].counts, DistrictSummaryRow::default());

        let totals = export.complaint_totals_by_type;
        assert_eq!(totals.violence, 2);
        assert_eq!(totals.other, 1);
        assert_eq!(totals.general, 1);
        assert_eq!(totals.total, 3);
    }

    #[test]
    fn district_summary_rejects_out_of_range_look_back() {
        let conn = store();
        let mut config = ReportConfig::default();
        config.summary.district_window_days = 1_000_000_000;

        assert!(matches!(
            Summaries::new(&conn, &config, windows()).district_summary(),
            Err(ReportError::Config { .. })
        ));
    }

    #[test]
    fn slip_data_reads_reference_and_localized_category() {
        let conn = store();
        fixtures::insert_category(
            &conn,
            &Category {
                sn_sub_category: "sn-posters".to_string(),
                tm_sub_category: "tm-posters".to_string(),
                ..fixtures::category(2, "Violation of election law", "Posters")
            },
        )
        .unwrap();
        insert(
            &conn,
            &IncidentFixture {
                ref_id: Some("INQ/2020/17".to_string()),
                category: Some(2),
                incident_type: Some("INQUIRY".to_string()),
                ..complaint("a", "2020-04-20 10:00:00")
            },
        );
        insert(&conn, &complaint("b", "2020-04-20 10:00:00"));
        insert(
            &conn,
            &IncidentFixture {
                category: Some(99),
                ..complaint("c", "2020-04-20 10:00:00")
            },
        );

        let config = ReportConfig::default();
        let summaries = Summaries::new(&conn, &config, windows());
        let slip = summaries.slip_data("a", "Elections Commission").unwrap();

        assert_eq!(slip.template, INQUIRY_SLIP_TEMPLATE);
        assert_eq!(slip.reference_number.as_deref(), Some("INQ/2020/17"));
        assert_eq!(slip.date, "2020/04/22");
        assert_eq!(slip.category_code, 2);
        assert_eq!(slip.category_name_en, "Posters");
        assert_eq!(slip.category_name_sn, "sn-posters");
        assert_eq!(slip.category_name_tm, "tm-posters");
        let json = serde_json::to_value(&slip).unwrap();
        assert_eq!(json["referenceNumber"], "INQ/2020/17");
        assert_eq!(json["institutionName"], "Elections Commission");

        assert!(matches!(
            summaries.slip_data("missing", "x"),
            Err(ReportError::IncidentNotFound { .. })
        ));
        assert!(matches!(
            summaries.slip_data("b", "x"),
            Err(ReportError::UnknownCategory { category: None, .. })
        ));
        assert!(matches!(
            summaries.slip_data("c", "x"),
            Err(ReportError::UnknownCategory {
                category: Some(99),
                ..
            })
        ));
    }

    #[test]
    fn weekly_closed_summary_covers_sunday_to_saturday() {
        let conn = store();
        seed_taxonomy(&conn);
        for (id, at, status) in [
            // Sunday 2020-04-19 00:30 local.
            ("a", "2020-04-18 19:00:00", "CLOSED"),
            ("b", "2020-04-20 10:00:00", "OPEN"),
            // Saturday 2020-04-18 local, the previous week.
            ("c", "2020-04-18 10:00:00", "CLOSED"),
        ] {
            insert(
                &conn,
                &IncidentFixture {
                    current_status: Some(status.to_string()),
                    ..created(id, at, 1, "u")
                },
            );
        }

        let config = ReportConfig::default();
        let export = Summaries::new(&conn, &config, windows())
            .weekly_closed_category_summary()
            .unwrap();

        assert_eq!(export.start_date.as_deref(), Some("2020-04-19"));
        assert_eq!(export.end_date.as_deref(), Some("2020-04-25"));
        assert_eq!(export.total, 1);
        assert_eq!(export.categories[0].sub_categories[0].count, 1);
        assert_eq!(export.categories.len(), 4);
    }

    #[test]
    fn category_summary_between_parses_local_bounds() {
        let conn = store();
        seed_taxonomy(&conn);
        insert(&conn, &created("a", "2020-04-20 00:29:00", 1, "u"));
        insert(&conn, &created("b", "2020-04-20 00:31:00", 2, "u"));

        let config = ReportConfig::default();
        let summaries = Summaries::new(&conn, &config, windows());
        // 06:00 local is 00:30 UTC.
        let export = summaries
            .category_summary_between("2020-04-20 06:00:00", "2020-04-21 06:00:00")
            .unwrap();

        assert_eq!(export.total, 1);
        assert_eq!(export.start_date.as_deref(), Some("2020-04-20 06:00:00"));
        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["StartDate"], "2020-04-20 06:00:00");
        assert!(json.get("date").is_none());

        assert!(matches!(
            summaries.category_summary_between("yesterday", "2020-04-21 06:00:00"),
            Err(ReportError::InvalidDateTime { .. })
        ));
        assert!(matches!(
            summaries.category_summary_between("2020-04-21 06:00:00", "2020-04-20 06:00:00"),
            Err(ReportError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn weekly_closed_by_department_groups_last_seven_days() {
        let conn = store();
        for (department, at) in [
            (Some("Police"), "2020-04-20 10:00:00"),
            (Some("Police"), "2020-04-16 10:00:00"),
            (Some("Elections"), "2020-04-21 10:00:00"),
            (None, "2020-04-19 10:00:00"),
            // Today (local) is excluded.
            (Some("Police"), "2020-04-22 01:00:00"),
            (Some("Police"), "2020-04-10 10:00:00"),
        ] {
            fixtures::insert_close_workflow(&conn, "x", department, &ts(at)).unwrap();
        }

        let config = ReportConfig::default();
        let export = Summaries::new(&conn, &config, windows())
            .weekly_closed_by_department()
            .unwrap();

        assert_eq!(export.template, WEEKLY_CLOSED_ORGANIZATION_TEMPLATE);
        assert_eq!(
            export.total,
            vec![
                DepartmentTotal {
                    departments: Some("Elections".to_string()),
                    total: 1
                },
                DepartmentTotal {
                    departments: Some("Police".to_string()),
                    total: 2
                },
                DepartmentTotal {
                    departments: None,
                    total: 1
                },
            ]
        );
    }

    #[test]
    fn category_totals_between_lists_present_categories() {
        let conn = store();
        seed_taxonomy(&conn);
        insert(&conn, &created("a", "2020-04-20 10:00:00", 1, "u"));
        insert(&conn, &created("b", "2020-04-20 11:00:00", 1, "u"));
        insert(
            &conn,
            &IncidentFixture {
                category: None,
                ..complaint("c", "2020-04-20 12:00:00")
            },
        );

        let config = ReportConfig::default();
        let export = Summaries::new(&conn, &config, windows())
            .category_totals_between("2020-04-20 00:00:00", "2020-04-21 00:00:00")
            .unwrap();

        assert_eq!(
            export.total_per_category,
            vec![
                CategoryTotal {
                    category: Some(1),
                    total: 2
                },
                CategoryTotal {
                    category: None,
                    total: 1
                },
            ]
        );
    }

    #[test]
    fn daily_category_summary_counts_today() {
        let conn = store();
        seed_taxonomy(&conn);
        insert(&conn, &created("a", "2020-04-21 19:00:00", 3, "u"));
        insert(&conn, &created("b", "2020-04-21 10:00:00", 3, "u"));

        let config = ReportConfig::default();
        let summaries = Summaries::new(&conn, &config, windows());
        let export = summaries.daily_category_summary().unwrap();

        assert_eq!(export.template, DAILY_CATEGORY_TEMPLATE);
        assert_eq!(export.date.as_deref(), Some("2020/04/22"));
        assert_eq!(export.total, 1);
        assert_eq!(export.categories[2].sub_categories[0].count, 1);

        let organization = summaries.organization_summary().unwrap();
        assert_eq!(organization.template, ORGANIZATION_TIMEFILTER_TEMPLATE);
        assert_eq!(organization.categories, export.categories);
    }
}
