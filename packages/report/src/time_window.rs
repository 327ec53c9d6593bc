//! "Today" and "this week" boundaries in a configured time zone.
//!
//! The current instant comes from an injected [`Clock`], so windows are
//! deterministic under test. Windows are half-open: `start` is the first
//! instant inside, `end` the first instant after.

use chrono::{
    DateTime, Datelike as _, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    TimeZone as _, Utc,
};

use crate::ReportError;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A half-open `[start, end)` interval of zoned instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// First instant inside the window.
    pub start: DateTime<FixedOffset>,
    /// First instant after the window.
    pub end: DateTime<FixedOffset>,
}

impl TimeWindow {
    /// Local calendar date of the first instant.
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Local calendar date of the last instant (the day before `end` for
    /// day-aligned windows).
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        (self.end - TimeDelta::seconds(1)).date_naive()
    }

    /// `start` as a naive UTC timestamp, the form stored timestamps use.
    #[must_use]
    pub fn start_utc(&self) -> NaiveDateTime {
        self.start.naive_utc()
    }

    /// `end` as a naive UTC timestamp.
    #[must_use]
    pub fn end_utc(&self) -> NaiveDateTime {
        self.end.naive_utc()
    }
}

/// Time-window helpers bound to one zone and clock.
#[derive(Debug, Clone)]
pub struct TimeWindows<C: Clock> {
    zone: FixedOffset,
    clock: C,
}

impl<C: Clock> TimeWindows<C> {
    /// Creates helpers for `zone` reading the time from `clock`.
    #[must_use]
    pub const fn new(zone: FixedOffset, clock: C) -> Self {
        Self { zone, clock }
    }

    /// The configured zone.
    #[must_use]
    pub const fn zone(&self) -> FixedOffset {
        self.zone
    }

    /// The current instant in the configured zone.
    #[must_use]
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now().with_timezone(&self.zone)
    }

    /// Today's local calendar date.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Local midnight at the start of `date`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidDateTime`] if the instant is out of
    /// range in the configured zone.
    pub fn start_of_day(&self, date: NaiveDate) -> Result<DateTime<FixedOffset>, ReportError> {
        self.localize(date.and_time(NaiveTime::MIN))
    }

    /// `[00:00 today, 00:00 tomorrow)`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidDateTime`] if today's midnight is out of
    /// range.
    pub fn today_window(&self) -> Result<TimeWindow, ReportError> {
        let start = self.start_of_day(self.today())?;
        Ok(TimeWindow {
            start,
            end: start + TimeDelta::days(1),
        })
    }

    /// `[Sunday 00:00, next Sunday 00:00)` for the week containing today, so
    /// the last day is Saturday.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidDateTime`] if Sunday's midnight is out
    /// of range.
    pub fn week_window(&self) -> Result<TimeWindow, ReportError> {
        let today = self.today();
        let sunday = today - TimeDelta::days(i64::from(today.weekday().num_days_from_sunday()));
        let start = self.start_of_day(sunday)?;
        Ok(TimeWindow {
            start,
            end: start + TimeDelta::days(7),
        })
    }

    /// The 24 hours ending now.
    #[must_use]
    pub fn past_24_hours(&self) -> TimeWindow {
        let end = self.now();
        TimeWindow {
            start: end - TimeDelta::hours(24),
            end,
        }
    }

    /// `[00:00 of (today - days), 00:00 today)`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Config`] if `days` is negative or reaches
    /// outside the representable range.
    pub fn days_before_today(&self, days: i64) -> Result<TimeWindow, ReportError> {
        let end = self.start_of_day(self.today())?;
        let start = TimeDelta::try_days(days)
            .filter(|_| days >= 0)
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| ReportError::Config {
                message: format!("look-back of {days} days is out of range"),
            })?;
        Ok(TimeWindow { start, end })
    }

    /// Parses a `YYYY-MM-DD HH:MM:SS` string as local time in the configured
    /// zone. A `T` separator, fractional seconds, or a missing seconds
    /// field are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidDateTime`] if no format matches.
    pub fn parse_zoned(&self, text: &str) -> Result<DateTime<FixedOffset>, ReportError> {
        const FORMATS: [&str; 6] = [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%d %H:%M",
            "%Y-%m-%dT%H:%M",
        ];

        let trimmed = text.trim();
        FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
            .ok_or_else(|| ReportError::InvalidDateTime {
                value: text.to_string(),
                message: "expected YYYY-MM-DD HH:MM:SS".to_string(),
            })
            .and_then(|naive| self.localize(naive))
    }

    fn localize(&self, local: NaiveDateTime) -> Result<DateTime<FixedOffset>, ReportError> {
        self.zone
            .from_local_datetime(&local)
            .single()
            .ok_or_else(|| ReportError::InvalidDateTime {
                value: local.to_string(),
                message: format!("not representable in zone {}", self.zone),
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike as _, TimeZone as _, Weekday};

    use super::*;

    fn colombo() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
    }

    fn windows_at(utc: &str) -> TimeWindows<FixedClock> {
        let now = Utc.from_utc_datetime(&crate::test_support::ts(utc));
        TimeWindows::new(colombo(), FixedClock(now))
    }

    #[test]
    fn today_window_uses_local_midnight() {
        // 20:00 UTC is already the next day in +05:30.
        let windows = windows_at("2020-04-21 20:00:00");
        let today = windows.today_window().unwrap();

        assert_eq!(today.first_day(), NaiveDate::from_ymd_opt(2020, 4, 22).unwrap());
        assert_eq!(today.start.to_rfc3339(), "2020-04-22T00:00:00+05:30");
        assert_eq!(today.end.to_rfc3339(), "2020-04-23T00:00:00+05:30");
        assert_eq!(today.start_utc(), crate::test_support::ts("2020-04-21 18:30:00"));
    }

    #[test]
    fn week_window_from_wednesday_spans_sunday_to_saturday() {
        // 2020-04-22 is a Wednesday.
        let windows = windows_at("2020-04-22 06:00:00");
        let week = windows.week_window().unwrap();

        assert_eq!(week.first_day().weekday(), Weekday::Sun);
        assert_eq!(week.first_day(), NaiveDate::from_ymd_opt(2020, 4, 19).unwrap());
        assert_eq!(week.last_day().weekday(), Weekday::Sat);
        assert_eq!(week.last_day(), NaiveDate::from_ymd_opt(2020, 4, 25).unwrap());
        assert_eq!(week.end - week.start, TimeDelta::days(7));
    }

    #[test]
    fn week_window_on_sunday_starts_today() {
        let windows = windows_at("2020-04-19 06:00:00");
        assert_eq!(
            windows.week_window().unwrap().first_day(),
            NaiveDate::from_ymd_opt(2020, 4, 19).unwrap()
        );
    }

    #[test]
    fn parse_zoned_attaches_configured_zone() {
        let windows = windows_at("2020-04-22 06:00:00");

        let parsed = windows.parse_zoned("2020-04-20 10:15:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2020-04-20T10:15:00+05:30");

        let with_t = windows.parse_zoned("2020-04-20T10:15:00.250").unwrap();
        assert_eq!(with_t.naive_local().date(), parsed.naive_local().date());
    }

    #[test]
    fn parse_zoned_rejects_malformed_input() {
        let windows = windows_at("2020-04-22 06:00:00");
        assert!(matches!(
            windows.parse_zoned("20/04/2020"),
            Err(ReportError::InvalidDateTime { .. })
        ));
    }

    #[test]
    fn days_before_today_ends_at_local_midnight() {
        let windows = windows_at("2020-04-22 06:00:00");
        let window = windows.days_before_today(7).unwrap();
        assert_eq!(window.first_day(), NaiveDate::from_ymd_opt(2020, 4, 15).unwrap());
        assert_eq!(window.end.to_rfc3339(), "2020-04-22T00:00:00+05:30");
    }

    #[test]
    fn days_before_today_rejects_out_of_range_look_backs() {
        let windows = windows_at("2020-04-22 06:00:00");
        for days in [-1, 1_000_000_000, i64::MAX] {
            assert!(
                matches!(windows.days_before_today(days), Err(ReportError::Config { .. })),
                "{days}"
            );
        }
    }
}
