//! Report configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration.
//!
//! ```toml
//! [time]
//! zone = "+05:30"
//! incident_day_offset_hours = 8
//!
//! [categories]
//! violence = "Violence"
//! election_law = "Violation of election law"
//! other = "Other"
//!
//! [summary]
//! district_window_days = 100
//! ```

use std::path::Path;

use chrono::FixedOffset;
use serde::Deserialize;

use crate::ReportError;
use crate::time_window::{SystemClock, TimeWindows};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "INCIDENT_REPORT_CONFIG";

/// Longest accepted district-wise summary look-back.
pub const MAX_DISTRICT_WINDOW_DAYS: i64 = 3660;

/// Top-level report configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Time zone and day-boundary settings.
    pub time: TimeConfig,
    /// Top category labels the summary exports bucket by.
    pub categories: SummaryCategories,
    /// Summary export settings.
    pub summary: SummaryConfig,
}

/// Time zone and day-boundary settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// UTC offset of the reporting zone, e.g. `+05:30`.
    pub zone: String,
    /// Hours added to occurrence timestamps before truncating to a day in
    /// the incident-date report.
    pub incident_day_offset_hours: i32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            zone: "+05:30".to_string(),
            incident_day_offset_hours: 8,
        }
    }
}

impl TimeConfig {
    /// Parses [`Self::zone`].
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Config`] if the zone is not a `+HH:MM` offset.
    pub fn offset(&self) -> Result<FixedOffset, ReportError> {
        self.zone
            .parse::<FixedOffset>()
            .map_err(|e| ReportError::Config {
                message: format!("Invalid time zone offset '{}': {e}", self.zone),
            })
    }
}

/// Top category labels used by the daily and district-wise summaries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SummaryCategories {
    /// Counted as disputes / violence.
    pub violence: String,
    /// Counted as violations of election law.
    pub election_law: String,
    /// Counted as others.
    pub other: String,
}

impl Default for SummaryCategories {
    fn default() -> Self {
        Self {
            violence: "Violence".to_string(),
            election_law: "Violation of election law".to_string(),
            other: "Other".to_string(),
        }
    }
}

/// Summary export settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Look-back in days for the district-wise summary, between 1 and
    /// [`MAX_DISTRICT_WINDOW_DAYS`].
    pub district_window_days: i64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            district_window_days: 100,
        }
    }
}

impl ReportConfig {
    /// Parses and validates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Config`] if the TOML is malformed or a value is
    /// out of range.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ReportError> {
        let config: Self = toml::de::from_str(toml_str).map_err(|e| ReportError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot: the zone parses and the look-back fits.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Config`] naming the first invalid value.
    pub fn validate(&self) -> Result<(), ReportError> {
        self.time.offset()?;

        let days = self.summary.district_window_days;
        if !(1..=MAX_DISTRICT_WINDOW_DAYS).contains(&days) {
            return Err(ReportError::Config {
                message: format!(
                    "summary.district_window_days must be between 1 and \
                     {MAX_DISTRICT_WINDOW_DAYS}, got {days}"
                ),
            });
        }

        Ok(())
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Config`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let text = std::fs::read_to_string(path).map_err(|e| ReportError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads the file named by `INCIDENT_REPORT_CONFIG`, or the defaults
    /// when the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Config`] if the named file cannot be read or
    /// parsed.
    pub fn from_env() -> Result<Self, ReportError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => {
                log::info!("Loading report config from {path}");
                Self::from_path(Path::new(&path))
            }
            Err(_) => {
                log::debug!("{CONFIG_ENV_VAR} not set, using default report config");
                Ok(Self::default())
            }
        }
    }

    /// Time windows in the configured zone against the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Config`] if the zone is invalid.
    pub fn time_windows(&self) -> Result<TimeWindows<SystemClock>, ReportError> {
        Ok(TimeWindows::new(self.time.offset()?, SystemClock))
    }
}
