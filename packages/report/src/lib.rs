#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report query builder and aggregators for incident summary reports.
//!
//! A report call takes a date range, an incident type selection and a
//! detail flag, compiles them into a bound-parameter predicate
//! ([`filter`]), and splices that predicate into one of a small catalogue of
//! report shapes ([`aggregate`]): a general summary, a per-district pivot, a
//! date series, or the police division breakdown. Results are typed
//! [`incident_report_models::ReportTable`]s which [`html`] serializes for
//! the document renderer.
//!
//! [`hierarchy`] and [`summary`] build the nested category trees and
//! template documents used by the PDF-style exports, with "today" and
//! "this week" taken from [`time_window`] against an injected clock.

pub mod aggregate;
pub mod config;
pub mod filter;
pub mod hierarchy;
pub mod html;
pub mod reports;
pub mod summary;
pub mod taxonomy;
pub mod time_window;

use chrono::NaiveDate;
use incident_report_store::StoreError;

/// Errors that can occur while building a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Query execution error, propagated unmodified.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Incident store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The end date precedes the start date.
    #[error("Invalid date range: end date {end} is before start date {start}")]
    InvalidDateRange {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// A date/time string could not be parsed.
    #[error("Invalid datetime '{value}': {message}")]
    InvalidDateTime {
        /// The offending input.
        value: String,
        /// Parser message.
        message: String,
    },

    /// No incident has the requested id.
    #[error("Incident '{id}' not found")]
    IncidentNotFound {
        /// Requested incident id.
        id: String,
    },

    /// The incident's category is unset or missing from the taxonomy.
    #[error("Incident '{incident}' has no known category (category {category:?})")]
    UnknownCategory {
        /// Incident id.
        incident: String,
        /// The incident's category reference.
        category: Option<i64>,
    },

    /// Neither complaints nor inquiries were selected.
    #[error("Incident type filter selects neither complaints nor inquiries")]
    EmptyTypeFilter,

    /// Configuration could not be read or parsed.
    #[error("Config error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}
