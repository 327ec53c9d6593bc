#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `DuckDB` adapter for the incident store.
//!
//! The report builder never writes to the store. This crate pins down the
//! table contract the generated report SQL is written against
//! ([`schema::create_schema`]), hands out read-only connections through a
//! small round-robin pool, and loads the taxonomy and incident slices the
//! in-memory summaries need.

pub mod pool;
pub mod schema;
pub mod taxonomy;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

use chrono::NaiveDateTime;

/// Errors that can occur while talking to the incident store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `DuckDB` query error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// I/O error (e.g. creating the data directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Timestamp format used when binding and reading `TIMESTAMP` columns as
/// text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a timestamp for binding as a `CAST(? AS TIMESTAMP)` parameter.
#[must_use]
pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses the `strftime(..., '%Y-%m-%d %H:%M:%S')` text of a `TIMESTAMP`
/// column.
///
/// # Errors
///
/// Returns [`StoreError::Conversion`] if the text is not in
/// [`TIMESTAMP_FORMAT`].
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, StoreError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| StoreError::Conversion {
        message: format!("Invalid timestamp '{value}': {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_text_round_trips() {
        let ts = parse_timestamp("2020-04-20 06:00:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2020-04-20 06:00:00");
    }

    #[test]
    fn rejects_malformed_timestamp() {
        assert!(matches!(
            parse_timestamp("20-04-2020"),
            Err(StoreError::Conversion { .. })
        ));
    }
}
