#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Builds the enriched Tartu housing dataset.
//!
//! Loads the listings, accessibility survey, noise survey, and optional
//! coordinates tables, joins them on normalized addresses (see
//! [`tartu_housing_address`]), computes the distance to the reference
//! point, and writes a single combined table.
//!
//! The join never drops a listing: unmatched listings receive
//! [`AccessibilityMetrics::ZERO`](tartu_housing_dataset_models::AccessibilityMetrics::ZERO)
//! and the city-wide mean noise class.

pub mod accessibility;
pub mod assemble;
pub mod distance;
pub mod noise;
pub mod parsing;
pub mod table;

pub use assemble::{AssemblyReport, JoinContext, assemble};

/// Errors from reading or writing dataset tables.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// A file could not be opened, created, or flushed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// CSV header parsing or record writing failed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// File involved.
        path: String,
        /// Underlying error.
        source: csv::Error,
    },

    /// A required column is absent from a table's header row.
    #[error("{path} is missing required column '{column}'")]
    MissingColumn {
        /// File involved.
        path: String,
        /// The absent column.
        column: String,
    },

    /// A row of a position-aligned table could not be read. Skipping it
    /// would pair every later row with the wrong listing.
    #[error("{path}: malformed row {row}: {source}")]
    MalformedRow {
        /// File involved.
        path: String,
        /// 1-based data row number.
        row: u64,
        /// Underlying error.
        source: csv::Error,
    },
}
