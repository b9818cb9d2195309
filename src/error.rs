//! Typed errors for loading the GVA table and computing matrices.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised by the aggregator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregateError {
    /// The grouping name is not one of the catalogue keys.
    #[error("unknown grouping '{0}' (expected one of: All, Creative Industries, Digital Sector, Cultural Sector)")]
    UnknownGrouping(String),
}

/// Errors raised while loading the source table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A required column is absent from the CSV header.
    #[error("required column '{0}' not found")]
    MissingColumn(String),

    /// A required field is empty or unparseable on a data row (0-based).
    #[error("row {row}: missing value for '{column}'")]
    MissingField { column: String, row: usize },
}
