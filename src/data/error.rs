//! Error types for price data loading and export

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// None of the accepted date column names is present
    #[error("No date column found (expected one of: date, Date, timestamp, time)")]
    MissingDateColumn,

    #[error("CSV has a date column but no price columns")]
    NoPriceColumns,

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unparseable date '{value}' at row {row}")]
    InvalidDate { row: usize, value: String },

    #[error("Price file is empty")]
    Empty,

    #[error("Malformed panel: {0}")]
    Panel(String),
}
