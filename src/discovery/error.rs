//! Error types for the discovery module

use thiserror::Error;

/// Errors that can occur during pair selection and optimization
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Insufficient historical data for analysis
    #[error("Insufficient data: expected at least {expected} data points, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// No pairs passed the filtering criteria
    #[error("No viable pairs found matching criteria (correlation >= {min_correlation}, significance < {significance})")]
    NoViablePairs {
        min_correlation: f64,
        significance: f64,
    },

    /// Every parameter trial was rejected
    #[error("No valid parameter set found after {trials} trials")]
    NoValidTrials { trials: usize },

    /// A requested ticker is not in the price panel
    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
