//! Mathematical utilities for the pairs strategy.
//!
//! This module provides statistical and mathematical primitives, including
//! Kalman filtering for dynamic hedge ratio estimation and least squares.

pub mod kalman;
pub mod stats;

pub use kalman::{HedgeEstimate, KalmanConfig, KalmanHedgeRatio};
pub use stats::{correlation, ols, sharpe_ratio, OlsFit, RollingZScore};
