//! Common Types Module
//!
//! Shared types used across the codebase to avoid circular dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// A timestamped pair of prices.
///
/// `x` is the regressor leg, `y` the dependent leg: `y ≈ α + β·x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub x: f64,
    pub y: f64,
}

impl Observation {
    pub fn new(timestamp: DateTime<Utc>, x: f64, y: f64) -> Self {
        Self { timestamp, x, y }
    }
}

/// Two instruments modeled jointly. `leg_x` is the regressor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPair {
    pub leg_x: String,
    pub leg_y: String,
}

impl AssetPair {
    pub fn new(leg_x: impl Into<String>, leg_y: impl Into<String>) -> Self {
        Self {
            leg_x: leg_x.into(),
            leg_y: leg_y.into(),
        }
    }

    /// Parse "X,Y" or "X-Y" (comma preferred, since tickers may contain dashes).
    pub fn parse(s: &str) -> Option<Self> {
        let (x, y) = s.split_once(',').or_else(|| s.split_once('-'))?;
        let (x, y) = (x.trim(), y.trim());
        if x.is_empty() || y.is_empty() || x == y {
            return None;
        }
        Some(Self::new(x, y))
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.leg_x, self.leg_y)
    }
}

/// Aligned price panel: one timestamp axis, one column per ticker.
///
/// Missing prices are stored as `NaN`. Column order follows the source file.
#[derive(Debug, Clone, Default)]
pub struct PricePanel {
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<(String, Vec<f64>)>,
}

impl PricePanel {
    /// Build a panel; every column must match the timestamp axis length.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, String> {
        for (name, values) in &columns {
            if values.len() != timestamps.len() {
                return Err(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    values.len(),
                    timestamps.len()
                ));
            }
        }
        Ok(Self {
            timestamps,
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn column(&self, ticker: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == ticker)
            .map(|(_, v)| v.as_slice())
    }

    /// Carry the last finite value forward over gaps. Leading gaps stay `NaN`.
    pub fn forward_fill(&mut self) {
        for (_, values) in &mut self.columns {
            let mut last = f64::NAN;
            for v in values.iter_mut() {
                if v.is_finite() {
                    last = *v;
                } else {
                    *v = last;
                }
            }
        }
    }

    /// Rows where both legs are present, as observations.
    pub fn observations(&self, pair: &AssetPair) -> Option<Vec<Observation>> {
        let xs = self.column(&pair.leg_x)?;
        let ys = self.column(&pair.leg_y)?;
        Some(
            self.timestamps
                .iter()
                .zip(xs.iter().zip(ys.iter()))
                .filter(|(_, (x, y))| x.is_finite() && y.is_finite())
                .map(|(ts, (x, y))| Observation::new(*ts, *x, *y))
                .collect(),
        )
    }

    /// Aligned `(x, y)` price vectors for a pair of columns.
    pub fn aligned(&self, leg_x: &str, leg_y: &str) -> Option<(Vec<f64>, Vec<f64>)> {
        let obs = self.observations(&AssetPair::new(leg_x, leg_y))?;
        Some(obs.iter().map(|o| (o.x, o.y)).unzip())
    }
}
