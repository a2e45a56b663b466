//! Signal Recording System
//!
//! Provides a pluggable `SignalRecorder` trait for recording emitted signals
//! to various backends:
//! - CSV (files for later analysis)
//! - Structured logs via tracing

use crate::strategy::{Decision, LegOrder, Position, Signal};
use crate::types::AssetPair;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error type for signal recording operations
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A single recorded signal with the belief that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    /// Unique record identifier
    pub record_id: String,
    /// Observation timestamp
    pub timestamp: DateTime<Utc>,
    /// Pair label (e.g., "GLD-GDX")
    pub pair: String,
    pub signal: Signal,
    /// Position after the signal
    pub position: Position,
    pub intercept: f64,
    pub hedge_ratio: f64,
    pub spread: f64,
    pub zscore: Option<f64>,
    /// Entry sizing, present on entry signals
    pub leg_y: Option<LegOrder>,
    pub leg_x: Option<LegOrder>,
}

impl SignalRecord {
    /// Build a record from a trader decision.
    pub fn from_decision(pair: &AssetPair, decision: &Decision) -> Self {
        let (leg_y, leg_x) = match &decision.allocation {
            Some(a) => (Some(a.leg_y.clone()), Some(a.leg_x.clone())),
            None => (None, None),
        };
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            timestamp: decision.timestamp,
            pair: pair.to_string(),
            signal: decision.signal,
            position: decision.position,
            intercept: decision.estimate.intercept,
            hedge_ratio: decision.estimate.hedge_ratio,
            spread: decision.estimate.spread,
            zscore: decision.zscore,
            leg_y,
            leg_x,
        }
    }

    /// Format as CSV line (allocates a new String).
    pub fn to_csv_line(&self) -> String {
        let leg = |l: &Option<LegOrder>| match l {
            Some(order) => format!("{},{}", order.side, order.units),
            None => ",".to_string(),
        };
        format!(
            "{},{},{},{},{},{},{},{},{},{},{}",
            self.record_id,
            self.timestamp.to_rfc3339(),
            self.pair,
            self.signal,
            self.position,
            self.intercept,
            self.hedge_ratio,
            self.spread,
            self.zscore.map(|z| z.to_string()).unwrap_or_default(),
            leg(&self.leg_y),
            leg(&self.leg_x),
        )
    }

    /// CSV header
    pub fn csv_header() -> &'static str {
        "record_id,timestamp,pair,signal,position,intercept,hedge_ratio,spread,zscore,y_side,y_units,x_side,x_units"
    }
}

/// Trait for recording signals to various backends
#[async_trait]
pub trait SignalRecorder: Send + Sync {
    /// Record a signal. Implementations should be non-blocking.
    async fn record(&self, record: &SignalRecord) -> Result<(), RecordError>;

    /// Flush any buffered records (optional, default no-op)
    async fn flush(&self) -> Result<(), RecordError> {
        Ok(())
    }
}

/// A recorder that fans out to multiple backends
pub struct MultiRecorder {
    recorders: Vec<Box<dyn SignalRecorder>>,
}

impl MultiRecorder {
    /// Create a new multi-recorder with the given backends
    pub fn new(recorders: Vec<Box<dyn SignalRecorder>>) -> Self {
        Self { recorders }
    }

    /// Add a recorder
    pub fn add(&mut self, recorder: Box<dyn SignalRecorder>) {
        self.recorders.push(recorder);
    }
}

#[async_trait]
impl SignalRecorder for MultiRecorder {
    async fn record(&self, record: &SignalRecord) -> Result<(), RecordError> {
        let mut error_count = 0;
        let mut last_error = None;

        for recorder in &self.recorders {
            if let Err(e) = recorder.record(record).await {
                tracing::error!(error = %e, "Failed to record signal to backend");
                last_error = Some(e);
                error_count += 1;
            }
        }

        // Only an error when every backend failed
        if error_count > 0 && error_count == self.recorders.len() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        Ok(())
    }

    async fn flush(&self) -> Result<(), RecordError> {
        for recorder in &self.recorders {
            recorder.flush().await?;
        }
        Ok(())
    }
}
