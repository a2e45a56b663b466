//! Tracing-based Signal Recorder
//!
//! Emits structured logs for signals that any tracing subscriber can capture,
//! including the JSON formatter.

use super::recorder::{RecordError, SignalRecord, SignalRecorder};
use async_trait::async_trait;
use tracing::info;

/// Recorder that emits structured tracing logs
pub struct TracingRecorder;

impl TracingRecorder {
    /// Create a new tracing recorder
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalRecorder for TracingRecorder {
    async fn record(&self, record: &SignalRecord) -> Result<(), RecordError> {
        info!(
            target: "signals",
            record_id = %record.record_id,
            timestamp = %record.timestamp.to_rfc3339(),
            pair = %record.pair,
            signal = %record.signal,
            position = %record.position,
            hedge_ratio = record.hedge_ratio,
            spread = record.spread,
            zscore = record.zscore.map(|z| z.to_string()).unwrap_or_else(|| "NA".to_string()),
            y_units = record.leg_y.as_ref().map(|l| l.units.to_string()).unwrap_or_default(),
            x_units = record.leg_x.as_ref().map(|l| l.units.to_string()).unwrap_or_default(),
            "Signal emitted"
        );
        Ok(())
    }
}
