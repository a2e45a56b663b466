//! Decision rules mapping a normalized spread to a signal.

use super::config::SignalConfig;
use super::{Position, Signal};

/// Decides the next signal from the current position and z-score.
///
/// Implementations must be pure: the trader owns all state.
pub trait SignalPolicy: Send + Sync {
    /// `zscore` is `None` while the normalizer is not ready.
    /// `entries_allowed` is false during filter warm-up.
    fn decide(&self, zscore: Option<f64>, position: Position, entries_allowed: bool) -> Signal;
}

/// Symmetric mean-reversion thresholds.
///
/// | position     | condition       | signal           |
/// |--------------|-----------------|------------------|
/// | Flat         | z > entry       | EnterShortSpread |
/// | Flat         | z < -entry      | EnterLongSpread  |
/// | LongSpread   | z > -exit       | Exit             |
/// | ShortSpread  | z < exit        | Exit             |
/// | any          | otherwise       | Hold             |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    entry_z: f64,
    exit_z: f64,
}

impl ThresholdPolicy {
    pub fn new(entry_z: f64, exit_z: f64) -> Self {
        Self { entry_z, exit_z }
    }

    pub fn from_config(config: &SignalConfig) -> Self {
        Self::new(config.entry_z, config.exit_z)
    }

    pub fn entry_z(&self) -> f64 {
        self.entry_z
    }

    pub fn exit_z(&self) -> f64 {
        self.exit_z
    }
}

impl SignalPolicy for ThresholdPolicy {
    fn decide(&self, zscore: Option<f64>, position: Position, entries_allowed: bool) -> Signal {
        let Some(z) = zscore.filter(|z| z.is_finite()) else {
            return Signal::Hold;
        };

        match position {
            Position::Flat if !entries_allowed => Signal::Hold,
            Position::Flat if z > self.entry_z => Signal::EnterShortSpread,
            Position::Flat if z < -self.entry_z => Signal::EnterLongSpread,
            Position::LongSpread if z > -self.exit_z => Signal::Exit,
            Position::ShortSpread if z < self.exit_z => Signal::Exit,
            _ => Signal::Hold,
        }
    }
}
