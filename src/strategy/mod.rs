//! Pairs trading strategy: signal policy, observation validation and the
//! per-pair sequential trader.

pub mod config;
pub mod pairs;
pub mod policy;
pub mod validators;

pub use config::{ConfigError, EvaluationConfig, SignalConfig, StrategyConfig, ZScoreMode};
pub use pairs::{Decision, LegAllocation, LegOrder, PairTrader, RunSummary, TraderError};
pub use policy::{SignalPolicy, ThresholdPolicy};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a trading signal on the spread `y - beta * x`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Buy y, sell beta units of x
    EnterLongSpread,
    /// Sell y, buy beta units of x
    EnterShortSpread,
    Exit,
    Hold,
}

impl Signal {
    pub fn is_entry(self) -> bool {
        matches!(self, Signal::EnterLongSpread | Signal::EnterShortSpread)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::EnterLongSpread => "enter_long_spread",
            Signal::EnterShortSpread => "enter_short_spread",
            Signal::Exit => "exit",
            Signal::Hold => "hold",
        };
        f.write_str(s)
    }
}

/// Spread position held between decisions.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Flat,
    LongSpread,
    ShortSpread,
}

impl Position {
    /// +1 long, -1 short, 0 flat
    pub fn as_f64(self) -> f64 {
        match self {
            Position::Flat => 0.0,
            Position::LongSpread => 1.0,
            Position::ShortSpread => -1.0,
        }
    }

    /// State transition for a signal. Signals that do not apply leave the
    /// position unchanged.
    pub fn apply(self, signal: Signal) -> Position {
        match (self, signal) {
            (Position::Flat, Signal::EnterLongSpread) => Position::LongSpread,
            (Position::Flat, Signal::EnterShortSpread) => Position::ShortSpread,
            (Position::LongSpread | Position::ShortSpread, Signal::Exit) => Position::Flat,
            (current, _) => current,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Position::Flat => "flat",
            Position::LongSpread => "long_spread",
            Position::ShortSpread => "short_spread",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_transitions() {
        assert_eq!(
            Position::Flat.apply(Signal::EnterLongSpread),
            Position::LongSpread
        );
        assert_eq!(
            Position::Flat.apply(Signal::EnterShortSpread),
            Position::ShortSpread
        );
        assert_eq!(Position::LongSpread.apply(Signal::Exit), Position::Flat);
        assert_eq!(Position::ShortSpread.apply(Signal::Exit), Position::Flat);
        // Entries while positioned and exits while flat are ignored
        assert_eq!(
            Position::LongSpread.apply(Signal::EnterShortSpread),
            Position::LongSpread
        );
        assert_eq!(Position::Flat.apply(Signal::Exit), Position::Flat);
        assert_eq!(Position::ShortSpread.apply(Signal::Hold), Position::ShortSpread);
    }

    #[test]
    fn test_position_values() {
        assert_eq!(Position::LongSpread.as_f64(), 1.0);
        assert_eq!(Position::ShortSpread.as_f64(), -1.0);
        assert_eq!(Position::default().as_f64(), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Signal::EnterLongSpread.to_string(), "enter_long_spread");
        assert_eq!(Position::ShortSpread.to_string(), "short_spread");
        assert!(Signal::EnterShortSpread.is_entry());
        assert!(!Signal::Exit.is_entry());
    }
}
