//! Strategy configuration loaded from JSON.

use crate::math::KalmanConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating a strategy configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How the spread is normalized before thresholding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ZScoreMode {
    /// Trailing-window z-score of the spread
    Rolling {
        #[serde(default = "default_window")]
        window: usize,
    },
    /// Innovation divided by its predicted standard deviation
    Innovation,
}

fn default_window() -> usize {
    60
}

impl Default for ZScoreMode {
    fn default() -> Self {
        ZScoreMode::Rolling {
            window: default_window(),
        }
    }
}

/// Entry and exit thresholds in z units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    #[serde(default = "default_entry_z")]
    pub entry_z: f64,
    #[serde(default = "default_exit_z")]
    pub exit_z: f64,
    #[serde(default)]
    pub zscore: ZScoreMode,
}

fn default_entry_z() -> f64 {
    2.0
}
fn default_exit_z() -> f64 {
    0.5
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            entry_z: default_entry_z(),
            exit_z: default_exit_z(),
            zscore: ZScoreMode::default(),
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.entry_z.is_finite() && self.entry_z > 0.0) {
            return Err(format!("entry_z must be positive, got {}", self.entry_z));
        }
        if !(self.exit_z.is_finite() && self.exit_z >= 0.0) {
            return Err(format!("exit_z must be non-negative, got {}", self.exit_z));
        }
        if self.exit_z >= self.entry_z {
            return Err(format!(
                "exit_z ({}) must be below entry_z ({})",
                self.exit_z, self.entry_z
            ));
        }
        if let ZScoreMode::Rolling { window } = self.zscore {
            if window < 2 {
                return Err(format!("rolling window must be at least 2, got {}", window));
            }
        }
        Ok(())
    }
}

/// Settings for the spread PnL evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Cost charged per unit change in position
    #[serde(default)]
    pub cost_per_unit: f64,
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: f64,
}

fn default_periods_per_year() -> f64 {
    crate::math::stats::ANNUALIZATION_FACTOR
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            cost_per_unit: 0.0,
            periods_per_year: default_periods_per_year(),
        }
    }
}

/// Complete configuration for one pair trader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default)]
    pub kalman: KalmanConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Notional per entry used for leg sizing
    #[serde(default = "default_notional")]
    pub notional: Decimal,
    /// Filter updates required before entries are allowed
    #[serde(default)]
    pub warmup_updates: u64,
}

fn default_notional() -> Decimal {
    dec!(10000)
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kalman: KalmanConfig::default(),
            signal: SignalConfig::default(),
            evaluation: EvaluationConfig::default(),
            notional: default_notional(),
            warmup_updates: 0,
        }
    }
}

impl StrategyConfig {
    /// Load and validate a configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: StrategyConfig = serde_json::from_str(&content)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.kalman.validate()?;
        self.signal.validate()?;
        if self.evaluation.cost_per_unit < 0.0 || !self.evaluation.cost_per_unit.is_finite() {
            return Err(format!(
                "cost_per_unit must be non-negative, got {}",
                self.evaluation.cost_per_unit
            ));
        }
        if !(self.evaluation.periods_per_year > 0.0) {
            return Err("periods_per_year must be positive".to_string());
        }
        if self.notional <= Decimal::ZERO {
            return Err(format!("notional must be positive, got {}", self.notional));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = StrategyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.signal.zscore, ZScoreMode::Rolling { window: 60 });
        assert_eq!(config.notional, dec!(10000));
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: StrategyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StrategyConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "kalman": {"process_noise": 0.0001},
            "signal": {"entry_z": 1.5, "zscore": {"mode": "innovation"}},
            "notional": "2500.50",
            "warmup_updates": 30
        }"#;
        let config: StrategyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.kalman.process_noise, 1e-4);
        assert_eq!(config.kalman.observation_noise, 1e-3);
        assert_eq!(config.signal.entry_z, 1.5);
        assert_eq!(config.signal.exit_z, 0.5);
        assert_eq!(config.signal.zscore, ZScoreMode::Innovation);
        assert_eq!(config.notional, dec!(2500.50));
        assert_eq!(config.warmup_updates, 30);
    }

    #[test]
    fn test_exit_above_entry_is_invalid() {
        let config = StrategyConfig {
            signal: SignalConfig {
                entry_z: 1.0,
                exit_z: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"signal": {{"entry_z": 2.5, "exit_z": 0.25}}}}"#).unwrap();
        let config = StrategyConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.signal.entry_z, 2.5);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, r#"{{"notional": "-1"}}"#).unwrap();
        assert!(matches!(
            StrategyConfig::from_json_file(bad.path()),
            Err(ConfigError::Invalid(_))
        ));
    }
}
