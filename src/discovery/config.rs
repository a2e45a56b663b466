//! Configuration for pair selection and parameter search

use serde::{Deserialize, Serialize};

/// Configuration for the pair selection pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Minimum Pearson correlation threshold (0.0-1.0)
    #[serde(default = "default_min_correlation")]
    pub min_correlation: f64,

    /// p-value threshold for Engle-Granger and spread ADF tests
    #[serde(default = "default_significance")]
    pub significance: f64,

    /// Require the Johansen trace statistic to exceed its 95% critical value
    #[serde(default = "default_require_johansen")]
    pub require_johansen: bool,

    /// Run the tests on log prices
    #[serde(default = "default_use_log_prices")]
    pub use_log_prices: bool,

    /// Minimum mean-reversion half-life (observations)
    #[serde(default)]
    pub min_half_life: Option<f64>,

    /// Maximum mean-reversion half-life (observations)
    #[serde(default)]
    pub max_half_life: Option<f64>,

    /// Minimum aligned observations per pair
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,

    /// Maximum number of pairs to output (None keeps all)
    #[serde(default)]
    pub max_pairs: Option<usize>,
}

// Default value functions for serde
fn default_min_correlation() -> f64 {
    0.7
}
fn default_significance() -> f64 {
    0.05
}
fn default_require_johansen() -> bool {
    true
}
fn default_use_log_prices() -> bool {
    true
}
fn default_min_observations() -> usize {
    60
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_correlation: default_min_correlation(),
            significance: default_significance(),
            require_johansen: default_require_johansen(),
            use_log_prices: default_use_log_prices(),
            min_half_life: None,
            max_half_life: None,
            min_observations: default_min_observations(),
            max_pairs: None,
        }
    }
}

impl SelectionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(-1.0..=1.0).contains(&self.min_correlation) {
            return Err(format!(
                "min_correlation must be between -1.0 and 1.0, got {}",
                self.min_correlation
            ));
        }
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(format!(
                "significance must be in (0, 1), got {}",
                self.significance
            ));
        }
        if let (Some(lo), Some(hi)) = (self.min_half_life, self.max_half_life) {
            if lo > hi {
                return Err(format!(
                    "min_half_life ({}) exceeds max_half_life ({})",
                    lo, hi
                ));
            }
        }
        if matches!(self.max_half_life, Some(hl) if hl <= 0.0) {
            return Err("max_half_life must be positive".to_string());
        }
        if self.min_observations < 30 {
            return Err(format!(
                "min_observations must be at least 30, got {}",
                self.min_observations
            ));
        }
        if self.max_pairs == Some(0) {
            return Err("max_pairs must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Search ranges for the tuned parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSpace {
    /// Process noise q, sampled log-uniformly
    pub process_noise: (f64, f64),
    /// Observation noise R, sampled log-uniformly
    pub observation_noise: (f64, f64),
    pub entry_z: (f64, f64),
    pub exit_z: (f64, f64),
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            process_noise: (1e-6, 1e-2),
            observation_noise: (1e-4, 1e-1),
            entry_z: (1.0, 3.0),
            exit_z: (0.1, 1.0),
        }
    }
}

impl SearchSpace {
    pub fn validate(&self) -> Result<(), String> {
        for (name, (lo, hi), log) in [
            ("process_noise", self.process_noise, true),
            ("observation_noise", self.observation_noise, true),
            ("entry_z", self.entry_z, false),
            ("exit_z", self.exit_z, false),
        ] {
            if !(lo.is_finite() && hi.is_finite()) || lo > hi {
                return Err(format!("{} range [{}, {}] is invalid", name, lo, hi));
            }
            if log && lo <= 0.0 {
                return Err(format!("{} range must be positive for log sampling", name));
            }
        }
        if self.exit_z.0 < 0.0 {
            return Err("exit_z must be non-negative".to_string());
        }
        Ok(())
    }
}

/// How candidate parameter sets are generated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SearchMethod {
    /// `steps` points per dimension
    Grid { steps: usize },
    /// `trials` draws from a seeded RNG
    Random { trials: usize, seed: u64 },
}

impl Default for SearchMethod {
    fn default() -> Self {
        SearchMethod::Random {
            trials: 50,
            seed: 42,
        }
    }
}

/// Largest accepted grid resolution (50⁴ = 6.25M candidates)
pub const MAX_GRID_STEPS: usize = 50;

/// Parameter search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub space: SearchSpace,

    #[serde(default)]
    pub method: SearchMethod,

    /// Fraction of observations used for fitting (1.0 = no validation split)
    #[serde(default = "default_train_ratio")]
    pub train_ratio: f64,

    /// Minimum round-trip trades on the train segment
    #[serde(default)]
    pub min_trades: usize,

    /// Train minus validation Sharpe above this is logged as overfitting
    #[serde(default = "default_overfit_gap")]
    pub overfit_gap: f64,
}

fn default_train_ratio() -> f64 {
    1.0
}
fn default_overfit_gap() -> f64 {
    2.0
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            space: SearchSpace::default(),
            method: SearchMethod::default(),
            train_ratio: default_train_ratio(),
            min_trades: 0,
            overfit_gap: default_overfit_gap(),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.space.validate()?;
        if !(self.train_ratio > 0.0 && self.train_ratio <= 1.0) {
            return Err(format!(
                "train_ratio must be in (0, 1], got {}",
                self.train_ratio
            ));
        }
        match self.method {
            SearchMethod::Grid { steps } if steps == 0 => {
                Err("grid steps must be at least 1".to_string())
            }
            SearchMethod::Grid { steps } if steps > MAX_GRID_STEPS => Err(format!(
                "grid steps must be at most {}, got {}",
                MAX_GRID_STEPS, steps
            )),
            SearchMethod::Random { trials, .. } if trials == 0 => {
                Err("random search needs at least 1 trial".to_string())
            }
            _ => Ok(()),
        }
    }
}
