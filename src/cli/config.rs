//! CLI configuration structs bridging CLI arguments to domain types.
//!
//! These structs decouple the CLI parsing layer from the business logic,
//! allowing command handlers to work with validated, typed configurations.

use super::DataArgs;
use crate::data::{load_price_csv, synthetic_panel, DataError, SyntheticConfig};
use crate::discovery::{OptimizerConfig, SearchMethod, SelectionConfig};
use crate::strategy::{ConfigError, StrategyConfig};
use crate::types::{AssetPair, PricePanel};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when converting CLI arguments.
#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("Invalid pair '{0}'. Expected two distinct tickers as 'X,Y'")]
    InvalidPair(String),

    #[error("Unknown search method: '{0}'. Use 'grid' or 'random'")]
    UnknownMethod(String),

    #[error("Ticker '{ticker}' not found in price data (available: {available})")]
    UnknownTicker { ticker: String, available: String },
}

/// Where prices come from
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Csv(PathBuf),
    Synthetic { seed: u64 },
}

impl From<&DataArgs> for DataSource {
    fn from(args: &DataArgs) -> Self {
        match (&args.data, args.synthetic) {
            (Some(path), false) => DataSource::Csv(PathBuf::from(path)),
            _ => DataSource::Synthetic {
                seed: args.synthetic_seed,
            },
        }
    }
}

impl DataSource {
    pub fn load(&self) -> Result<PricePanel, DataError> {
        match self {
            DataSource::Csv(path) => load_price_csv(path),
            DataSource::Synthetic { seed } => Ok(synthetic_panel(&SyntheticConfig {
                seed: *seed,
                ..Default::default()
            })),
        }
    }
}

/// Parse "X,Y" and check both legs exist in the panel.
pub fn parse_pair(value: &str, panel: &PricePanel) -> Result<AssetPair, CliConfigError> {
    let pair =
        AssetPair::parse(value).ok_or_else(|| CliConfigError::InvalidPair(value.to_string()))?;
    for ticker in [&pair.leg_x, &pair.leg_y] {
        if panel.column(ticker).is_none() {
            return Err(CliConfigError::UnknownTicker {
                ticker: ticker.clone(),
                available: panel.tickers().join(", "),
            });
        }
    }
    Ok(pair)
}

/// Strategy configuration from an optional JSON file.
pub fn load_strategy_config(path: Option<&str>) -> Result<StrategyConfig, ConfigError> {
    match path {
        Some(p) => StrategyConfig::from_json_file(p),
        None => Ok(StrategyConfig::default()),
    }
}

/// Search methods selectable from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethodArg {
    Grid,
    Random,
}

impl std::str::FromStr for SearchMethodArg {
    type Err = CliConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grid" => Ok(Self::Grid),
            "random" | "rand" => Ok(Self::Random),
            _ => Err(CliConfigError::UnknownMethod(s.to_string())),
        }
    }
}

/// CLI arguments of `select-pairs` before conversion.
#[derive(Debug, Clone)]
pub struct SelectPairsCliConfig {
    pub min_correlation: f64,
    pub significance: f64,
    pub no_johansen: bool,
    pub raw_prices: bool,
    pub min_half_life: Option<f64>,
    pub max_half_life: Option<f64>,
    pub max_pairs: Option<usize>,
}

impl SelectPairsCliConfig {
    pub fn to_selection_config(&self) -> SelectionConfig {
        SelectionConfig {
            min_correlation: self.min_correlation,
            significance: self.significance,
            require_johansen: !self.no_johansen,
            use_log_prices: !self.raw_prices,
            min_half_life: self.min_half_life,
            max_half_life: self.max_half_life,
            max_pairs: self.max_pairs,
            ..Default::default()
        }
    }
}

/// CLI arguments of `optimize` before conversion.
#[derive(Debug, Clone)]
pub struct OptimizeCliConfig {
    pub method: String,
    pub steps: usize,
    pub trials: usize,
    pub seed: u64,
    pub train_ratio: f64,
    pub min_trades: usize,
}

impl OptimizeCliConfig {
    /// # Errors
    /// Returns `UnknownMethod` for anything but grid or random.
    pub fn to_optimizer_config(&self) -> Result<OptimizerConfig, CliConfigError> {
        let method = match self.method.parse::<SearchMethodArg>()? {
            SearchMethodArg::Grid => SearchMethod::Grid { steps: self.steps },
            SearchMethodArg::Random => SearchMethod::Random {
                trials: self.trials,
                seed: self.seed,
            },
        };
        Ok(OptimizerConfig {
            method,
            train_ratio: self.train_ratio,
            min_trades: self.min_trades,
            ..Default::default()
        })
    }
}
