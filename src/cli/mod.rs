//! CLI argument parsing using clap.
//!
//! This module defines the command-line interface for statarb,
//! including all subcommands and their arguments.

mod config;

pub use config::{
    load_strategy_config, parse_pair, CliConfigError, DataSource, OptimizeCliConfig,
    SearchMethodArg, SelectPairsCliConfig,
};

use clap::{Args, Parser, Subcommand};

/// statarb - Kalman-filter pairs trading
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub verbose: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    pub json_logs: bool,
}

/// Price data source shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Price CSV with a date column and one column per ticker
    #[arg(long, required_unless_present = "synthetic", conflicts_with = "synthetic")]
    pub data: Option<String>,
    /// Use a seeded synthetic panel (tickers AAA, BBB, CCC, DDD)
    #[arg(long, default_value_t = false)]
    pub synthetic: bool,
    /// Seed for the synthetic panel
    #[arg(long, default_value_t = 42)]
    pub synthetic_seed: u64,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Select cointegrated pairs from a price panel
    SelectPairs {
        #[command(flatten)]
        data: DataArgs,
        /// Minimum Pearson correlation threshold
        #[arg(long, default_value_t = 0.7)]
        min_correlation: f64,
        /// p-value threshold for the Engle-Granger and spread ADF tests
        #[arg(long, default_value_t = 0.05)]
        significance: f64,
        /// Do not require the Johansen trace test to pass
        #[arg(long, default_value_t = false)]
        no_johansen: bool,
        /// Run tests on raw prices instead of log prices
        #[arg(long, default_value_t = false)]
        raw_prices: bool,
        /// Minimum spread half-life in observations
        #[arg(long)]
        min_half_life: Option<f64>,
        /// Maximum spread half-life in observations
        #[arg(long)]
        max_half_life: Option<f64>,
        /// Maximum number of pairs to output
        #[arg(long)]
        max_pairs: Option<usize>,
        /// Output file path for selected pairs JSON
        #[arg(long, default_value = "selected_pairs.json")]
        output: String,
    },

    /// Print cointegration diagnostics for one pair
    Cointegration {
        #[command(flatten)]
        data: DataArgs,
        /// Pair as "X,Y" (x is the regressor leg)
        #[arg(long)]
        pair: String,
    },

    /// Tune filter noise and z-score thresholds for one pair
    Optimize {
        #[command(flatten)]
        data: DataArgs,
        /// Pair as "X,Y"
        #[arg(long)]
        pair: String,
        /// Search method: 'grid' or 'random'
        #[arg(long, default_value = "random")]
        method: String,
        /// Grid points per dimension
        #[arg(long, default_value_t = 4)]
        steps: usize,
        /// Random search trials
        #[arg(long, default_value_t = 50)]
        trials: usize,
        /// Random search seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Fraction of observations used for fitting
        #[arg(long, default_value_t = 1.0)]
        train_ratio: f64,
        /// Minimum round-trip trades for a trial to count
        #[arg(long, default_value_t = 0)]
        min_trades: usize,
        /// Base strategy configuration JSON
        #[arg(long)]
        config: Option<String>,
        /// Output file path for the optimization result JSON
        #[arg(long, default_value = "optimization.json")]
        output: String,
    },

    /// Evaluate the strategy on one pair and write results
    Run {
        #[command(flatten)]
        data: DataArgs,
        /// Pair as "X,Y"
        #[arg(long)]
        pair: String,
        /// Strategy configuration JSON
        #[arg(long)]
        config: Option<String>,
        /// Output directory for results.json and series.csv
        #[arg(long, default_value = "results")]
        output_dir: String,
    },

    /// Stream observations through the trader and record signals
    Replay {
        #[command(flatten)]
        data: DataArgs,
        /// Pair as "X,Y"
        #[arg(long)]
        pair: String,
        /// Strategy configuration JSON
        #[arg(long)]
        config: Option<String>,
        /// CSV file for recorded signals
        #[arg(long, default_value = "signals.csv")]
        signals_out: String,
        /// Bounded channel capacity between feeder and trader
        #[arg(long, default_value_t = 256)]
        channel_capacity: usize,
    },

    /// Select pairs, optimize the best one and evaluate it
    Pipeline {
        #[command(flatten)]
        data: DataArgs,
        /// Output directory for all artifacts
        #[arg(long, default_value = "results")]
        output_dir: String,
        /// Random search trials
        #[arg(long, default_value_t = 50)]
        trials: usize,
        /// Random search seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}
