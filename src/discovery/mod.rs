//! Pair Selection and Parameter Search Module
//!
//! Tests candidate pairs for cointegration and tunes the trader's parameters
//! through grid or random search over historical evaluations.
//!
//! # Example
//!
//! ```ignore
//! use statarb::data::{synthetic_panel, SyntheticConfig};
//! use statarb::discovery::{select_pairs, SelectionConfig};
//!
//! let panel = synthetic_panel(&SyntheticConfig::default());
//! let pairs = select_pairs(&panel, &SelectionConfig::default())?;
//! ```

pub mod cointegration;
pub mod config;
pub mod error;
pub mod filter;
pub mod optimizer;
pub mod stationarity;

pub use cointegration::{engle_granger, half_life, johansen, EngleGrangerResult, JohansenResult};
pub use config::{OptimizerConfig, SearchMethod, SearchSpace, SelectionConfig};
pub use error::DiscoveryError;
pub use filter::{analyze_pair, select_pairs, CandidatePair, PairStatistics};
pub use optimizer::{optimize_pair, OptimizationResult, ParameterSet};
pub use stationarity::{adf_test, AdfResult, Regression};
