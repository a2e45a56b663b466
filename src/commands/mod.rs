//! CLI command handlers.
//!
//! This module contains the implementation for each CLI subcommand,
//! delegating to the selection, evaluation and replay pipelines.

mod cointegration;
mod optimize;
mod pipeline;
mod replay;
mod run;
mod select_pairs;

pub use cointegration::run_cointegration;
pub use optimize::run_optimize;
pub use pipeline::run_pipeline;
pub use replay::run_replay;
pub use run::run_evaluation;
pub use select_pairs::run_select_pairs;
