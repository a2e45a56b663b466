//! Parameter search command handler.

use crate::cli::{load_strategy_config, parse_pair, DataSource, OptimizeCliConfig};
use crate::data::export::write_json;
use crate::discovery::optimize_pair;
use crate::types::AssetPair;
use std::path::Path;
use tracing::info;

/// Search q, R and the z thresholds for one pair and write the result.
///
/// # Errors
/// Returns error if data or config loading fails, or no trial qualifies.
pub fn run_optimize(
    source: &DataSource,
    pair_arg: &str,
    args: &OptimizeCliConfig,
    config_path: Option<&str>,
    output_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("--- statarb: Parameter Search ---");
    let panel = source.load()?;
    let pair: AssetPair = parse_pair(pair_arg, &panel)?;
    let base = load_strategy_config(config_path)?;
    let optimizer = args.to_optimizer_config()?;

    info!(
        pair = %pair,
        method = ?optimizer.method,
        train_ratio = optimizer.train_ratio,
        min_trades = optimizer.min_trades,
        "Configuration loaded"
    );

    let observations = panel.observations(&pair).unwrap_or_default();
    let result = optimize_pair(&pair, &observations, &base, &optimizer)?;

    write_json(Path::new(output_path), &result)?;
    info!(
        sharpe = format!("{:.3}", result.train_sharpe),
        trades = result.trades,
        output = output_path,
        "Optimization complete"
    );
    Ok(())
}
