//! Evaluation run command handler.
//!
//! Implements the `run` subcommand: evaluates one pair with a fixed
//! configuration and writes `results.json`, `series.csv` and, when the
//! filter records it, `kalman_history.csv`.

use crate::cli::{load_strategy_config, parse_pair, DataSource};
use crate::data::export::{write_history_csv, write_json, write_series_csv};
use crate::evaluation::{evaluate, EvaluationReport};
use crate::strategy::StrategyConfig;
use crate::types::AssetPair;
use std::fs;
use std::path::Path;
use tracing::info;

/// Write every artifact of an evaluation into `output_dir`.
pub(crate) fn write_report(
    output_dir: &Path,
    report: &EvaluationReport,
    config: &StrategyConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(output_dir)?;
    write_json(&output_dir.join("results.json"), &report.summary)?;
    write_json(&output_dir.join("trades.json"), &report.trades)?;
    write_series_csv(&output_dir.join("series.csv"), &report.steps)?;

    if config.kalman.record_history {
        write_history_csv(
            &output_dir.join("kalman_history.csv"),
            &report.filter_history,
        )?;
    }
    Ok(())
}

/// Evaluate one pair and write results.
///
/// # Errors
/// Returns error if data or config loading fails, or output cannot be written.
pub fn run_evaluation(
    source: &DataSource,
    pair_arg: &str,
    config_path: Option<&str>,
    output_dir: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("--- statarb: Evaluation Run ---");
    let panel = source.load()?;
    let pair: AssetPair = parse_pair(pair_arg, &panel)?;
    let config = load_strategy_config(config_path)?;
    let observations = panel.observations(&pair).unwrap_or_default();

    let report = evaluate(&pair, &observations, &config)?;
    write_report(Path::new(output_dir), &report, &config)?;

    info!(
        pair = %pair,
        observations = report.summary.observations,
        trades = report.summary.trades,
        win_rate = format!("{:.1}%", report.summary.win_rate * 100.0),
        total_pnl = format!("{:.4}", report.summary.total_pnl),
        sharpe = format!("{:.3}", report.summary.sharpe),
        max_drawdown = format!("{:.4}", report.summary.max_drawdown),
        output_dir,
        "Evaluation complete"
    );
    Ok(())
}
