//! End-to-end pipeline command handler.
//!
//! select pairs -> optimize the top pair -> evaluate with the tuned
//! parameters -> write every artifact.

use super::run::write_report;
use crate::cli::DataSource;
use crate::data::export::{write_json, write_pairs_csv};
use crate::discovery::{optimize_pair, select_pairs, OptimizerConfig, SearchMethod, SelectionConfig};
use crate::evaluation::evaluate;
use crate::strategy::StrategyConfig;
use std::fs;
use std::path::Path;
use tracing::info;

/// Run the full pipeline with default selection settings.
///
/// # Errors
/// Returns error if no pair qualifies, no trial is valid, or output fails.
pub fn run_pipeline(
    source: &DataSource,
    output_dir: &str,
    trials: usize,
    seed: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("--- statarb: Full Pipeline ---");
    let out = Path::new(output_dir);
    fs::create_dir_all(out)?;

    let panel = source.load()?;
    let pairs = select_pairs(&panel, &SelectionConfig::default())?;
    write_json(&out.join("selected_pairs.json"), &pairs)?;
    write_pairs_csv(&out.join("selected_pairs.csv"), &pairs)?;

    let top = &pairs[0];
    info!(pair = %top.pair, correlation = format!("{:.3}", top.correlation), "Optimizing top pair");

    let observations = panel.observations(&top.pair).unwrap_or_default();
    let base = StrategyConfig::default();
    let optimizer = OptimizerConfig {
        method: SearchMethod::Random { trials, seed },
        ..Default::default()
    };
    let result = optimize_pair(&top.pair, &observations, &base, &optimizer)?;
    write_json(&out.join("optimization.json"), &result)?;

    let tuned = result.best.apply(&base);
    write_json(&out.join("strategy_config.json"), &tuned)?;
    let report = evaluate(&top.pair, &observations, &tuned)?;
    write_report(out, &report, &tuned)?;

    info!(
        pair = %top.pair,
        sharpe = format!("{:.3}", report.summary.sharpe),
        trades = report.summary.trades,
        total_pnl = format!("{:.4}", report.summary.total_pnl),
        output_dir,
        "Pipeline complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_pipeline_writes_artifacts() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        run_pipeline(
            &DataSource::Synthetic { seed: 42 },
            out.to_str().unwrap(),
            8,
            1,
        )
        .unwrap();

        for name in [
            "selected_pairs.json",
            "selected_pairs.csv",
            "optimization.json",
            "strategy_config.json",
            "results.json",
            "trades.json",
            "series.csv",
        ] {
            assert!(out.join(name).exists(), "missing {}", name);
        }

        // The tuned config round-trips into a valid strategy config
        let tuned = StrategyConfig::from_json_file(out.join("strategy_config.json")).unwrap();
        assert!(tuned.signal.exit_z < tuned.signal.entry_z);
    }
}
