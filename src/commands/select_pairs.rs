//! Pair selection command handler.
//!
//! Implements the `select-pairs` subcommand.

use crate::cli::{DataSource, SelectPairsCliConfig};
use crate::data::export::write_json;
use crate::discovery::select_pairs;
use std::path::Path;
use tracing::info;

/// Run cointegration screening on every column pair and write the survivors.
///
/// # Errors
/// Returns error if data loading fails or no pair qualifies.
pub fn run_select_pairs(
    source: &DataSource,
    args: &SelectPairsCliConfig,
    output_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("--- statarb: Pair Selection ---");
    let panel = source.load()?;
    let config = args.to_selection_config();

    info!(
        tickers = panel.tickers().len(),
        rows = panel.len(),
        min_corr = config.min_correlation,
        significance = config.significance,
        require_johansen = config.require_johansen,
        "Configuration loaded"
    );

    let pairs = select_pairs(&panel, &config)?;

    for (rank, p) in pairs.iter().enumerate() {
        info!(
            rank = rank + 1,
            pair = %p.pair,
            correlation = format!("{:.3}", p.correlation),
            eg_p = format!("{:.4}", p.engle_granger_p),
            johansen = format!("{:.2}/{:.2}", p.johansen_trace, p.johansen_critical),
            adf_p = format!("{:.4}", p.spread_adf_p),
            hedge_ratio = format!("{:.4}", p.hedge_ratio),
            half_life = format!("{:.1}", p.half_life),
            "Selected pair"
        );
    }

    write_json(Path::new(output_path), &pairs)?;
    info!(count = pairs.len(), output = output_path, "Pair selection complete");
    Ok(())
}
