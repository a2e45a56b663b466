//! Cointegration diagnostics command handler.

use crate::cli::{parse_pair, DataSource};
use crate::discovery::filter::{analyze_pair, log_prices};
use crate::discovery::{adf_test, DiscoveryError, Regression};
use tracing::{info, warn};

/// Print every selection statistic for one pair, pass or fail.
///
/// Tests run on log prices, the same as selection.
///
/// # Errors
/// Returns error if the pair is unknown or the statistics cannot be computed.
pub fn run_cointegration(
    source: &DataSource,
    pair_arg: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("--- statarb: Cointegration Diagnostics ---");
    let panel = source.load()?;
    let pair = parse_pair(pair_arg, &panel)?;

    let (x, y) = panel
        .aligned(&pair.leg_x, &pair.leg_y)
        .ok_or_else(|| DiscoveryError::UnknownTicker(pair.to_string()))?;
    let (x, y) = match (log_prices(&x), log_prices(&y)) {
        (Some(lx), Some(ly)) => (lx, ly),
        _ => return Err("prices must be positive to take logs".into()),
    };

    for (leg, series) in [(&pair.leg_x, &x), (&pair.leg_y, &y)] {
        match adf_test(series, Regression::Constant, None) {
            Some(adf) => info!(
                leg = %leg,
                statistic = format!("{:.4}", adf.statistic),
                p_value = format!("{:.4}", adf.p_value),
                lags = adf.used_lag,
                "ADF on log price"
            ),
            None => warn!(leg = %leg, "ADF unavailable"),
        }
    }

    let stats = analyze_pair(&x, &y).ok_or(DiscoveryError::InsufficientData {
        expected: crate::discovery::stationarity::MIN_ADF_OBSERVATIONS,
        actual: x.len(),
    })?;

    info!(
        pair = %pair,
        observations = stats.observations,
        correlation = format!("{:.4}", stats.correlation),
        "Correlation"
    );
    info!(
        statistic = format!("{:.4}", stats.engle_granger.statistic),
        p_value = format!("{:.4}", stats.engle_granger.p_value),
        slope = format!("{:.4}", stats.engle_granger.slope),
        "Engle-Granger"
    );
    for (r, (stat, crit)) in stats
        .johansen
        .trace_statistics
        .iter()
        .zip(&stats.johansen.trace_critical)
        .enumerate()
    {
        info!(
            r,
            trace = format!("{:.3}", stat),
            crit_90 = crit[0],
            crit_95 = crit[1],
            crit_99 = crit[2],
            "Johansen trace"
        );
    }
    info!(
        eigenvalues = ?stats.johansen.eigenvalues,
        rank = stats.johansen.rank(),
        "Johansen eigenvalues"
    );
    info!(
        hedge_ratio = format!("{:.4}", stats.hedge_ratio),
        statistic = format!("{:.4}", stats.spread_adf.statistic),
        p_value = format!("{:.4}", stats.spread_adf.p_value),
        half_life = format!("{:.2}", stats.half_life),
        "Spread stationarity"
    );

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
