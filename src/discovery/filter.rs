//! Statistical filtering for pair candidates
//!
//! Implements correlation screening, Engle-Granger and Johansen cointegration
//! tests, and an ADF test on the hedged spread to select tradeable pairs.

use super::cointegration::{engle_granger, half_life, johansen, EngleGrangerResult, JohansenResult};
use super::config::SelectionConfig;
use super::error::DiscoveryError;
use super::stationarity::{adf_test, AdfResult, Regression};
use crate::math::stats::{correlation, linear_fit};
use crate::types::{AssetPair, PricePanel};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, instrument, warn};

/// Full set of cointegration statistics for one ordered pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairStatistics {
    pub correlation: f64,
    pub engle_granger: EngleGrangerResult,
    pub johansen: JohansenResult,
    /// ADF on `y - h·x`
    pub spread_adf: AdfResult,
    /// Least-squares slope of y on x
    pub hedge_ratio: f64,
    /// Spread half-life in observations
    pub half_life: f64,
    pub observations: usize,
}

/// A candidate pair that passed filtering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePair {
    pub pair: AssetPair,
    /// Pearson correlation coefficient
    pub correlation: f64,
    pub engle_granger_p: f64,
    pub johansen_trace: f64,
    /// 95% critical value for the r = 0 trace test
    pub johansen_critical: f64,
    pub spread_adf_p: f64,
    pub hedge_ratio: f64,
    pub half_life: f64,
    pub observations: usize,
}

impl CandidatePair {
    fn from_stats(pair: AssetPair, stats: &PairStatistics) -> Self {
        let (johansen_trace, johansen_critical) = stats.johansen.trace_r0();
        Self {
            pair,
            correlation: stats.correlation,
            engle_granger_p: stats.engle_granger.p_value,
            johansen_trace,
            johansen_critical,
            spread_adf_p: stats.spread_adf.p_value,
            hedge_ratio: stats.hedge_ratio,
            half_life: stats.half_life,
            observations: stats.observations,
        }
    }
}

/// Why a pair was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EngleGranger,
    Johansen,
    SpreadAdf,
    HalfLife,
}

/// Natural log of every price, or `None` if any is non-positive.
pub fn log_prices(prices: &[f64]) -> Option<Vec<f64>> {
    prices
        .iter()
        .map(|p| (*p > 0.0).then(|| p.ln()))
        .collect()
}

/// Run every test on an aligned pair. `x` is the regressor leg.
///
/// Correlation is not thresholded here. Returns `None` when any statistic
/// cannot be computed (short or degenerate series).
pub fn analyze_pair(x: &[f64], y: &[f64]) -> Option<PairStatistics> {
    let correlation = correlation(x, y)?;
    // Engle-Granger regresses the first leg on the second
    let engle_granger = engle_granger(x, y)?;
    let johansen = johansen(&[x, y])?;

    let (_, hedge_ratio) = linear_fit(x, y)?;
    let spread: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| yi - hedge_ratio * xi)
        .collect();
    let spread_adf = adf_test(&spread, Regression::Constant, None)?;
    let half_life = half_life(&spread)?;

    Some(PairStatistics {
        correlation,
        engle_granger,
        johansen,
        spread_adf,
        hedge_ratio,
        half_life,
        observations: x.len(),
    })
}

/// Apply the acceptance rules of `config` to computed statistics.
pub fn check(stats: &PairStatistics, config: &SelectionConfig) -> Result<(), Rejection> {
    if stats.engle_granger.p_value >= config.significance {
        return Err(Rejection::EngleGranger);
    }
    if config.require_johansen {
        let (stat, crit) = stats.johansen.trace_r0();
        if stat <= crit {
            return Err(Rejection::Johansen);
        }
    }
    if stats.spread_adf.p_value >= config.significance {
        return Err(Rejection::SpreadAdf);
    }
    let too_fast = config.min_half_life.is_some_and(|lo| stats.half_life < lo);
    let too_slow = config.max_half_life.is_some_and(|hi| stats.half_life > hi);
    if too_fast || too_slow {
        return Err(Rejection::HalfLife);
    }
    Ok(())
}

/// Prepare an aligned pair for testing, applying the log transform if set.
pub fn prepare_pair(
    panel: &PricePanel,
    leg_x: &str,
    leg_y: &str,
    config: &SelectionConfig,
) -> Option<(Vec<f64>, Vec<f64>)> {
    let (x, y) = panel.aligned(leg_x, leg_y)?;
    if config.use_log_prices {
        Some((log_prices(&x)?, log_prices(&y)?))
    } else {
        Some((x, y))
    }
}

/// Screen every unordered pair of panel columns.
///
/// # Algorithm
/// 1. For each pair (i, j) with i < j in column order, x = column i
/// 2. Align rows, optionally take logs, check correlation
/// 3. Engle-Granger p, Johansen trace, spread ADF p, half-life bounds
/// 4. Sort by correlation desc, Engle-Granger p asc, spread ADF p asc
///
/// # Errors
/// `NoViablePairs` when nothing passes, `InvalidConfig` on a bad config.
#[instrument(skip(panel, config), fields(tickers = panel.tickers().len(), rows = panel.len()))]
pub fn select_pairs(
    panel: &PricePanel,
    config: &SelectionConfig,
) -> Result<Vec<CandidatePair>, DiscoveryError> {
    config.validate().map_err(DiscoveryError::InvalidConfig)?;

    let tickers = panel.tickers();
    if tickers.len() < 2 {
        return Err(DiscoveryError::InsufficientData {
            expected: 2,
            actual: tickers.len(),
        });
    }

    info!(
        candidates = tickers.len(),
        min_corr = config.min_correlation,
        significance = config.significance,
        require_johansen = config.require_johansen,
        "Filtering pair candidates"
    );

    let mut results = Vec::new();
    let mut rejected = [0u32; 4];

    for i in 0..tickers.len() {
        for j in (i + 1)..tickers.len() {
            let pair = AssetPair::new(tickers[i], tickers[j]);

            let Some((x, y)) = prepare_pair(panel, tickers[i], tickers[j], config) else {
                warn!(pair = %pair, "Non-positive prices, skipping pair");
                continue;
            };
            if x.len() < config.min_observations {
                debug!(pair = %pair, len = x.len(), "Too few aligned observations");
                continue;
            }

            let Some(corr) = correlation(&x, &y) else {
                continue;
            };
            if corr < config.min_correlation {
                debug!(pair = %pair, corr, "Correlation too low");
                continue;
            }

            let Some(stats) = analyze_pair(&x, &y) else {
                warn!(pair = %pair, "Cointegration statistics unavailable, skipping pair");
                continue;
            };

            if let Err(reason) = check(&stats, config) {
                debug!(
                    pair = %pair,
                    reason = ?reason,
                    eg_p = format!("{:.4}", stats.engle_granger.p_value),
                    adf_p = format!("{:.4}", stats.spread_adf.p_value),
                    "Pair rejected"
                );
                rejected[reason as usize] += 1;
                continue;
            }

            info!(
                pair = %pair,
                correlation = format!("{:.3}", corr),
                eg_p = format!("{:.4}", stats.engle_granger.p_value),
                adf_p = format!("{:.4}", stats.spread_adf.p_value),
                half_life = format!("{:.1}", stats.half_life),
                "Viable pair found"
            );
            results.push(CandidatePair::from_stats(pair, &stats));
        }
    }

    results.sort_by(|a, b| {
        b.correlation
            .partial_cmp(&a.correlation)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                a.engle_granger_p
                    .partial_cmp(&b.engle_granger_p)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| {
                a.spread_adf_p
                    .partial_cmp(&b.spread_adf_p)
                    .unwrap_or(Ordering::Equal)
            })
    });

    info!(
        viable_pairs = results.len(),
        rejected_eg = rejected[Rejection::EngleGranger as usize],
        rejected_johansen = rejected[Rejection::Johansen as usize],
        rejected_adf = rejected[Rejection::SpreadAdf as usize],
        rejected_half_life = rejected[Rejection::HalfLife as usize],
        "Filtering complete"
    );

    if results.is_empty() {
        return Err(DiscoveryError::NoViablePairs {
            min_correlation: config.min_correlation,
            significance: config.significance,
        });
    }
    if let Some(max) = config.max_pairs {
        results.truncate(max);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{synthetic_panel, SyntheticConfig};

    #[test]
    fn test_log_prices() {
        let logs = log_prices(&[1.0, std::f64::consts::E]).unwrap();
        assert_eq!(logs[0], 0.0);
        assert!((logs[1] - 1.0).abs() < 1e-12);
        assert!(log_prices(&[1.0, 0.0]).is_none());
    }

    #[test]
    fn test_selects_cointegrated_pair_first() {
        let panel = synthetic_panel(&SyntheticConfig::default());
        let pairs = select_pairs(&panel, &SelectionConfig::default()).unwrap();
        let best = &pairs[0];
        assert_eq!(best.pair, AssetPair::new("AAA", "BBB"));
        assert!(best.engle_granger_p < 0.05);
        assert!(best.johansen_trace > best.johansen_critical);
        assert!(best.spread_adf_p < 0.05);
        assert!(best.half_life.is_finite());
    }

    #[test]
    fn test_no_viable_pairs_is_error() {
        let base = synthetic_panel(&SyntheticConfig::default());
        let a = base.column("AAA").unwrap().to_vec();
        // Mirror image: correlation of logs is strongly negative
        let b: Vec<f64> = a.iter().map(|v| 1e4 / v).collect();
        let panel = PricePanel::new(
            base.timestamps().to_vec(),
            vec![("A".into(), a), ("B".into(), b)],
        )
        .unwrap();

        match select_pairs(&panel, &SelectionConfig::default()) {
            Err(DiscoveryError::NoViablePairs { min_correlation, .. }) => {
                assert_eq!(min_correlation, 0.7)
            }
            other => panic!("expected NoViablePairs, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_half_life_filter_rejects() {
        let panel = synthetic_panel(&SyntheticConfig::default());
        let config = SelectionConfig {
            max_half_life: Some(1e-3),
            ..Default::default()
        };
        assert!(matches!(
            select_pairs(&panel, &config),
            Err(DiscoveryError::NoViablePairs { .. })
        ));
    }

    #[test]
    fn test_single_column_is_insufficient() {
        let base = synthetic_panel(&SyntheticConfig::default());
        let panel = PricePanel::new(
            base.timestamps().to_vec(),
            vec![("A".into(), base.column("AAA").unwrap().to_vec())],
        )
        .unwrap();
        assert!(matches!(
            select_pairs(&panel, &SelectionConfig::default()),
            Err(DiscoveryError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_max_pairs_truncates() {
        let panel = synthetic_panel(&SyntheticConfig::default());
        let config = SelectionConfig {
            max_pairs: Some(1),
            ..Default::default()
        };
        assert_eq!(select_pairs(&panel, &config).unwrap().len(), 1);
    }
}
