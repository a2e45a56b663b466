//! Parameter search for the pair trader.
//!
//! Tunes filter noise (q, R) and the z-score thresholds by maximizing the
//! evaluation Sharpe ratio on a train segment, with optional re-evaluation on
//! a held-out validation segment.

use super::config::{OptimizerConfig, SearchMethod, SearchSpace};
use super::error::DiscoveryError;
use crate::evaluation::evaluate;
use crate::math::KalmanConfig;
use crate::strategy::{SignalConfig, StrategyConfig};
use crate::types::{AssetPair, Observation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// One point in the search space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub process_noise: f64,
    pub observation_noise: f64,
    pub entry_z: f64,
    pub exit_z: f64,
}

impl ParameterSet {
    /// Overlay onto a base configuration
    pub fn apply(&self, base: &StrategyConfig) -> StrategyConfig {
        StrategyConfig {
            kalman: KalmanConfig {
                process_noise: self.process_noise,
                observation_noise: self.observation_noise,
                ..base.kalman.clone()
            },
            signal: SignalConfig {
                entry_z: self.entry_z,
                exit_z: self.exit_z,
                ..base.signal.clone()
            },
            ..base.clone()
        }
    }
}

/// Result of parameter optimization for a single pair
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub pair: AssetPair,
    pub best: ParameterSet,
    /// Annualized Sharpe on the train segment
    pub train_sharpe: f64,
    /// Sharpe on the validation segment, if one exists
    pub validation_sharpe: Option<f64>,
    /// Completed round trips on the train segment
    pub trades: usize,
    pub total_pnl: f64,
    pub trials_evaluated: usize,
    pub trials_skipped: usize,
}

fn log_uniform(rng: &mut StdRng, (lo, hi): (f64, f64)) -> f64 {
    if hi <= lo {
        return lo;
    }
    rng.gen_range(lo.ln()..=hi.ln()).exp()
}

fn uniform(rng: &mut StdRng, (lo, hi): (f64, f64)) -> f64 {
    if hi <= lo {
        return lo;
    }
    rng.gen_range(lo..=hi)
}

/// `steps` evenly spaced points, geometric if `log`.
fn spaced((lo, hi): (f64, f64), steps: usize, log: bool) -> Vec<f64> {
    if steps <= 1 || hi <= lo {
        return vec![if log { (lo * hi).sqrt() } else { (lo + hi) / 2.0 }];
    }
    (0..steps)
        .map(|i| {
            let f = i as f64 / (steps - 1) as f64;
            if log {
                (lo.ln() + f * (hi.ln() - lo.ln())).exp()
            } else {
                lo + f * (hi - lo)
            }
        })
        .collect()
}

/// Enumerate candidates for a search method.
///
/// # Errors
/// `InvalidConfig` if the grid size overflows `usize`.
pub fn candidates(
    space: &SearchSpace,
    method: SearchMethod,
) -> Result<Vec<ParameterSet>, DiscoveryError> {
    match method {
        SearchMethod::Grid { steps } => {
            let size = steps.checked_pow(4).ok_or_else(|| {
                DiscoveryError::InvalidConfig(format!("grid of {} steps is too large", steps))
            })?;
            let qs = spaced(space.process_noise, steps, true);
            let rs = spaced(space.observation_noise, steps, true);
            let entries = spaced(space.entry_z, steps, false);
            let exits = spaced(space.exit_z, steps, false);
            let mut out = Vec::with_capacity(size);
            for &process_noise in &qs {
                for &observation_noise in &rs {
                    for &entry_z in &entries {
                        for &exit_z in &exits {
                            out.push(ParameterSet {
                                process_noise,
                                observation_noise,
                                entry_z,
                                exit_z,
                            });
                        }
                    }
                }
            }
            Ok(out)
        }
        SearchMethod::Random { trials, seed } => {
            let mut rng = StdRng::seed_from_u64(seed);
            Ok((0..trials)
                .map(|_| ParameterSet {
                    process_noise: log_uniform(&mut rng, space.process_noise),
                    observation_noise: log_uniform(&mut rng, space.observation_noise),
                    entry_z: uniform(&mut rng, space.entry_z),
                    exit_z: uniform(&mut rng, space.exit_z),
                })
                .collect())
        }
    }
}

/// Search for the parameter set with the best train Sharpe.
///
/// # Algorithm
/// 1. Split observations at `train_ratio`
/// 2. Skip candidates with `exit_z >= entry_z` or an invalid config
/// 3. Evaluate on train, discard trials below `min_trades`
/// 4. Keep the best Sharpe, re-evaluate it on the validation segment
///
/// # Errors
/// `NoValidTrials` if every candidate was skipped or discarded.
#[instrument(skip_all, fields(pair = %pair, n = observations.len()))]
pub fn optimize_pair(
    pair: &AssetPair,
    observations: &[Observation],
    base: &StrategyConfig,
    config: &OptimizerConfig,
) -> Result<OptimizationResult, DiscoveryError> {
    config.validate().map_err(DiscoveryError::InvalidConfig)?;

    let split = (((observations.len() as f64) * config.train_ratio).round() as usize)
        .min(observations.len());
    let (train, validation) = observations.split_at(split);
    if train.len() < 2 {
        return Err(DiscoveryError::InsufficientData {
            expected: 2,
            actual: train.len(),
        });
    }

    let trials = candidates(&config.space, config.method)?;
    info!(
        trials = trials.len(),
        train = train.len(),
        validation = validation.len(),
        "Starting parameter search"
    );

    let mut best: Option<(ParameterSet, f64, usize, f64)> = None;
    let mut evaluated = 0usize;
    let mut skipped = 0usize;

    for params in &trials {
        if params.exit_z >= params.entry_z {
            skipped += 1;
            continue;
        }
        let strategy = params.apply(base);
        let report = match evaluate(pair, train, &strategy) {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, ?params, "Trial skipped");
                skipped += 1;
                continue;
            }
        };
        evaluated += 1;

        if report.summary.trades < config.min_trades {
            continue;
        }

        let sharpe = report.summary.sharpe;
        let is_better = match &best {
            Some((_, best_sharpe, _, _)) => sharpe > *best_sharpe,
            None => sharpe.is_finite(),
        };
        if is_better {
            debug!(
                sharpe = format!("{:.3}", sharpe),
                trades = report.summary.trades,
                q = params.process_noise,
                r = params.observation_noise,
                entry = params.entry_z,
                exit = params.exit_z,
                "New best trial"
            );
            best = Some((*params, sharpe, report.summary.trades, report.summary.total_pnl));
        }
    }

    let Some((params, train_sharpe, trades, total_pnl)) = best else {
        warn!(trials = trials.len(), skipped, "No valid trial");
        return Err(DiscoveryError::NoValidTrials {
            trials: trials.len(),
        });
    };

    let validation_sharpe = if validation.len() >= 2 {
        evaluate(pair, validation, &params.apply(base))
            .ok()
            .map(|r| r.summary.sharpe)
    } else {
        None
    };

    if let Some(v) = validation_sharpe {
        if train_sharpe - v > config.overfit_gap {
            warn!(
                train = format!("{:.3}", train_sharpe),
                validation = format!("{:.3}", v),
                "Possible overfitting: validation Sharpe far below train"
            );
        }
    }

    info!(
        sharpe = format!("{:.3}", train_sharpe),
        validation = validation_sharpe.map(|v| format!("{:.3}", v)).unwrap_or_default(),
        trades,
        q = params.process_noise,
        r = params.observation_noise,
        entry = params.entry_z,
        exit = params.exit_z,
        "Parameter search complete"
    );

    Ok(OptimizationResult {
        pair: pair.clone(),
        best: params,
        train_sharpe,
        validation_sharpe,
        trades,
        total_pnl,
        trials_evaluated: evaluated,
        trials_skipped: skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{synthetic_panel, SyntheticConfig};

    fn observations() -> (AssetPair, Vec<Observation>) {
        let pair = AssetPair::new("AAA", "BBB");
        let panel = synthetic_panel(&SyntheticConfig::default());
        let obs = panel.observations(&pair).unwrap();
        (pair, obs)
    }

    #[test]
    fn test_grid_candidates() {
        let space = SearchSpace::default();
        let grid = candidates(&space, SearchMethod::Grid { steps: 3 }).unwrap();
        assert_eq!(grid.len(), 81);
        assert!((grid[0].process_noise - 1e-6).abs() < 1e-15);
        // Geometric midpoint of [1e-6, 1e-2]
        assert!(grid
            .iter()
            .any(|p| (p.process_noise - 1e-4).abs() < 1e-12));
        assert!(grid.iter().all(|p| (1.0..=3.0).contains(&p.entry_z)));
    }

    #[test]
    fn test_random_candidates_are_seeded_and_in_range() {
        let space = SearchSpace::default();
        let method = SearchMethod::Random {
            trials: 25,
            seed: 9,
        };
        let a = candidates(&space, method).unwrap();
        let b = candidates(&space, method).unwrap();
        assert_eq!(a, b);
        for p in &a {
            assert!((1e-6..=1e-2).contains(&p.process_noise));
            assert!((1e-4..=1e-1).contains(&p.observation_noise));
            assert!((0.1..=1.0).contains(&p.exit_z));
        }
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let space = SearchSpace::default();
        assert!(matches!(
            candidates(&space, SearchMethod::Grid { steps: 70_000 }),
            Err(DiscoveryError::InvalidConfig(_))
        ));

        let (pair, obs) = observations();
        let config = OptimizerConfig {
            method: SearchMethod::Grid { steps: 70_000 },
            ..Default::default()
        };
        assert!(matches!(
            optimize_pair(&pair, &obs, &StrategyConfig::default(), &config),
            Err(DiscoveryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_exit_above_entry_is_skipped() {
        let (pair, obs) = observations();
        let config = OptimizerConfig {
            space: SearchSpace {
                entry_z: (1.0, 1.0),
                exit_z: (1.0, 1.0),
                ..Default::default()
            },
            method: SearchMethod::Random {
                trials: 5,
                seed: 1,
            },
            ..Default::default()
        };
        match optimize_pair(&pair, &obs, &StrategyConfig::default(), &config) {
            Err(DiscoveryError::NoValidTrials { trials }) => assert_eq!(trials, 5),
            other => panic!("expected NoValidTrials, got {:?}", other.map(|r| r.best)),
        }
    }

    #[test]
    fn test_min_trades_can_exclude_everything() {
        let (pair, obs) = observations();
        let config = OptimizerConfig {
            method: SearchMethod::Random {
                trials: 5,
                seed: 3,
            },
            min_trades: 100_000,
            ..Default::default()
        };
        assert!(matches!(
            optimize_pair(&pair, &obs, &StrategyConfig::default(), &config),
            Err(DiscoveryError::NoValidTrials { .. })
        ));
    }

    #[test]
    fn test_optimize_with_validation_split() {
        let (pair, obs) = observations();
        let config = OptimizerConfig {
            method: SearchMethod::Random {
                trials: 12,
                seed: 42,
            },
            train_ratio: 0.7,
            ..Default::default()
        };
        let result = optimize_pair(&pair, &obs, &StrategyConfig::default(), &config).unwrap();
        assert!(result.best.exit_z < result.best.entry_z);
        assert!(result.validation_sharpe.is_some());
        assert_eq!(result.trials_evaluated + result.trials_skipped, 12);

        // The reported Sharpe is reproducible from the chosen parameters
        let split = (obs.len() as f64 * 0.7).round() as usize;
        let report = evaluate(
            &pair,
            &obs[..split],
            &result.best.apply(&StrategyConfig::default()),
        )
        .unwrap();
        assert_eq!(report.summary.sharpe, result.train_sharpe);
    }

    #[test]
    fn test_parameter_set_apply_keeps_base() {
        let base = StrategyConfig {
            warmup_updates: 17,
            ..Default::default()
        };
        let params = ParameterSet {
            process_noise: 1e-5,
            observation_noise: 1e-2,
            entry_z: 2.5,
            exit_z: 0.3,
        };
        let applied = params.apply(&base);
        assert_eq!(applied.warmup_updates, 17);
        assert_eq!(applied.kalman.process_noise, 1e-5);
        assert_eq!(applied.signal.exit_z, 0.3);
        assert_eq!(applied.signal.zscore, base.signal.zscore);
    }
}
