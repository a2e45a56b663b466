//! Strategy evaluation over a historical series.
//!
//! Drives a `PairTrader` across every observation and measures the PnL of a
//! unit spread position. A position decided at step t only earns from t
//! onward:
//!
//! ```text
//! pnl[t] = pos[t-1] * (spread[t] - spread[t-1]) - cost * |pos[t] - pos[t-1]|
//! ```
//!
//! Step 0 has no previous spread, so the Sharpe ratio is taken over
//! `pnl[1..]`, one value per spread change. Its cost still counts in the
//! cumulative PnL.
//!
//! This is the objective for parameter search, not a capital-accounting
//! backtester.

use crate::math::stats::{max_drawdown, sharpe_ratio};
use crate::strategy::{
    ConfigError, PairTrader, Position, Signal, SignalPolicy, StrategyConfig,
};
use crate::types::{AssetPair, Observation};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

/// Per-step state of the evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub timestamp: DateTime<Utc>,
    pub intercept: f64,
    pub beta: f64,
    pub spread: f64,
    pub zscore: Option<f64>,
    pub signal: Signal,
    pub position: Position,
    pub pnl: f64,
    pub cumulative: f64,
}

/// A completed round trip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    /// Step index of the entry decision
    pub entry_index: usize,
    /// Step index of the exit decision
    pub exit_index: usize,
    pub direction: Position,
    /// Includes entry and exit costs
    pub pnl: f64,
}

/// Headline numbers, written as `results.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub pair: String,
    pub observations: usize,
    pub rejected: usize,
    pub trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub final_beta: f64,
    pub final_position: Position,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub summary: EvaluationSummary,
    pub steps: Vec<StepRecord>,
    pub trades: Vec<Trade>,
    /// `(intercept, beta)` per update, empty unless the filter records history
    pub filter_history: Vec<(f64, f64)>,
}

impl EvaluationReport {
    pub fn pnl_series(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.pnl).collect()
    }

    pub fn sharpe(&self) -> f64 {
        self.summary.sharpe
    }
}

/// Run the strategy over `observations` in order.
///
/// Rejected observations are skipped and counted. They do not appear in the
/// step series.
///
/// # Errors
/// Returns `ConfigError::Invalid` if the configuration fails validation.
#[instrument(skip_all, fields(pair = %pair, n = observations.len()))]
pub fn evaluate(
    pair: &AssetPair,
    observations: &[Observation],
    config: &StrategyConfig,
) -> Result<EvaluationReport, ConfigError> {
    let trader = PairTrader::new(pair.clone(), config)?;
    Ok(run_evaluation(trader, pair, observations, config))
}

/// Same as [`evaluate`] with a custom decision policy.
pub fn evaluate_with_policy(
    pair: &AssetPair,
    observations: &[Observation],
    config: &StrategyConfig,
    policy: Box<dyn SignalPolicy>,
) -> Result<EvaluationReport, ConfigError> {
    let trader = PairTrader::new(pair.clone(), config)?.with_policy(policy);
    Ok(run_evaluation(trader, pair, observations, config))
}

fn run_evaluation(
    mut trader: PairTrader,
    pair: &AssetPair,
    observations: &[Observation],
    config: &StrategyConfig,
) -> EvaluationReport {
    let cost = config.evaluation.cost_per_unit;

    let mut steps: Vec<StepRecord> = Vec::with_capacity(observations.len());
    let mut trades = Vec::new();
    let mut open: Option<Trade> = None;
    let mut rejected = 0usize;
    let mut cumulative = 0.0;

    for obs in observations {
        let decision = match trader.step(obs) {
            Ok(d) => d,
            Err(e) => {
                rejected += 1;
                debug!(error = %e, "Skipping observation");
                continue;
            }
        };

        let index = steps.len();
        let prev_position = decision.previous_position.as_f64();
        let position = decision.position.as_f64();
        let carry = steps
            .last()
            .map(|prev| prev_position * (decision.estimate.spread - prev.spread))
            .unwrap_or(0.0);
        let pnl = carry - cost * (position - prev_position).abs();
        cumulative += pnl;

        if let Some(trade) = open.as_mut() {
            trade.pnl += pnl;
        }
        match (decision.previous_position, decision.position) {
            (Position::Flat, Position::LongSpread | Position::ShortSpread) => {
                open = Some(Trade {
                    entry_index: index,
                    exit_index: index,
                    direction: decision.position,
                    pnl,
                });
            }
            (Position::LongSpread | Position::ShortSpread, Position::Flat) => {
                if let Some(mut trade) = open.take() {
                    trade.exit_index = index;
                    trades.push(trade);
                }
            }
            _ => {}
        }

        steps.push(StepRecord {
            timestamp: decision.timestamp,
            intercept: decision.estimate.intercept,
            beta: decision.estimate.hedge_ratio,
            spread: decision.estimate.spread,
            zscore: decision.zscore,
            signal: decision.signal,
            position: decision.position,
            pnl,
            cumulative,
        });
    }

    let pnl: Vec<f64> = steps.iter().map(|s| s.pnl).collect();
    let returns: &[f64] = pnl.get(1..).unwrap_or_default();
    let cumulative_series: Vec<f64> = steps.iter().map(|s| s.cumulative).collect();
    let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
    let win_rate = if trades.is_empty() {
        0.0
    } else {
        wins as f64 / trades.len() as f64
    };

    let summary = EvaluationSummary {
        pair: pair.to_string(),
        observations: steps.len(),
        rejected,
        trades: trades.len(),
        win_rate,
        total_pnl: cumulative,
        sharpe: sharpe_ratio(returns, config.evaluation.periods_per_year),
        max_drawdown: max_drawdown(&cumulative_series),
        final_beta: trader.filter().get_beta(),
        final_position: trader.position(),
    };

    debug!(
        trades = summary.trades,
        total_pnl = format!("{:.4}", summary.total_pnl),
        sharpe = format!("{:.3}", summary.sharpe),
        rejected = summary.rejected,
        "Evaluation complete"
    );

    EvaluationReport {
        summary,
        steps,
        trades,
        filter_history: trader.filter().history().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{synthetic_panel, SyntheticConfig};
    use crate::strategy::{SignalConfig, ZScoreMode};
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn observations(ys: &[f64]) -> Vec<Observation> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ys.iter()
            .enumerate()
            .map(|(i, y)| Observation::new(start + Duration::days(i as i64), 10.0, *y))
            .collect()
    }

    #[test]
    fn test_flat_strategy_has_zero_sharpe() {
        // Thresholds never reached
        let config = StrategyConfig {
            signal: SignalConfig {
                entry_z: 1e9,
                exit_z: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };
        let panel = synthetic_panel(&SyntheticConfig::default());
        let obs = panel.observations(&AssetPair::new("AAA", "BBB")).unwrap();
        let report = evaluate(&AssetPair::new("AAA", "BBB"), &obs, &config).unwrap();
        assert_eq!(report.summary.trades, 0);
        assert_eq!(report.summary.total_pnl, 0.0);
        assert_eq!(report.sharpe(), 0.0);
        assert!(report.steps.iter().all(|s| s.position == Position::Flat));
    }

    /// Enters long on the first step, holds forever.
    struct AlwaysLong;

    impl SignalPolicy for AlwaysLong {
        fn decide(&self, _z: Option<f64>, position: Position, _entries: bool) -> Signal {
            match position {
                Position::Flat => Signal::EnterLongSpread,
                _ => Signal::Hold,
            }
        }
    }

    #[test]
    fn test_pnl_has_no_look_ahead() {
        let obs = observations(&[20.0, 25.0, 22.0, 30.0]);
        let pair = AssetPair::new("X", "Y");
        let config = StrategyConfig {
            evaluation: crate::strategy::EvaluationConfig {
                cost_per_unit: 0.1,
                ..Default::default()
            },
            ..Default::default()
        };

        // Spreads as the filter sees them, from an independent trader
        let mut trader = PairTrader::new(pair.clone(), &config).unwrap();
        let spreads: Vec<f64> = obs
            .iter()
            .map(|o| trader.step(o).unwrap().estimate.spread)
            .collect();

        let report = evaluate_with_policy(&pair, &obs, &config, Box::new(AlwaysLong)).unwrap();
        let pnl = report.pnl_series();

        // Entry step pays the cost and earns nothing
        assert!((pnl[0] + 0.1).abs() < 1e-12);
        for t in 1..spreads.len() {
            assert!((pnl[t] - (spreads[t] - spreads[t - 1])).abs() < 1e-9);
        }
        assert_eq!(report.summary.final_position, Position::LongSpread);
        assert_eq!(report.summary.trades, 0);
    }

    /// Plays back a fixed signal per accepted step.
    struct Scripted {
        script: Vec<Signal>,
        cursor: AtomicUsize,
    }

    impl Scripted {
        fn new(script: Vec<Signal>) -> Self {
            Self {
                script,
                cursor: AtomicUsize::new(0),
            }
        }
    }

    impl SignalPolicy for Scripted {
        fn decide(&self, _z: Option<f64>, _position: Position, _entries: bool) -> Signal {
            let i = self.cursor.fetch_add(1, Ordering::SeqCst);
            self.script.get(i).copied().unwrap_or(Signal::Hold)
        }
    }

    #[test]
    fn test_round_trips_are_booked() {
        let obs = observations(&[20.0, 21.0, 23.0, 26.0, 26.5, 29.0, 28.0]);
        let pair = AssetPair::new("X", "Y");
        let cost = 0.01;
        let config = StrategyConfig {
            evaluation: crate::strategy::EvaluationConfig {
                cost_per_unit: cost,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut trader = PairTrader::new(pair.clone(), &config).unwrap();
        let s: Vec<f64> = obs
            .iter()
            .map(|o| trader.step(o).unwrap().estimate.spread)
            .collect();

        let script = vec![
            Signal::Hold,
            Signal::EnterLongSpread,
            Signal::Hold,
            Signal::Exit,
            Signal::EnterShortSpread,
            Signal::Exit,
            Signal::Hold,
        ];
        let report =
            evaluate_with_policy(&pair, &obs, &config, Box::new(Scripted::new(script))).unwrap();

        assert_eq!(report.summary.trades, 2);
        let long = &report.trades[0];
        let short = &report.trades[1];
        assert_eq!((long.entry_index, long.exit_index), (1, 3));
        assert_eq!(long.direction, Position::LongSpread);
        assert_eq!((short.entry_index, short.exit_index), (4, 5));
        assert_eq!(short.direction, Position::ShortSpread);

        // Each trade owns the step PnL from entry through exit
        let pnl = report.pnl_series();
        for trade in &report.trades {
            let owned: f64 = pnl[trade.entry_index..=trade.exit_index].iter().sum();
            assert!((trade.pnl - owned).abs() < 1e-12);
        }

        // Entry and exit each pay one unit of cost
        assert!((long.pnl - (s[3] - s[1] - 2.0 * cost)).abs() < 1e-9);
        assert!((short.pnl - (-(s[5] - s[4]) - 2.0 * cost)).abs() < 1e-9);
        assert!(long.pnl > 0.0, "long spread rose, got {}", long.pnl);
        assert!(short.pnl < 0.0, "short spread rose, got {}", short.pnl);
        assert_eq!(report.summary.win_rate, 0.5);

        assert_eq!(report.summary.final_position, Position::Flat);
        assert_eq!(pnl[6], 0.0);
        assert!((report.summary.total_pnl - (long.pnl + short.pnl)).abs() < 1e-12);
    }

    #[test]
    fn test_sharpe_skips_first_step() {
        let obs = observations(&[20.0, 25.0, 22.0, 30.0, 27.0]);
        let pair = AssetPair::new("X", "Y");
        let config = StrategyConfig {
            evaluation: crate::strategy::EvaluationConfig {
                cost_per_unit: 0.1,
                ..Default::default()
            },
            ..Default::default()
        };
        let report = evaluate_with_policy(&pair, &obs, &config, Box::new(AlwaysLong)).unwrap();
        let pnl = report.pnl_series();
        let expected = sharpe_ratio(&pnl[1..], config.evaluation.periods_per_year);
        assert_eq!(report.summary.sharpe, expected);
        assert_ne!(report.summary.sharpe, sharpe_ratio(&pnl, 252.0));
    }

    #[test]
    fn test_trades_on_cointegrated_pair() {
        let pair = AssetPair::new("AAA", "BBB");
        let panel = synthetic_panel(&SyntheticConfig::default());
        let obs = panel.observations(&pair).unwrap();
        let config = StrategyConfig {
            signal: SignalConfig {
                entry_z: 1.5,
                exit_z: 0.25,
                zscore: ZScoreMode::Rolling { window: 30 },
            },
            ..Default::default()
        };
        let report = evaluate(&pair, &obs, &config).unwrap();

        assert_eq!(report.steps.len(), obs.len());
        assert!(report.summary.trades > 0);
        assert!((0.0..=1.0).contains(&report.summary.win_rate));
        assert!(report.summary.max_drawdown >= 0.0);
        let last = report.steps.last().unwrap();
        assert!((last.cumulative - report.summary.total_pnl).abs() < 1e-9);
        let summed: f64 = report.pnl_series().iter().sum();
        assert!((summed - report.summary.total_pnl).abs() < 1e-6);
        for t in &report.trades {
            assert!(t.exit_index > t.entry_index);
            assert_ne!(t.direction, Position::Flat);
        }
    }

    #[test]
    fn test_rejected_observations_are_counted() {
        let mut obs = observations(&[20.0, 21.0, 22.0]);
        obs[1].y = f64::NAN;
        let report = evaluate(&AssetPair::new("X", "Y"), &obs, &StrategyConfig::default()).unwrap();
        assert_eq!(report.summary.rejected, 1);
        assert_eq!(report.steps.len(), 2);
    }
}
