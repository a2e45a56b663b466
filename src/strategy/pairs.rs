//! Sequential pair trader.
//!
//! One `PairTrader` owns the filter belief and position for a single pair and
//! advances them one observation at a time:
//!
//! ```text
//! observation -> validate -> predict/update belief -> normalize spread
//!             -> policy decision -> new position
//! ```

use super::config::{ConfigError, StrategyConfig, ZScoreMode};
use super::policy::{SignalPolicy, ThresholdPolicy};
use super::validators::{CompositeValidator, ObservationValidator};
use super::{Position, Signal};
use crate::logging::recorder::{SignalRecord, SignalRecorder};
use crate::logging::throttle::RejectThrottle;
use crate::math::stats::RollingZScore;
use crate::math::{HedgeEstimate, KalmanHedgeRatio};
use crate::types::{AssetPair, Observation, OrderSide};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// Decimal places kept on leg unit sizes
const UNIT_DECIMALS: u32 = 6;

/// Minimum seconds between rejected-observation warnings
const REJECT_LOG_INTERVAL_SECS: u64 = 5;

/// Errors from a single trader step. The belief and position are unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum TraderError {
    #[error("Invalid observation: {0}")]
    InvalidObservation(String),

    #[error("Filter rejected observation at {timestamp}")]
    FilterRejected { timestamp: DateTime<Utc> },
}

/// One leg of an entry order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub units: Decimal,
}

/// Units and sides for both legs of an entry.
///
/// The position is one unit of `y` against `beta` units of `x`, scaled so the
/// gross value `units_y * y + |beta| * units_y * x` equals the notional.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegAllocation {
    pub leg_y: LegOrder,
    pub leg_x: LegOrder,
}

impl LegAllocation {
    /// Sizing for an entry signal. `None` for non-entry signals or when the
    /// sizes cannot be represented.
    pub fn for_entry(
        pair: &AssetPair,
        signal: Signal,
        hedge_ratio: f64,
        obs: &Observation,
        notional: Decimal,
    ) -> Option<Self> {
        let direction = match signal {
            Signal::EnterLongSpread => 1.0,
            Signal::EnterShortSpread => -1.0,
            _ => return None,
        };

        let gross_per_unit = obs.y + hedge_ratio.abs() * obs.x;
        if !(gross_per_unit.is_finite() && gross_per_unit > 0.0) {
            return None;
        }
        let units_y = notional.to_f64()? / gross_per_unit;
        let units_x = hedge_ratio.abs() * units_y;

        let y_side = if direction > 0.0 {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };
        // x carries -beta per unit of y in a long spread
        let x_side = if direction * hedge_ratio >= 0.0 {
            OrderSide::Sell
        } else {
            OrderSide::Buy
        };

        Some(Self {
            leg_y: LegOrder {
                symbol: pair.leg_y.clone(),
                side: y_side,
                units: to_units(units_y)?,
            },
            leg_x: LegOrder {
                symbol: pair.leg_x.clone(),
                side: x_side,
                units: to_units(units_x)?,
            },
        })
    }
}

fn to_units(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value).map(|d| d.round_dp(UNIT_DECIMALS))
}

/// Output of one trader step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub timestamp: DateTime<Utc>,
    pub signal: Signal,
    pub previous_position: Position,
    pub position: Position,
    pub estimate: HedgeEstimate,
    /// Normalized spread, `None` while undefined
    pub zscore: Option<f64>,
    /// Present on entry signals
    pub allocation: Option<LegAllocation>,
}

/// Counters from a streaming run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub processed: u64,
    pub rejected: u64,
    pub signals: u64,
    pub record_failures: u64,
    pub final_position: Position,
}

#[derive(Debug, Clone)]
enum SpreadNormalizer {
    Rolling(RollingZScore),
    Innovation,
}

impl SpreadNormalizer {
    fn new(mode: ZScoreMode) -> Self {
        match mode {
            ZScoreMode::Rolling { window } => SpreadNormalizer::Rolling(RollingZScore::new(window)),
            ZScoreMode::Innovation => SpreadNormalizer::Innovation,
        }
    }

    fn normalize(&mut self, estimate: &HedgeEstimate) -> Option<f64> {
        match self {
            SpreadNormalizer::Rolling(z) => z.push(estimate.spread),
            SpreadNormalizer::Innovation => estimate.standardized_innovation(),
        }
    }
}

/// Stateful trader for one pair
pub struct PairTrader {
    pair: AssetPair,
    filter: KalmanHedgeRatio,
    normalizer: SpreadNormalizer,
    policy: Box<dyn SignalPolicy>,
    validator: CompositeValidator,
    position: Position,
    last_timestamp: Option<DateTime<Utc>>,
    warmup_updates: u64,
    notional: Decimal,
}

impl PairTrader {
    /// Build a trader with the threshold policy from `config`.
    pub fn new(pair: AssetPair, config: &StrategyConfig) -> Result<Self, ConfigError> {
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(Self {
            pair,
            filter: KalmanHedgeRatio::new(config.kalman.clone()),
            normalizer: SpreadNormalizer::new(config.signal.zscore),
            policy: Box::new(ThresholdPolicy::from_config(&config.signal)),
            validator: CompositeValidator::standard(),
            position: Position::Flat,
            last_timestamp: None,
            warmup_updates: config.warmup_updates,
            notional: config.notional,
        })
    }

    /// Replace the decision policy
    #[must_use]
    pub fn with_policy(mut self, policy: Box<dyn SignalPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn pair(&self) -> &AssetPair {
        &self.pair
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn filter(&self) -> &KalmanHedgeRatio {
        &self.filter
    }

    /// Advance by one observation.
    ///
    /// # Errors
    /// A rejected observation leaves belief, normalizer and position untouched.
    pub fn step(&mut self, obs: &Observation) -> Result<Decision, TraderError> {
        self.validator
            .validate(obs, self.last_timestamp)
            .map_err(TraderError::InvalidObservation)?;

        let estimate = self
            .filter
            .step(obs.x, obs.y)
            .ok_or(TraderError::FilterRejected {
                timestamp: obs.timestamp,
            })?;
        self.last_timestamp = Some(obs.timestamp);

        let zscore = self.normalizer.normalize(&estimate);
        let entries_allowed = self.filter.is_warmed_up(self.warmup_updates);
        let signal = self.policy.decide(zscore, self.position, entries_allowed);

        let previous_position = self.position;
        self.position = previous_position.apply(signal);

        let allocation = if signal.is_entry() {
            let allocation = LegAllocation::for_entry(
                &self.pair,
                signal,
                estimate.hedge_ratio,
                obs,
                self.notional,
            );
            if allocation.is_none() {
                warn!(pair = %self.pair, beta = estimate.hedge_ratio, "Leg sizing unavailable");
            }
            allocation
        } else {
            None
        };

        if signal != Signal::Hold {
            debug!(
                pair = %self.pair,
                signal = %signal,
                beta = format!("{:.4}", estimate.hedge_ratio),
                spread = format!("{:.4}", estimate.spread),
                z = zscore.map(|z| format!("{:.3}", z)).unwrap_or_default(),
                "Signal emitted"
            );
        }

        Ok(Decision {
            timestamp: obs.timestamp,
            signal,
            previous_position,
            position: self.position,
            estimate,
            zscore,
            allocation,
        })
    }

    /// Consume observations from a channel until it closes, recording every
    /// non-Hold decision.
    #[instrument(skip_all, fields(pair = %self.pair))]
    pub async fn run(
        &mut self,
        mut rx: mpsc::Receiver<Observation>,
        recorder: Arc<dyn SignalRecorder>,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut reject_throttle = RejectThrottle::new(Duration::from_secs(REJECT_LOG_INTERVAL_SECS));

        while let Some(obs) = rx.recv().await {
            match self.step(&obs) {
                Ok(decision) => {
                    summary.processed += 1;
                    if decision.signal == Signal::Hold {
                        continue;
                    }
                    summary.signals += 1;
                    let record = SignalRecord::from_decision(&self.pair, &decision);
                    if let Err(e) = recorder.record(&record).await {
                        summary.record_failures += 1;
                        error!(error = %e, "Failed to record signal");
                    }
                }
                Err(e) => {
                    summary.rejected += 1;
                    if let Some(held_back) = reject_throttle.admit() {
                        warn!(error = %e, held_back, "Observation rejected");
                    }
                }
            }
        }

        if reject_throttle.pending() > 0 {
            warn!(
                held_back = reject_throttle.pending(),
                total = reject_throttle.seen(),
                "Rejections not reported individually"
            );
        }

        if let Err(e) = recorder.flush().await {
            error!(error = %e, "Failed to flush signal recorder");
        }

        summary.final_position = self.position;
        info!(
            processed = summary.processed,
            rejected = summary.rejected,
            signals = summary.signals,
            final_position = %summary.final_position,
            "Replay complete"
        );
        summary
    }
}
