//! Kalman Filter for dynamic hedge ratio estimation.
//!
//! Implements a two-state Kalman Filter that tracks the intercept (α) and
//! hedge ratio (β) between two assets in a pairs trading strategy. This
//! allows the strategy to adapt to changing cointegration relationships
//! observation by observation.
//!
//! # Mathematical Model
//!
//! **State equation** (random walk):
//! ```text
//! θ[t] = θ[t-1] + w,  where θ = [α, β]ᵀ and w ~ N(0, Q), Q = q·I
//! ```
//!
//! **Observation equation**:
//! ```text
//! y[t] = α[t] + β[t] * x[t] + v,  where v ~ N(0, R)
//! ```
//!
//! Where:
//! - `y[t]` is the dependent asset price
//! - `x[t]` is the regressor asset price, `H[t] = [1, x[t]]`
//! - `q` is process noise (how fast α and β drift)
//! - `R` is observation noise (measurement uncertainty)
//!
//! The covariance is updated in Joseph form and re-symmetrized after every
//! step so that it stays positive semi-definite under rounding.
//!
//! # Usage
//!
//! ```rust
//! use statarb::math::{KalmanConfig, KalmanHedgeRatio};
//!
//! let mut kalman = KalmanHedgeRatio::new(KalmanConfig::default());
//!
//! // Update with each new price pair
//! if let Some(estimate) = kalman.step(100.0, 98.5) {
//!     println!("beta={} spread={}", estimate.hedge_ratio, estimate.spread);
//! }
//! ```
//!
//! # References
//!
//! - Chan, E. (2013). "Algorithmic Trading: Winning Strategies and Their Rationale"

use nalgebra::{Matrix2, RowVector2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Smallest admissible innovation variance. Below this the gain blows up.
const MIN_INNOVATION_VARIANCE: f64 = 1e-12;

/// Filter noise and prior settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KalmanConfig {
    /// Process noise `q` (diagonal of Q)
    #[serde(default = "default_noise")]
    pub process_noise: f64,
    /// Observation noise `R`
    #[serde(default = "default_noise")]
    pub observation_noise: f64,
    /// Prior intercept
    #[serde(default)]
    pub initial_intercept: f64,
    /// Prior hedge ratio
    #[serde(default = "default_initial_beta")]
    pub initial_beta: f64,
    /// Prior variance on both states (P₀ = p₀·I)
    #[serde(default = "default_initial_covariance")]
    pub initial_covariance: f64,
    /// Keep the (α, β) path for export
    #[serde(default)]
    pub record_history: bool,
}

fn default_noise() -> f64 {
    1e-3
}
fn default_initial_beta() -> f64 {
    1.0
}
fn default_initial_covariance() -> f64 {
    100.0
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            process_noise: default_noise(),
            observation_noise: default_noise(),
            initial_intercept: 0.0,
            initial_beta: default_initial_beta(),
            initial_covariance: default_initial_covariance(),
            record_history: false,
        }
    }
}

impl KalmanConfig {
    /// Shortcut for the two tuned parameters.
    pub fn with_noise(process_noise: f64, observation_noise: f64) -> Self {
        Self {
            process_noise,
            observation_noise,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.process_noise.is_finite() && self.process_noise >= 0.0) {
            return Err(format!(
                "process_noise must be finite and non-negative, got {}",
                self.process_noise
            ));
        }
        if !(self.observation_noise.is_finite() && self.observation_noise > 0.0) {
            return Err(format!(
                "observation_noise must be finite and positive, got {}",
                self.observation_noise
            ));
        }
        if !(self.initial_covariance.is_finite() && self.initial_covariance > 0.0) {
            return Err(format!(
                "initial_covariance must be finite and positive, got {}",
                self.initial_covariance
            ));
        }
        if !self.initial_intercept.is_finite() || !self.initial_beta.is_finite() {
            return Err("initial state must be finite".to_string());
        }
        Ok(())
    }
}

/// Output of one belief update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HedgeEstimate {
    /// Posterior intercept α
    pub intercept: f64,
    /// Posterior hedge ratio β
    pub hedge_ratio: f64,
    /// `y - β·x` with the posterior β (intercept excluded)
    pub spread: f64,
    /// Pre-update prediction error `y - H·θ⁻`
    pub innovation: f64,
    /// Innovation variance `S = H·P⁻·Hᵀ + R`
    pub innovation_variance: f64,
}

impl HedgeEstimate {
    /// Innovation scaled by its own predicted standard deviation.
    pub fn standardized_innovation(&self) -> Option<f64> {
        let z = self.innovation / self.innovation_variance.sqrt();
        z.is_finite().then_some(z)
    }

    /// Posterior residual `y - α - β·x`.
    pub fn residual(&self) -> f64 {
        self.spread - self.intercept
    }
}

/// Kalman Filter for estimating dynamic intercept and hedge ratio.
///
/// # Performance
///
/// - O(1) per update, 2x2 fixed-size matrices on the stack
/// - History is only kept when `record_history` is set
#[derive(Debug, Clone)]
pub struct KalmanHedgeRatio {
    config: KalmanConfig,
    /// Mean of the belief [α, β]
    state: Vector2<f64>,
    /// Belief covariance P
    covariance: Matrix2<f64>,
    /// Process noise Q = q·I
    process_noise: Matrix2<f64>,
    /// Observation noise R
    obs_noise: f64,
    update_count: u64,
    history: Vec<(f64, f64)>,
}

impl KalmanHedgeRatio {
    /// Create a filter at its prior. Call `KalmanConfig::validate` first;
    /// an invalid config still constructs but may reject every update.
    pub fn new(config: KalmanConfig) -> Self {
        let mut filter = Self {
            state: Vector2::zeros(),
            covariance: Matrix2::zeros(),
            process_noise: Matrix2::identity() * config.process_noise,
            obs_noise: config.observation_noise,
            update_count: 0,
            history: Vec::new(),
            config,
        };
        filter.reset();
        filter
    }

    /// Defaults used for daily equity pairs (`q = r = 1e-3`, `P₀ = 100·I`).
    pub fn default_for_pairs() -> Self {
        Self::new(KalmanConfig::default())
    }

    /// Time update: `θ⁻ = θ`, `P⁻ = P + Q`.
    pub fn predict(&mut self) {
        self.covariance += self.process_noise;
        symmetrize(&mut self.covariance);
    }

    /// Measurement update with a new price pair.
    ///
    /// Returns `None` and leaves the belief untouched when the inputs are not
    /// finite or the innovation variance degenerates.
    pub fn update(&mut self, x: f64, y: f64) -> Option<HedgeEstimate> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }

        let h = RowVector2::new(1.0, x);
        let innovation = y - (h * self.state)[(0, 0)];
        let s = (h * self.covariance * h.transpose())[(0, 0)] + self.obs_noise;
        if !s.is_finite() || s < MIN_INNOVATION_VARIANCE {
            return None;
        }

        // K = P⁻·Hᵀ / S
        let gain: Vector2<f64> = self.covariance * h.transpose() / s;
        let state = self.state + gain * innovation;

        // Joseph form: (I - K·H)·P⁻·(I - K·H)ᵀ + K·R·Kᵀ
        let i_kh = Matrix2::identity() - gain * h;
        let mut covariance = i_kh * self.covariance * i_kh.transpose()
            + gain * gain.transpose() * self.obs_noise;
        symmetrize(&mut covariance);
        // Floor the diagonal against f64 cancellation
        covariance[(0, 0)] = covariance[(0, 0)].max(MIN_INNOVATION_VARIANCE);
        covariance[(1, 1)] = covariance[(1, 1)].max(MIN_INNOVATION_VARIANCE);

        if !state.iter().all(|v| v.is_finite()) || !covariance.iter().all(|v| v.is_finite()) {
            return None;
        }

        self.state = state;
        self.covariance = covariance;
        self.update_count += 1;
        if self.config.record_history {
            self.history.push((state[0], state[1]));
        }

        trace!(
            alpha = state[0],
            beta = state[1],
            innovation,
            s,
            "Kalman update"
        );

        Some(HedgeEstimate {
            intercept: state[0],
            hedge_ratio: state[1],
            spread: y - state[1] * x,
            innovation,
            innovation_variance: s,
        })
    }

    /// Predict then update. On rejection the predicted covariance is rolled
    /// back so the belief is exactly as before the call.
    pub fn step(&mut self, x: f64, y: f64) -> Option<HedgeEstimate> {
        let before = self.covariance;
        self.predict();
        let estimate = self.update(x, y);
        if estimate.is_none() {
            self.covariance = before;
        }
        estimate
    }

    #[inline]
    pub fn get_beta(&self) -> f64 {
        self.state[1]
    }

    #[inline]
    pub fn get_intercept(&self) -> f64 {
        self.state[0]
    }

    /// Belief covariance over [α, β].
    #[inline]
    pub fn get_covariance(&self) -> Matrix2<f64> {
        self.covariance
    }

    #[inline]
    pub fn get_update_count(&self) -> u64 {
        self.update_count
    }

    pub fn config(&self) -> &KalmanConfig {
        &self.config
    }

    /// Returns `true` after at least `min_updates` accepted observations.
    pub fn is_warmed_up(&self, min_updates: u64) -> bool {
        self.update_count >= min_updates
    }

    /// Recorded (α, β) path, empty unless `record_history` is set.
    pub fn history(&self) -> &[(f64, f64)] {
        &self.history
    }

    /// Return to the prior, dropping history.
    pub fn reset(&mut self) {
        self.state = Vector2::new(self.config.initial_intercept, self.config.initial_beta);
        self.covariance = Matrix2::identity() * self.config.initial_covariance;
        self.update_count = 0;
        self.history.clear();
    }
}

fn symmetrize(m: &mut Matrix2<f64>) {
    let off = 0.5 * (m[(0, 1)] + m[(1, 0)]);
    m[(0, 1)] = off;
    m[(1, 0)] = off;
}

/// True when `m` is symmetric PSD within `tol`.
pub fn is_psd(m: &Matrix2<f64>, tol: f64) -> bool {
    let symmetric = (m[(0, 1)] - m[(1, 0)]).abs() <= tol;
    let det = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)];
    let scale = m[(0, 0)].abs().max(m[(1, 1)].abs()).max(1.0);
    symmetric && m[(0, 0)] >= -tol && m[(1, 1)] >= -tol && det >= -tol * scale * scale
}
