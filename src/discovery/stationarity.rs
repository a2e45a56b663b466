//! Augmented Dickey-Fuller unit-root test with MacKinnon p-values.
//!
//! # Regression
//! ```text
//! Δy[t] = [c] + γ·y[t-1] + Σ δᵢ·Δy[t-i] + ε
//! ```
//! H0: γ = 0 (unit root). The statistic is the t-ratio of γ. Lag order is
//! chosen by AIC over a common sample, then the chosen model is refit on all
//! rows it can use.

use crate::math::stats::ols;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

/// Below this many observations the test is not attempted
pub const MIN_ADF_OBSERVATIONS: usize = 20;

/// Deterministic terms in the test regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regression {
    /// No constant (used on cointegration residuals)
    NoConstant,
    /// Constant only
    Constant,
}

impl Regression {
    fn trend_terms(self) -> usize {
        match self {
            Regression::NoConstant => 0,
            Regression::Constant => 1,
        }
    }
}

/// Critical values of the test statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    /// t-ratio of the lagged level (more negative = more stationary)
    pub statistic: f64,
    pub p_value: f64,
    /// Number of lagged differences in the final regression
    pub used_lag: usize,
    /// Rows in the final regression
    pub nobs: usize,
    pub critical_values: Option<CriticalValues>,
    pub regression: Regression,
}

impl AdfResult {
    /// Unit root rejected at `significance`.
    pub fn is_stationary(&self, significance: f64) -> bool {
        self.p_value < significance
    }
}

// MacKinnon (1994) response-surface coefficients, indexed by number of
// series N - 1. Small-p polynomials are quadratic, large-p cubic.
const TAU_STAR_C: [f64; 3] = [-1.61, -2.62, -3.13];
const TAU_MIN_C: [f64; 3] = [-18.83, -18.86, -23.48];
const TAU_MAX_C: [f64; 3] = [2.74, 0.92, 0.55];
const TAU_SMALLP_C: [[f64; 3]; 3] = [
    [2.1659, 1.4412, 0.038269],
    [2.92, 1.5012, 0.039796],
    [3.4699, 1.4856, 0.03164],
];
const TAU_LARGEP_C: [[f64; 4]; 3] = [
    [1.7339, 0.93202, -0.12745, -0.010368],
    [2.1945, 0.64695, -0.29198, -0.042377],
    [2.5261, 0.61654, -0.37956, -0.060285],
];

const TAU_STAR_NC: f64 = -1.04;
const TAU_MIN_NC: f64 = -19.04;
const TAU_SMALLP_NC: [f64; 3] = [0.6344, 1.2378, 0.032496];
const TAU_LARGEP_NC: [f64; 4] = [0.4797, 0.93557, -0.06999, 0.033066];

// MacKinnon (2010) finite-sample critical values, rows 1% / 5% / 10%,
// crit = b0 + b1/T + b2/T² + b3/T³.
const CRIT_C_N1: [[f64; 4]; 3] = [
    [-3.43035, -6.5393, -16.786, -79.433],
    [-2.86154, -2.8903, -4.234, -40.040],
    [-2.56677, -1.5384, -2.809, 0.0],
];
const CRIT_C_N2: [[f64; 4]; 3] = [
    [-3.89644, -10.9519, -22.527, 0.0],
    [-3.33613, -6.1101, -6.823, 0.0],
    [-3.04445, -4.2412, -2.720, 0.0],
];
const CRIT_NC_N1: [[f64; 4]; 3] = [
    [-2.56574, -2.2358, -3.627, 0.0],
    [-1.94100, -0.2686, -3.365, 31.223],
    [-1.61682, 0.2656, -2.714, 25.364],
];

fn polyval(coef: &[f64], x: f64) -> f64 {
    coef.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn standard_normal_cdf(x: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(n) => n.cdf(x),
        Err(_) => f64::NAN,
    }
}

/// Approximate asymptotic p-value of a Dickey-Fuller type statistic.
///
/// `n_series` is 1 for a plain unit-root test and 2 for a two-variable
/// Engle-Granger residual test. Returns `None` for unsupported combinations
/// (N > 3 with a constant, N > 1 without one).
pub fn mackinnon_p(stat: f64, regression: Regression, n_series: usize) -> Option<f64> {
    if stat.is_nan() || n_series == 0 {
        return None;
    }
    let idx = n_series - 1;
    let (star, min, max, small, large): (f64, f64, f64, &[f64], &[f64]) = match regression {
        Regression::Constant if idx < 3 => (
            TAU_STAR_C[idx],
            TAU_MIN_C[idx],
            TAU_MAX_C[idx],
            TAU_SMALLP_C[idx].as_slice(),
            TAU_LARGEP_C[idx].as_slice(),
        ),
        Regression::NoConstant if idx == 0 => (
            TAU_STAR_NC,
            TAU_MIN_NC,
            f64::INFINITY,
            TAU_SMALLP_NC.as_slice(),
            TAU_LARGEP_NC.as_slice(),
        ),
        _ => return None,
    };

    if stat > max {
        return Some(1.0);
    }
    if stat < min {
        return Some(0.0);
    }
    let coef = if stat <= star { small } else { large };
    Some(standard_normal_cdf(polyval(coef, stat)))
}

/// Finite-sample critical values for `nobs` rows, where tabulated.
pub fn mackinnon_crit(
    regression: Regression,
    n_series: usize,
    nobs: usize,
) -> Option<CriticalValues> {
    let table = match (regression, n_series) {
        (Regression::Constant, 1) => &CRIT_C_N1,
        (Regression::Constant, 2) => &CRIT_C_N2,
        (Regression::NoConstant, 1) => &CRIT_NC_N1,
        _ => return None,
    };
    let inv = 1.0 / nobs as f64;
    let at = |row: &[f64; 4]| row[0] + row[1] * inv + row[2] * inv.powi(2) + row[3] * inv.powi(3);
    Some(CriticalValues {
        one_pct: at(&table[0]),
        five_pct: at(&table[1]),
        ten_pct: at(&table[2]),
    })
}

/// Largest lag that still leaves enough rows for the regression.
fn lag_cap(n: usize, regression: Regression) -> usize {
    (n / 2).saturating_sub(regression.trend_terms() + 1)
}

/// Default maximum lag: ⌈12·(n/100)^¼⌉, capped by the sample size.
pub fn default_max_lag(n: usize, regression: Regression) -> usize {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    schwert.min(lag_cap(n, regression))
}

/// Test regression rows `start..diffs.len()` with `lags` lagged differences.
///
/// Column 0 (after the optional constant) is the lagged level.
fn design(
    series: &[f64],
    diffs: &[f64],
    lags: usize,
    start: usize,
    regression: Regression,
) -> (DMatrix<f64>, DVector<f64>) {
    let rows = diffs.len() - start;
    let offset = regression.trend_terms();
    let cols = offset + 1 + lags;
    let x = DMatrix::from_fn(rows, cols, |r, c| {
        let t = start + r;
        if c < offset {
            1.0
        } else if c == offset {
            series[t]
        } else {
            diffs[t - (c - offset)]
        }
    });
    let y = DVector::from_iterator(rows, diffs[start..].iter().copied());
    (x, y)
}

/// Run the ADF test.
///
/// `max_lag = None` uses [`default_max_lag`] with AIC selection; `Some(k)`
/// searches lags `0..=k` by AIC. Returns `None` for short or degenerate
/// input.
pub fn adf_test(series: &[f64], regression: Regression, max_lag: Option<usize>) -> Option<AdfResult> {
    let n = series.len();
    if n < MIN_ADF_OBSERVATIONS || series.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    if diffs.iter().all(|d| d.abs() < f64::EPSILON) {
        return None;
    }
    let max_lag = match max_lag {
        Some(k) => k.min(lag_cap(n, regression)),
        None => default_max_lag(n, regression),
    };
    let level_col = regression.trend_terms();

    // AIC search on the common sample that the longest lag allows
    let mut best: Option<(usize, f64)> = None;
    for lags in 0..=max_lag {
        let (x, y) = design(series, &diffs, lags, max_lag, regression);
        let Some(fit) = ols(&x, &y) else {
            continue;
        };
        let aic = fit.aic();
        if !aic.is_finite() {
            continue;
        }
        if best.map_or(true, |(_, b)| aic < b) {
            best = Some((lags, aic));
        }
    }
    let used_lag = best.map(|(l, _)| l)?;

    let (x, y) = design(series, &diffs, used_lag, used_lag, regression);
    let fit = ols(&x, &y)?;
    let statistic = fit.t_stat(level_col)?;
    let p_value = mackinnon_p(statistic, regression, 1)?;

    debug!(
        statistic = format!("{:.3}", statistic),
        p_value = format!("{:.4}", p_value),
        used_lag,
        nobs = fit.nobs,
        "ADF test"
    );

    Some(AdfResult {
        statistic,
        p_value,
        used_lag,
        nobs: fit.nobs,
        critical_values: mackinnon_crit(regression, 1, fit.nobs),
        regression,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal as Gaussian};

    fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Gaussian::new(0.0, 1.0).unwrap();
        let mut out = Vec::with_capacity(n);
        let mut current = 0.0;
        for _ in 0..n {
            current = phi * current + noise.sample(&mut rng);
            out.push(current);
        }
        out
    }

    #[test]
    fn test_mackinnon_five_percent_points() {
        let p1 = mackinnon_p(-2.86, Regression::Constant, 1).unwrap();
        assert!((p1 - 0.05).abs() < 0.005, "N=1 tau=-2.86 should be ~5%, got {}", p1);

        let p2 = mackinnon_p(-3.34, Regression::Constant, 2).unwrap();
        assert!((p2 - 0.05).abs() < 0.005, "N=2 tau=-3.34 should be ~5%, got {}", p2);
    }

    #[test]
    fn test_mackinnon_bounds_and_monotonic() {
        assert_eq!(mackinnon_p(5.0, Regression::Constant, 1), Some(1.0));
        assert_eq!(mackinnon_p(-30.0, Regression::Constant, 1), Some(0.0));
        assert!(mackinnon_p(-2.0, Regression::Constant, 4).is_none());
        assert!(mackinnon_p(-2.0, Regression::NoConstant, 2).is_none());

        let mut last = 0.0;
        for i in 0..60 {
            let t = -6.0 + i as f64 * 0.1;
            let p = mackinnon_p(t, Regression::Constant, 1).unwrap();
            assert!(p >= last - 1e-9, "p-value must not fall as tau rises");
            last = p;
        }
    }

    #[test]
    fn test_critical_values_match_tables() {
        let cv = mackinnon_crit(Regression::Constant, 1, 1_000_000).unwrap();
        assert!((cv.five_pct + 2.8615).abs() < 1e-3);
        assert!(cv.one_pct < cv.five_pct && cv.five_pct < cv.ten_pct);
        assert!(mackinnon_crit(Regression::Constant, 3, 100).is_none());
    }

    #[test]
    fn test_default_max_lag() {
        assert_eq!(default_max_lag(100, Regression::Constant), 12);
        // Capped by n/2 - 2
        assert_eq!(default_max_lag(20, Regression::Constant), 8);
    }

    #[test]
    fn test_adf_insufficient_data() {
        let spread: Vec<f64> = (0..15).map(|x| x as f64).collect();
        assert!(adf_test(&spread, Regression::Constant, None).is_none());
    }

    #[test]
    fn test_adf_constant_series() {
        assert!(adf_test(&[5.0; 50], Regression::Constant, None).is_none());
    }

    #[test]
    fn test_adf_mean_reverting_stationary() {
        let series = ar1(500, 0.5, 7);
        let result = adf_test(&series, Regression::Constant, None).unwrap();
        assert!(
            result.is_stationary(0.01),
            "AR(1) with phi=0.5 should reject the unit root, got {:?}",
            result
        );
        assert!(result.statistic < result.critical_values.unwrap().one_pct);
    }

    #[test]
    fn test_adf_explosive_not_stationary() {
        let mut rng = StdRng::seed_from_u64(11);
        let noise = Gaussian::new(0.0, 1.0).unwrap();
        let mut current = 1.0;
        let series: Vec<f64> = (0..200)
            .map(|_| {
                current = 1.02 * current + noise.sample(&mut rng);
                current
            })
            .collect();
        let result = adf_test(&series, Regression::Constant, None).unwrap();
        assert!(
            !result.is_stationary(0.05),
            "Explosive series must not look stationary, got {:?}",
            result
        );
    }

    #[test]
    fn test_adf_without_constant() {
        let series = ar1(300, 0.3, 3);
        let result = adf_test(&series, Regression::NoConstant, Some(4)).unwrap();
        assert_eq!(result.regression, Regression::NoConstant);
        assert!(result.used_lag <= 4);
        assert!(result.p_value < 0.01);
    }
}
