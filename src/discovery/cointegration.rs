//! Cointegration tests: Engle-Granger, Johansen trace and half-life.

use super::stationarity::{adf_test, mackinnon_crit, mackinnon_p, CriticalValues, Regression};
use crate::math::stats::{linear_fit, ols};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Treat the cointegrating regression as perfect above this R²
const PERFECT_FIT_R2: f64 = 1.0 - 1e-6;

/// Two-step Engle-Granger test of `y0` against `y1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngleGrangerResult {
    /// ADF statistic on the regression residuals
    pub statistic: f64,
    pub p_value: f64,
    pub critical_values: Option<CriticalValues>,
    /// Intercept of `y0 = a + b·y1`
    pub intercept: f64,
    /// Slope of `y0 = a + b·y1`
    pub slope: f64,
    pub used_lag: usize,
}

/// Engle-Granger cointegration test.
///
/// # Algorithm
/// 1. Regress `y0` on `[1, y1]` by OLS
/// 2. ADF on the residuals without a constant, lag chosen by AIC
/// 3. p-value from the two-variable MacKinnon surface
///
/// A perfect fit is reported as statistic `-inf`, p-value 0.
pub fn engle_granger(y0: &[f64], y1: &[f64]) -> Option<EngleGrangerResult> {
    let n = y0.len();
    if n != y1.len() || n < super::stationarity::MIN_ADF_OBSERVATIONS {
        return None;
    }

    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { y1[i] });
    let target = DVector::from_column_slice(y0);
    let fit = ols(&design, &target)?;
    let (intercept, slope) = (fit.coefficients[0], fit.coefficients[1]);

    let mean = target.mean();
    let tss: f64 = target.iter().map(|v| (v - mean).powi(2)).sum();
    let r2 = if tss > 0.0 { 1.0 - fit.ssr / tss } else { 0.0 };
    let critical_values = mackinnon_crit(Regression::Constant, 2, n - 1);

    if r2 > PERFECT_FIT_R2 {
        debug!(r2, "Cointegrating regression is a perfect fit");
        return Some(EngleGrangerResult {
            statistic: f64::NEG_INFINITY,
            p_value: 0.0,
            critical_values,
            intercept,
            slope,
            used_lag: 0,
        });
    }

    let residuals: Vec<f64> = fit.residuals.iter().copied().collect();
    let adf = adf_test(&residuals, Regression::NoConstant, None)?;
    let p_value = mackinnon_p(adf.statistic, Regression::Constant, 2)?;

    Some(EngleGrangerResult {
        statistic: adf.statistic,
        p_value,
        critical_values,
        intercept,
        slope,
        used_lag: adf.used_lag,
    })
}

// Osterwald-Lenum critical values (90%, 95%, 99%) with an unrestricted
// constant, indexed by number of common trends n - r - 1.
const TRACE_CRIT: [[f64; 3]; 5] = [
    [2.7055, 3.8415, 6.6349],
    [13.4294, 15.4943, 19.9349],
    [27.0669, 29.7961, 35.4628],
    [44.4929, 47.8545, 54.6815],
    [65.8202, 69.8189, 77.8202],
];
const MAX_EIG_CRIT: [[f64; 3]; 5] = [
    [2.7055, 3.8415, 6.6349],
    [12.2971, 14.2639, 18.52],
    [18.8928, 21.1314, 25.865],
    [25.1236, 27.5858, 32.7172],
    [31.2379, 33.8777, 39.3693],
];

/// Johansen test output. Index `r` holds the test of rank ≤ r.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JohansenResult {
    /// Eigenvalues, descending
    pub eigenvalues: Vec<f64>,
    /// Cointegrating vectors, one per eigenvalue, normalized so `vᵀ·S_kk·v = 1`
    pub eigenvectors: Vec<Vec<f64>>,
    pub trace_statistics: Vec<f64>,
    pub max_eigen_statistics: Vec<f64>,
    /// (90%, 95%, 99%) per rank
    pub trace_critical: Vec<[f64; 3]>,
    pub max_eigen_critical: Vec<[f64; 3]>,
    pub nobs: usize,
}

impl JohansenResult {
    /// Rank chosen by sequential trace tests at 95%.
    pub fn rank(&self) -> usize {
        self.trace_statistics
            .iter()
            .zip(&self.trace_critical)
            .take_while(|(stat, crit)| **stat > crit[1])
            .count()
    }

    /// Trace statistic and 95% critical value for r = 0.
    pub fn trace_r0(&self) -> (f64, f64) {
        (self.trace_statistics[0], self.trace_critical[0][1])
    }
}

fn demean(m: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = m.clone();
    for mut col in out.column_iter_mut() {
        let mean = col.mean();
        col.add_scalar_mut(-mean);
    }
    out
}

/// Residuals of regressing each column of `y` on `x`.
fn residualize(y: &DMatrix<f64>, x: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let xt = x.transpose();
    let beta = (&xt * x).try_inverse()? * (&xt * y);
    Some(y - x * beta)
}

/// Johansen trace and maximum-eigenvalue tests with a constant
/// (`det_order = 0`) and one lagged difference (`k_ar_diff = 1`).
///
/// Supports 1 to 5 series of equal length.
pub fn johansen(series: &[&[f64]]) -> Option<JohansenResult> {
    let k = series.len();
    if !(1..=TRACE_CRIT.len()).contains(&k) {
        return None;
    }
    let n = series[0].len();
    if n < MIN_JOHANSEN_OBSERVATIONS || series.iter().any(|s| s.len() != n) {
        return None;
    }

    let levels = demean(&DMatrix::from_fn(n, k, |i, j| series[j][i]));
    let rows = n - 2;
    // ΔY_t, ΔY_{t-1}, Y_{t-1} for t = 2..n
    let dy = demean(&DMatrix::from_fn(rows, k, |r, j| {
        levels[(r + 2, j)] - levels[(r + 1, j)]
    }));
    let dy_lag = demean(&DMatrix::from_fn(rows, k, |r, j| {
        levels[(r + 1, j)] - levels[(r, j)]
    }));
    let y_lag = demean(&DMatrix::from_fn(rows, k, |r, j| levels[(r + 1, j)]));

    let r0 = residualize(&dy, &dy_lag)?;
    let rk = residualize(&y_lag, &dy_lag)?;

    let t = rows as f64;
    let skk = rk.transpose() * &rk / t;
    let sk0 = rk.transpose() * &r0 / t;
    let s00 = r0.transpose() * &r0 / t;

    // Solve |λ·S_kk − S_k0·S_00⁻¹·S_0k| = 0 through the Cholesky factor of S_kk
    let sig = &sk0 * s00.try_inverse()? * sk0.transpose();
    let l = skk.cholesky()?.l();
    let l_inv = l.try_inverse()?;
    let whitened = &l_inv * sig * l_inv.transpose();
    let eig = SymmetricEigen::new(0.5 * (&whitened + whitened.transpose()));

    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| {
        eig.eigenvalues[b]
            .partial_cmp(&eig.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let back = l_inv.transpose();
    let mut eigenvalues = Vec::with_capacity(k);
    let mut eigenvectors = Vec::with_capacity(k);
    for &i in &order {
        // Eigenvalues are squared canonical correlations, so in [0, 1)
        eigenvalues.push(eig.eigenvalues[i].clamp(0.0, 1.0 - 1e-12));
        let v = &back * eig.eigenvectors.column(i);
        eigenvectors.push(v.iter().copied().collect::<Vec<f64>>());
    }

    let log_terms: Vec<f64> = eigenvalues.iter().map(|l| (1.0 - l).ln()).collect();
    let trace_statistics = (0..k).map(|r| -t * log_terms[r..].iter().sum::<f64>()).collect();
    let max_eigen_statistics = log_terms.iter().map(|lt| -t * lt).collect();
    let trace_critical = (0..k).map(|r| TRACE_CRIT[k - r - 1]).collect();
    let max_eigen_critical = (0..k).map(|r| MAX_EIG_CRIT[k - r - 1]).collect();

    Some(JohansenResult {
        eigenvalues,
        eigenvectors,
        trace_statistics,
        max_eigen_statistics,
        trace_critical,
        max_eigen_critical,
        nobs: rows,
    })
}

/// Minimum length accepted by [`johansen`]
pub const MIN_JOHANSEN_OBSERVATIONS: usize = 20;

/// Mean-reversion half-life of a spread, in observations.
///
/// Fits `Δs[t] = a + b·s[t-1]`. Returns `f64::INFINITY` when `b ≥ 0` (no
/// reversion) and `None` when the regression cannot be fit.
pub fn half_life(spread: &[f64]) -> Option<f64> {
    if spread.len() < 3 {
        return None;
    }
    let lagged = &spread[..spread.len() - 1];
    let delta: Vec<f64> = spread.windows(2).map(|w| w[1] - w[0]).collect();
    let (_, b) = linear_fit(lagged, &delta)?;
    if b < 0.0 {
        Some(-std::f64::consts::LN_2 / b)
    } else {
        Some(f64::INFINITY)
    }
}
