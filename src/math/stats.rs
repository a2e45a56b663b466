//! Descriptive statistics, least squares and rolling z-scores.

use nalgebra::{DMatrix, DVector};
use std::collections::VecDeque;

/// Trading days per year for Sharpe annualization
pub const ANNUALIZATION_FACTOR: f64 = 252.0;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n-1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Calculate Pearson correlation coefficient between two series
///
/// Returns a value in [-1.0, 1.0], or None if calculation fails.
/// A constant series has zero correlation with anything. Location and scale
/// do not matter, so log prices with means near zero are fine.
///
/// # Mathematical Definition
/// r = Σ[(xi - x̄)(yi - ȳ)] / √[Σ(xi - x̄)² × Σ(yi - ȳ)²]
pub fn correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }

    let mean_a = mean(a)?;
    let mean_b = mean(b)?;

    let mut covariance = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return Some(0.0);
    }

    let r = covariance / (var_a.sqrt() * var_b.sqrt());
    r.is_finite().then_some(r)
}

/// Ordinary least squares fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: DVector<f64>,
    pub std_errors: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Sum of squared residuals
    pub ssr: f64,
    pub nobs: usize,
}

impl OlsFit {
    /// t-statistic of coefficient `i`.
    pub fn t_stat(&self, i: usize) -> Option<f64> {
        let t = self.coefficients.get(i)? / self.std_errors.get(i)?;
        t.is_finite().then_some(t)
    }

    /// Gaussian log-likelihood at the ML variance estimate.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.coefficients.len() as f64
    }
}

/// Regress `y` on the columns of `x`.
///
/// Returns `None` when the design is singular or there are no residual
/// degrees of freedom.
pub fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<OlsFit> {
    let (n, k) = x.shape();
    if n != y.len() || n <= k || k == 0 {
        return None;
    }

    let xt = x.transpose();
    let xtx_inv = (&xt * x).try_inverse()?;
    let coefficients = &xtx_inv * (&xt * y);
    let residuals = y - x * &coefficients;
    let ssr = residuals.norm_squared();
    let sigma2 = ssr / (n - k) as f64;

    let std_errors = DVector::from_iterator(
        k,
        (0..k).map(|i| (sigma2 * xtx_inv[(i, i)]).max(0.0).sqrt()),
    );

    if !coefficients.iter().all(|c| c.is_finite()) {
        return None;
    }

    Some(OlsFit {
        coefficients,
        std_errors,
        residuals,
        ssr,
        nobs: n,
    })
}

/// Fit `y = a + b·x`, returning `(a, b)`.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() != y.len() {
        return None;
    }
    let design = DMatrix::from_fn(x.len(), 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    let fit = ols(&design, &DVector::from_column_slice(y))?;
    Some((fit.coefficients[0], fit.coefficients[1]))
}

/// Annualized Sharpe ratio from per-period returns.
///
/// Zero when fewer than two returns or the sample deviation vanishes.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    let (Some(m), Some(sd)) = (mean(returns), sample_std(returns)) else {
        return 0.0;
    };
    if sd.abs() < f64::EPSILON || !sd.is_finite() {
        return 0.0;
    }
    (m / sd) * periods_per_year.sqrt()
}

/// Largest peak-to-trough fall of a cumulative series (non-negative).
pub fn max_drawdown(cumulative: &[f64]) -> f64 {
    let mut peak = 0.0_f64;
    let mut worst = 0.0_f64;
    for &v in cumulative {
        peak = peak.max(v);
        worst = worst.max(peak - v);
    }
    worst
}

/// Z-score of the latest value against a trailing window that includes it.
///
/// Uses the sample standard deviation. Undefined until the window is full.
#[derive(Debug, Clone)]
pub struct RollingZScore {
    window: usize,
    values: VecDeque<f64>,
}

impl RollingZScore {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            values: VecDeque::with_capacity(window + 1),
        }
    }

    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.values.push_back(value);
        if self.values.len() > self.window {
            self.values.pop_front();
        }
        if self.values.len() < self.window || self.window < 2 {
            return None;
        }

        let n = self.values.len() as f64;
        let m = self.values.iter().sum::<f64>() / n;
        let var = self.values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0);
        let sd = var.sqrt();
        if sd == 0.0 || !sd.is_finite() {
            return None;
        }
        let z = (value - m) / sd;
        z.is_finite().then_some(z)
    }

    pub fn is_ready(&self) -> bool {
        self.values.len() >= self.window
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
