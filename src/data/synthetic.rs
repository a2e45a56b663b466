//! Seeded synthetic price panels.
//!
//! `AAA` and `BBB` are cointegrated in price levels, the space the trader
//! filters in:
//!
//! ```text
//! log AAA[t] = log AAA[t-1] + e[t]
//! BBB[t] = beta * AAA[t] + s[t],   s[t] = phi * s[t-1] + u[t]
//! ```
//!
//! With no intercept `log BBB - log AAA = log beta + s / (beta * AAA)`, so the
//! pair also passes the log-price screen. The remaining columns are
//! independent geometric random walks.

use crate::types::PricePanel;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub rows: usize,
    pub seed: u64,
    /// Cointegrating slope in price levels
    pub beta: f64,
    /// Daily log volatility of the common trend
    pub trend_volatility: f64,
    /// AR(1) coefficient of the price spread
    pub spread_phi: f64,
    /// Innovation standard deviation of the price spread
    pub spread_volatility: f64,
    /// Independent random-walk columns added after the pair
    pub noise_columns: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            rows: 500,
            seed: 42,
            beta: 1.5,
            trend_volatility: 0.015,
            spread_phi: 0.8,
            spread_volatility: 0.6,
            noise_columns: 2,
        }
    }
}

const NOISE_TICKERS: [&str; 4] = ["CCC", "DDD", "EEE", "FFF"];

fn start_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Generate a panel with daily timestamps starting 2020-01-01.
pub fn synthetic_panel(config: &SyntheticConfig) -> PricePanel {
    info!(
        rows = config.rows,
        seed = config.seed,
        beta = config.beta,
        "Generating synthetic data"
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut normal = move || -> f64 { rng.sample(StandardNormal) };

    let start = start_date();
    let timestamps: Vec<DateTime<Utc>> = (0..config.rows)
        .map(|i| start + Duration::days(i as i64))
        .collect();

    let mut log_x = 100f64.ln();
    let mut spread = 0.0;
    let mut aaa = Vec::with_capacity(config.rows);
    let mut bbb = Vec::with_capacity(config.rows);
    for _ in 0..config.rows {
        log_x += config.trend_volatility * normal();
        spread = config.spread_phi * spread + config.spread_volatility * normal();
        let x = log_x.exp();
        aaa.push(x);
        bbb.push(config.beta * x + spread);
    }

    let mut columns = vec![("AAA".to_string(), aaa), ("BBB".to_string(), bbb)];
    for ticker in NOISE_TICKERS.iter().take(config.noise_columns) {
        let mut level = 50f64.ln();
        let walk = (0..config.rows)
            .map(|_| {
                level += config.trend_volatility * normal();
                level.exp()
            })
            .collect();
        columns.push((ticker.to_string(), walk));
    }

    PricePanel::new(timestamps, columns).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_and_determinism() {
        let config = SyntheticConfig::default();
        let a = synthetic_panel(&config);
        let b = synthetic_panel(&config);
        assert_eq!(a.len(), 500);
        assert_eq!(a.tickers(), vec!["AAA", "BBB", "CCC", "DDD"]);
        assert_eq!(a.column("BBB"), b.column("BBB"));
        assert!(a.column("AAA").unwrap().iter().all(|p| *p > 0.0));
        assert!(a.column("BBB").unwrap().iter().all(|p| *p > 0.0));
    }

    #[test]
    fn test_pair_is_cointegrated_in_levels() {
        let config = SyntheticConfig::default();
        let panel = synthetic_panel(&config);
        let aaa = panel.column("AAA").unwrap();
        let bbb = panel.column("BBB").unwrap();
        let spread: Vec<f64> = aaa
            .iter()
            .zip(bbb)
            .map(|(x, y)| y - config.beta * x)
            .collect();

        // Stationary AR(1): sd = 0.6 / sqrt(1 - 0.64) = 1.0
        let mean = spread.iter().sum::<f64>() / spread.len() as f64;
        let sd = (spread.iter().map(|s| (s - mean).powi(2)).sum::<f64>()
            / (spread.len() - 1) as f64)
            .sqrt();
        assert!(mean.abs() < 0.75, "spread mean {}", mean);
        assert!((0.7..1.3).contains(&sd), "spread sd {}", sd);
    }

    #[test]
    fn test_seed_changes_path() {
        let a = synthetic_panel(&SyntheticConfig::default());
        let b = synthetic_panel(&SyntheticConfig {
            seed: 7,
            ..Default::default()
        });
        assert_ne!(a.column("AAA"), b.column("AAA"));
    }

    #[test]
    fn test_noise_columns_capped() {
        let panel = synthetic_panel(&SyntheticConfig {
            noise_columns: 10,
            rows: 10,
            ..Default::default()
        });
        assert_eq!(panel.tickers().len(), 2 + NOISE_TICKERS.len());
    }
}
