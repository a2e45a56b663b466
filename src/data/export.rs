//! Result files: per-step series CSV, filter history CSV and JSON summaries.

use super::error::DataError;
use crate::discovery::CandidatePair;
use crate::evaluation::StepRecord;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Pretty-printed JSON
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), DataError> {
    let json = serde_json::to_string_pretty(value)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    info!(path = %path.display(), "Results written");
    Ok(())
}

fn write_frame(path: &Path, df: &mut DataFrame) -> Result<(), DataError> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    info!(path = %path.display(), rows = df.height(), "CSV written");
    Ok(())
}

/// `series.csv`: timestamp, intercept, beta, spread, zscore, position, pnl, cumulative
pub fn write_series_csv(path: &Path, steps: &[StepRecord]) -> Result<(), DataError> {
    let timestamp: Vec<String> = steps.iter().map(|s| s.timestamp.to_rfc3339()).collect();
    let intercept: Vec<f64> = steps.iter().map(|s| s.intercept).collect();
    let beta: Vec<f64> = steps.iter().map(|s| s.beta).collect();
    let spread: Vec<f64> = steps.iter().map(|s| s.spread).collect();
    let zscore: Vec<Option<f64>> = steps.iter().map(|s| s.zscore).collect();
    let signal: Vec<String> = steps.iter().map(|s| s.signal.to_string()).collect();
    let position: Vec<f64> = steps.iter().map(|s| s.position.as_f64()).collect();
    let pnl: Vec<f64> = steps.iter().map(|s| s.pnl).collect();
    let cumulative: Vec<f64> = steps.iter().map(|s| s.cumulative).collect();

    let mut df = df! {
        "timestamp" => timestamp,
        "intercept" => intercept,
        "beta" => beta,
        "spread" => spread,
        "zscore" => zscore,
        "signal" => signal,
        "position" => position,
        "pnl" => pnl,
        "cumulative" => cumulative,
    }?;
    write_frame(path, &mut df)
}

/// `(intercept, beta)` path recorded by the filter
pub fn write_history_csv(path: &Path, history: &[(f64, f64)]) -> Result<(), DataError> {
    let step: Vec<u64> = (0..history.len() as u64).collect();
    let intercept: Vec<f64> = history.iter().map(|(a, _)| *a).collect();
    let beta: Vec<f64> = history.iter().map(|(_, b)| *b).collect();
    let mut df = df! {
        "step" => step,
        "intercept" => intercept,
        "beta" => beta,
    }?;
    write_frame(path, &mut df)
}

/// Selected pairs as a flat table
pub fn write_pairs_csv(path: &Path, pairs: &[CandidatePair]) -> Result<(), DataError> {
    let mut df = df! {
        "leg_x" => pairs.iter().map(|p| p.pair.leg_x.clone()).collect::<Vec<_>>(),
        "leg_y" => pairs.iter().map(|p| p.pair.leg_y.clone()).collect::<Vec<_>>(),
        "correlation" => pairs.iter().map(|p| p.correlation).collect::<Vec<_>>(),
        "eg_pvalue" => pairs.iter().map(|p| p.engle_granger_p).collect::<Vec<_>>(),
        "johansen_trace" => pairs.iter().map(|p| p.johansen_trace).collect::<Vec<_>>(),
        "johansen_crit95" => pairs.iter().map(|p| p.johansen_critical).collect::<Vec<_>>(),
        "adf_pvalue" => pairs.iter().map(|p| p.spread_adf_p).collect::<Vec<_>>(),
        "hedge_ratio" => pairs.iter().map(|p| p.hedge_ratio).collect::<Vec<_>>(),
        "half_life" => pairs.iter().map(|p| p.half_life).collect::<Vec<_>>(),
    }?;
    write_frame(path, &mut df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{Position, Signal};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[test]
    fn test_series_csv_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let steps = vec![
            StepRecord {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                intercept: 0.1,
                beta: 1.2,
                spread: 0.3,
                zscore: None,
                signal: Signal::Hold,
                position: Position::Flat,
                pnl: 0.0,
                cumulative: 0.0,
            },
            StepRecord {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
                intercept: 0.1,
                beta: 1.3,
                spread: -0.4,
                zscore: Some(-2.5),
                signal: Signal::EnterLongSpread,
                position: Position::LongSpread,
                pnl: 0.0,
                cumulative: 0.0,
            },
        ];
        write_series_csv(&path, &steps).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,intercept,beta,spread,zscore,signal,position,pnl,cumulative"
        );
        assert_eq!(contents.lines().count(), 3);
        assert!(contents.contains("enter_long_spread"));
    }

    #[test]
    fn test_history_and_json() {
        let dir = tempdir().unwrap();
        write_history_csv(&dir.path().join("h.csv"), &[(0.0, 1.0), (0.1, 1.1)]).unwrap();
        let h = std::fs::read_to_string(dir.path().join("h.csv")).unwrap();
        assert!(h.starts_with("step,intercept,beta"));

        let json_path = dir.path().join("r.json");
        write_json(&json_path, &serde_json::json!({"sharpe": 1.5})).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(v["sharpe"], 1.5);
    }
}
