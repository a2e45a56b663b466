//! CSV price panel loader.

use super::error::DataError;
use crate::types::PricePanel;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// Accepted names for the timestamp column
pub const DATE_COLUMNS: [&str; 4] = ["date", "Date", "timestamp", "time"];

/// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, ISO `T` datetimes or RFC 3339.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Load a wide price CSV into a forward-filled panel sorted by time.
pub fn load_price_csv(path: impl AsRef<Path>) -> Result<PricePanel, DataError> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading CSV data");

    let file = File::open(path)?;
    let df = CsvReader::new(file).has_header(true).finish()?;
    let panel = panel_from_frame(&df)?;

    info!(
        rows = panel.len(),
        tickers = panel.tickers().len(),
        "Price panel loaded"
    );
    Ok(panel)
}

/// Convert a frame with one date column and numeric price columns.
pub fn panel_from_frame(df: &DataFrame) -> Result<PricePanel, DataError> {
    if df.height() == 0 {
        return Err(DataError::Empty);
    }

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let date_col = names
        .iter()
        .find(|n| DATE_COLUMNS.contains(&n.as_str()))
        .cloned()
        .ok_or(DataError::MissingDateColumn)?;

    let dates = df.column(&date_col)?.cast(&DataType::Utf8)?;
    let mut timestamps = Vec::with_capacity(df.height());
    for (row, value) in dates.utf8()?.into_iter().enumerate() {
        let raw = value.unwrap_or_default();
        let ts = parse_timestamp(raw).ok_or_else(|| DataError::InvalidDate {
            row,
            value: raw.to_string(),
        })?;
        timestamps.push(ts);
    }

    let mut columns = Vec::new();
    for name in names.iter().filter(|n| **n != date_col) {
        let series = df.column(name)?.cast(&DataType::Float64)?;
        let values: Vec<f64> = series
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        columns.push((name.clone(), values));
    }
    if columns.is_empty() {
        return Err(DataError::NoPriceColumns);
    }

    // Sort rows by time, keeping file order for ties
    let mut order: Vec<usize> = (0..timestamps.len()).collect();
    if timestamps.windows(2).any(|w| w[1] < w[0]) {
        warn!("Rows are not in time order, sorting");
        order.sort_by_key(|&i| timestamps[i]);
    }
    let timestamps: Vec<DateTime<Utc>> = order.iter().map(|&i| timestamps[i]).collect();
    let columns = columns
        .into_iter()
        .map(|(name, values)| (name, order.iter().map(|&i| values[i]).collect()))
        .collect();

    let mut panel = PricePanel::new(timestamps, columns).map_err(DataError::Panel)?;
    panel.forward_fill();
    Ok(panel)
}
