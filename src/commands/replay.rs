//! Streaming replay command handler.
//!
//! Feeds historical observations through a bounded channel into an async
//! `PairTrader::run`, recording signals to CSV and structured logs.

use crate::cli::{load_strategy_config, parse_pair, DataSource};
use crate::logging::{CsvRecorder, MultiRecorder, SignalRecorder, TracingRecorder};
use crate::strategy::PairTrader;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Replay one pair as a stream.
///
/// # Errors
/// Returns error if data or config loading fails, or a task panics.
pub async fn run_replay(
    source: &DataSource,
    pair_arg: &str,
    config_path: Option<&str>,
    signals_out: &str,
    channel_capacity: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("--- statarb: Streaming Replay ---");
    let panel = source.load()?;
    let pair = parse_pair(pair_arg, &panel)?;
    let config = load_strategy_config(config_path)?;
    let observations = panel.observations(&pair).unwrap_or_default();

    let recorder: Arc<dyn SignalRecorder> = Arc::new(MultiRecorder::new(vec![
        Box::new(CsvRecorder::new(PathBuf::from(signals_out))),
        Box::new(TracingRecorder::new()),
    ]));

    let mut trader = PairTrader::new(pair.clone(), &config)?;
    let (tx, rx) = mpsc::channel(channel_capacity.max(1));

    let feeder = tokio::spawn(async move {
        let mut sent = 0usize;
        for obs in observations {
            if tx.send(obs).await.is_err() {
                warn!("Trader stopped before the feed finished");
                break;
            }
            sent += 1;
        }
        sent
    });

    let summary = trader.run(rx, recorder).await;
    let sent = feeder.await?;

    info!(
        pair = %pair,
        sent,
        processed = summary.processed,
        rejected = summary.rejected,
        signals = summary.signals,
        record_failures = summary.record_failures,
        final_position = %summary.final_position,
        output = signals_out,
        "Replay finished"
    );
    Ok(())
}
