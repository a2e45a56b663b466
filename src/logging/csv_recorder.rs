//! CSV Signal Recorder
//!
//! Appends signals to a CSV file.

use super::recorder::{RecordError, SignalRecord, SignalRecorder};
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// CSV file recorder
///
/// Uses `spawn_blocking` to avoid blocking the async runtime during file I/O.
pub struct CsvRecorder {
    file_path: Arc<PathBuf>,
    /// Mutex to serialize writes and track header state
    state: Arc<Mutex<CsvState>>,
}

struct CsvState {
    header_written: bool,
}

impl CsvRecorder {
    /// Create a new CSV recorder
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path: Arc::new(file_path),
            state: Arc::new(Mutex::new(CsvState {
                header_written: false,
            })),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.file_path
    }
}

#[async_trait]
impl SignalRecorder for CsvRecorder {
    async fn record(&self, record: &SignalRecord) -> Result<(), RecordError> {
        let file_path = Arc::clone(&self.file_path);
        let state = Arc::clone(&self.state);
        let csv_line = record.to_csv_line();

        tokio::task::spawn_blocking(move || {
            // Handle mutex poisoning gracefully
            let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());

            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&*file_path)?;

            // An existing non-empty file already has its header
            if !guard.header_written {
                let is_empty = std::fs::metadata(&*file_path)
                    .map(|m| m.len() == 0)
                    .unwrap_or(true);
                if is_empty {
                    writeln!(file, "{}", SignalRecord::csv_header())?;
                }
                guard.header_written = true;
            }

            writeln!(file, "{}", csv_line)?;
            Ok::<(), RecordError>(())
        })
        .await
        .map_err(|e| RecordError::Io(std::io::Error::other(e)))??;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::recorder::tests::sample_record;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_csv_recorder_writes_header_once() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("signals.csv");

        let recorder = CsvRecorder::new(file_path.clone());
        recorder.record(&sample_record()).await.unwrap();
        recorder.record(&sample_record()).await.unwrap();

        let contents = std::fs::read_to_string(&file_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], SignalRecord::csv_header());
        assert!(lines[1].contains("GLD-GDX"));
    }

    #[tokio::test]
    async fn test_csv_recorder_appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("signals.csv");

        CsvRecorder::new(file_path.clone())
            .record(&sample_record())
            .await
            .unwrap();
        // A second recorder on the same file must not repeat the header
        CsvRecorder::new(file_path.clone())
            .record(&sample_record())
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&file_path).unwrap();
        let headers = contents
            .lines()
            .filter(|l| *l == SignalRecord::csv_header())
            .count();
        assert_eq!(headers, 1);
        assert_eq!(contents.lines().count(), 3);
    }
}
