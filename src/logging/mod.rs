//! Logging and Signal Recording Module
//!
//! Provides multiple backends for recording emitted signals:
//! - `SignalRecorder` trait - Pluggable recorder interface
//! - `CsvRecorder` - Appends to a CSV file
//! - `TracingRecorder` - Structured logs
//! - `MultiRecorder` - Fan-out to several backends

pub mod csv_recorder;
pub mod recorder;
pub mod throttle;
pub mod tracing_recorder;

// Re-exports for convenience
pub use csv_recorder::CsvRecorder;
pub use recorder::{MultiRecorder, RecordError, SignalRecord, SignalRecorder};
pub use throttle::RejectThrottle;
pub use tracing_recorder::TracingRecorder;
