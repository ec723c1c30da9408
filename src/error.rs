//! Error types for the gesture tempo crate.

/// Errors that can occur when loading or saving recordings and
/// configuration files.
///
/// The detection pipeline itself never returns these: missing or
/// malformed samples are defined states, not failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Recording contains no frames")]
    EmptyRecording,
    #[error("Frame {index} goes back in time: {timestamp_ms} ms after {previous_ms} ms")]
    NonMonotonicTimestamp {
        index: usize,
        previous_ms: f64,
        timestamp_ms: f64,
    },
}

/// Result type alias for gesture tempo operations
pub type Result<T, E = Error> = std::result::Result<T, E>;
