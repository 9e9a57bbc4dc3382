//! Error type shared by all sinks.

use thiserror::Error;

/// Errors a sink may report. Callers log them and carry on.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    /// Backend could not be reached
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    /// Event could not be encoded
    #[error("failed to encode event: {0}")]
    Encoding(String),
}
