use std::io;

use thiserror::Error;

/// Observability write failures. Never escape a verification; callers log and drop them.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("metrics sink I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode metrics record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("metrics sink unavailable: {0}")]
    Unavailable(String),
}

pub type SinkResult<T> = Result<T, SinkError>;
