//! Error taxonomy. Every variant is recoverable from the scheduler's point of
//! view; only bootstrap failures stop the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchbellError {
    /// Network or parse failure on the monitored source.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A send to one subscriber failed.
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// The external device toggle failed.
    #[error("Actuation error: {0}")]
    Actuation(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Compile error: {0}")]
    Compile(String),

    /// Disk write of durable state failed; in-memory state stays authoritative.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, WatchbellError>;
