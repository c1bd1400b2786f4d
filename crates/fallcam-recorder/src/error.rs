//! Recorder error types.

use std::path::PathBuf;
use thiserror::Error;

use fallcam_models::CameraId;

pub type RecorderResult<T> = Result<T, RecorderError>;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown camera: {0}")]
    UnknownCamera(CameraId),

    /// The clip window around this event time does not fit in an `i64`.
    #[error("Event time out of range: {0}")]
    InvalidEvent(i64),

    /// Concatenation failed; the staged copies and manifest in `event_dir`
    /// are left in place for inspection.
    #[error("Concatenation failed for {}: {source}", .event_dir.display())]
    ConcatFailed {
        event_dir: PathBuf,
        #[source]
        source: fallcam_media::MediaError,
    },

    #[error("Segment producer error: {0}")]
    Producer(String),

    #[error("Arrival feed error: {0}")]
    Feed(String),

    #[error("Clip sink error: {0}")]
    Sink(String),

    #[error("Media error: {0}")]
    Media(#[from] fallcam_media::MediaError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecorderError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn producer(msg: impl Into<String>) -> Self {
        Self::Producer(msg.into())
    }

    pub fn feed(msg: impl Into<String>) -> Self {
        Self::Feed(msg.into())
    }

    /// Whether a failed extraction left staged artifacts behind.
    pub fn staged_dir(&self) -> Option<&PathBuf> {
        match self {
            RecorderError::ConcatFailed { event_dir, .. } => Some(event_dir),
            _ => None,
        }
    }
}
