//! Camera identity and capture parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one camera, e.g. `cam01`.
///
/// Used as a directory name under both the ring and archive roots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(pub String);

impl CameraId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CameraId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CameraId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Capture parameters handed to the segment producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSpec {
    /// Device handle (`/dev/v4l/by-id/...` or `video=<name>` for dshow)
    pub device: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_fps() -> u32 {
    30
}

impl CameraSpec {
    /// Create a spec with default 1280x720@30 capture.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
        }
    }

    /// Frame size in ffmpeg `WxH` form.
    pub fn video_size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}
