//! Structured per-camera logging utilities.
//!
//! Provides consistent, structured logging for session lifecycle and
//! extraction events with the camera id attached to every line.

use tracing::{error, info, warn, Span};

use fallcam_models::CameraId;

/// Camera logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct CameraLogger {
    cam_id: String,
    component: &'static str,
}

impl CameraLogger {
    /// Create a new logger for a camera and component (e.g. "session", "extractor").
    pub fn new(cam_id: &CameraId, component: &'static str) -> Self {
        Self {
            cam_id: cam_id.to_string(),
            component,
        }
    }

    pub fn log_info(&self, message: &str) {
        info!(
            cam_id = %self.cam_id,
            component = self.component,
            "{}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            cam_id = %self.cam_id,
            component = self.component,
            "{}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            cam_id = %self.cam_id,
            component = self.component,
            "{}", message
        );
    }

    pub fn cam_id(&self) -> &str {
        &self.cam_id
    }

    /// Create a tracing span for one fall event on this camera.
    pub fn event_span(&self, event_ms: i64) -> Span {
        tracing::info_span!(
            "fall",
            cam_id = %self.cam_id,
            event_ms = event_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_logger_creation() {
        let logger = CameraLogger::new(&CameraId::from("cam03"), "session");
        assert_eq!(logger.cam_id(), "cam03");
        logger.log_info("started");
    }
}
