//! Recorder configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use fallcam_models::{CameraId, CameraSpec};

use crate::error::{RecorderError, RecorderResult};

/// Recorder configuration shared by every camera session.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Root of the per-camera ring directories
    pub ring_dir: PathBuf,
    /// Root of the per-camera archive directories
    pub archive_dir: PathBuf,
    /// Uniform segment duration (SEG_MS)
    pub segment_ms: i64,
    /// Ring TTL before disk and index eviction
    pub retention: Duration,
    /// Extra slack kept in the index beyond the retention window
    pub retention_grace: Duration,
    /// Footage kept before the event
    pub pre_event_ms: i64,
    /// Footage kept after the event
    pub post_event_ms: i64,
    /// Minimum spacing between accepted events per camera (0 disables)
    pub cooldown_ms: i64,
    /// Retention sweeper cadence
    pub sweep_interval: Duration,
    /// Maximum directory depth walked by the disk sweep
    pub sweep_max_depth: usize,
    /// Maximum wait for coverage before extracting what is indexed
    pub coverage_timeout: Duration,
    /// Polling feed cadence
    pub feed_poll_interval: Duration,
    /// Maximum directory depth watched by the polling feed
    pub feed_max_depth: usize,
    /// Hard limit on one concatenation run
    pub concat_timeout: Duration,
    /// Base URL used when announcing saved clips
    pub clip_base_url: String,
    /// JSON file describing the cameras to record
    pub cameras_file: Option<PathBuf>,
}

/// Default storage base for the platform.
fn default_base_dir() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("recordings")
    } else {
        PathBuf::from("/var/recordings")
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        let base = default_base_dir();
        Self {
            ring_dir: base.join("ring"),
            archive_dir: base.join("archive"),
            segment_ms: 2000,
            retention: Duration::from_secs(10 * 60),
            retention_grace: Duration::from_secs(60),
            pre_event_ms: 16_000,
            post_event_ms: 16_000,
            cooldown_ms: 20_000,
            sweep_interval: Duration::from_secs(60),
            sweep_max_depth: 4,
            coverage_timeout: Duration::from_secs(25),
            feed_poll_interval: Duration::from_millis(500),
            feed_max_depth: 3,
            concat_timeout: Duration::from_secs(120),
            clip_base_url: "http://localhost:8080".to_string(),
            cameras_file: None,
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or invalid.
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl RecorderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base = std::env::var("FALLCAM_BASE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_base_dir());

        Self {
            ring_dir: std::env::var("FALLCAM_RING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| base.join("ring")),
            archive_dir: std::env::var("FALLCAM_ARCHIVE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| base.join("archive")),
            segment_ms: env_parse("FALLCAM_SEGMENT_MS", defaults.segment_ms),
            retention: Duration::from_secs(env_parse(
                "FALLCAM_RETENTION_SECS",
                defaults.retention.as_secs(),
            )),
            retention_grace: Duration::from_secs(env_parse(
                "FALLCAM_RETENTION_GRACE_SECS",
                defaults.retention_grace.as_secs(),
            )),
            pre_event_ms: env_parse("FALLCAM_PRE_EVENT_MS", defaults.pre_event_ms),
            post_event_ms: env_parse("FALLCAM_POST_EVENT_MS", defaults.post_event_ms),
            cooldown_ms: env_parse("FALLCAM_COOLDOWN_MS", defaults.cooldown_ms),
            sweep_interval: Duration::from_secs(env_parse(
                "FALLCAM_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval.as_secs(),
            )),
            sweep_max_depth: env_parse("FALLCAM_SWEEP_MAX_DEPTH", defaults.sweep_max_depth),
            coverage_timeout: Duration::from_secs(env_parse(
                "FALLCAM_COVERAGE_TIMEOUT_SECS",
                defaults.coverage_timeout.as_secs(),
            )),
            feed_poll_interval: Duration::from_millis(env_parse(
                "FALLCAM_FEED_POLL_MS",
                defaults.feed_poll_interval.as_millis() as u64,
            )),
            feed_max_depth: env_parse("FALLCAM_FEED_MAX_DEPTH", defaults.feed_max_depth),
            concat_timeout: Duration::from_secs(env_parse(
                "FALLCAM_CONCAT_TIMEOUT_SECS",
                defaults.concat_timeout.as_secs(),
            )),
            clip_base_url: std::env::var("FALLCAM_CLIP_BASE_URL")
                .unwrap_or(defaults.clip_base_url),
            cameras_file: std::env::var("FALLCAM_CAMERAS").ok().map(PathBuf::from),
        }
    }

    /// Reject settings the overlap and retention math cannot work with.
    pub fn validate(&self) -> RecorderResult<()> {
        if self.segment_ms <= 0 {
            return Err(RecorderError::config_error("segment duration must be positive"));
        }
        if self.pre_event_ms < 0 || self.post_event_ms < 0 {
            return Err(RecorderError::config_error("event window must not be negative"));
        }
        if self.cooldown_ms < 0 {
            return Err(RecorderError::config_error("cooldown must not be negative"));
        }
        if self.sweep_interval.is_zero() || self.feed_poll_interval.is_zero() {
            return Err(RecorderError::config_error("intervals must be non-zero"));
        }
        Ok(())
    }

    /// Retention window in milliseconds.
    pub fn retention_ms(&self) -> i64 {
        self.retention.as_millis() as i64
    }

    /// Retention window plus grace in milliseconds; the index bound.
    pub fn index_horizon_ms(&self) -> i64 {
        (self.retention + self.retention_grace).as_millis() as i64
    }

    /// Ring directory of one camera.
    pub fn ring_base(&self, cam_id: &CameraId) -> PathBuf {
        self.ring_dir.join(cam_id.as_str())
    }

    /// Archive directory of one camera.
    pub fn archive_base(&self, cam_id: &CameraId) -> PathBuf {
        self.archive_dir.join(cam_id.as_str())
    }

    /// Archive directory of one event.
    pub fn event_dir(&self, cam_id: &CameraId, event_ms: i64) -> PathBuf {
        self.archive_base(cam_id).join(event_ms.to_string())
    }

    /// Load camera specs from the configured JSON file.
    ///
    /// The file maps camera ids to specs:
    /// `{ "cam01": { "device": "/dev/v4l/by-id/...", "fps": 30 } }`.
    pub fn load_cameras(&self) -> RecorderResult<BTreeMap<CameraId, CameraSpec>> {
        match &self.cameras_file {
            Some(path) => load_cameras_file(path),
            None => Err(RecorderError::config_error("FALLCAM_CAMERAS is not set")),
        }
    }
}

/// Parse a camera map from a JSON file.
pub fn load_cameras_file(path: &Path) -> RecorderResult<BTreeMap<CameraId, CameraSpec>> {
    let body = std::fs::read_to_string(path).map_err(|e| {
        RecorderError::config_error(format!("cannot read {}: {}", path.display(), e))
    })?;
    let cameras: BTreeMap<CameraId, CameraSpec> = serde_json::from_str(&body)?;
    if cameras.is_empty() {
        return Err(RecorderError::config_error(format!(
            "{} declares no cameras",
            path.display()
        )));
    }
    Ok(cameras)
}
