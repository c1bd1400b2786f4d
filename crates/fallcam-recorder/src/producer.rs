//! Segment producers.
//!
//! A producer continuously writes fixed-duration `.mp4` segments into a
//! camera's ring directory. The session only starts and stops it; segment
//! discovery goes through the arrival feed.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Child;
use tracing::{info, warn};

use fallcam_media::{CapturePlatform, FfmpegRunner, SegmenterSpec};
use fallcam_models::CameraSpec;

use crate::error::{RecorderError, RecorderResult};

/// How long `stop` waits for the encoder to exit after the kill signal.
pub const PRODUCER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait SegmentProducer: Send {
    /// Begin writing segments below `ring_dir`. Starting a running
    /// producer is a no-op.
    async fn start(&mut self, spec: &CameraSpec, ring_dir: &Path) -> RecorderResult<()>;

    /// Terminate the producer. Safe to call when not running.
    async fn stop(&mut self) -> RecorderResult<()>;

    fn is_running(&mut self) -> bool;
}

/// FFmpeg segment-muxer producer.
#[derive(Debug)]
pub struct FfmpegSegmenter {
    runner: FfmpegRunner,
    segment_ms: i64,
    platform: CapturePlatform,
    stop_timeout: Duration,
    child: Option<Child>,
}

impl FfmpegSegmenter {
    pub fn new(segment_ms: i64) -> Self {
        Self {
            runner: FfmpegRunner::new(),
            segment_ms,
            platform: CapturePlatform::current(),
            stop_timeout: PRODUCER_STOP_TIMEOUT,
            child: None,
        }
    }

    pub fn with_runner(mut self, runner: FfmpegRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_platform(mut self, platform: CapturePlatform) -> Self {
        self.platform = platform;
        self
    }

    pub fn segmenter_spec(&self, spec: &CameraSpec) -> SegmenterSpec {
        SegmenterSpec {
            device: spec.device.clone(),
            width: spec.width,
            height: spec.height,
            fps: spec.fps,
            segment_ms: self.segment_ms,
            platform: self.platform,
        }
    }
}

#[async_trait]
impl SegmentProducer for FfmpegSegmenter {
    async fn start(&mut self, spec: &CameraSpec, ring_dir: &Path) -> RecorderResult<()> {
        if self.is_running() {
            return Ok(());
        }

        tokio::fs::create_dir_all(ring_dir).await?;

        let cmd = self.segmenter_spec(spec).command(ring_dir);
        let child = self
            .runner
            .spawn(&cmd)
            .map_err(|e| RecorderError::producer(format!("failed to spawn segmenter: {}", e)))?;

        info!(
            device = %spec.device,
            pid = ?child.id(),
            ring_dir = %ring_dir.display(),
            "Segmenter started"
        );
        self.child = Some(child);
        Ok(())
    }

    async fn stop(&mut self) -> RecorderResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        if let Err(e) = child.start_kill() {
            // Already exited between the last poll and now.
            warn!("Failed to signal segmenter: {}", e);
        }

        match tokio::time::timeout(self.stop_timeout, child.wait()).await {
            Ok(Ok(status)) => {
                info!(?status, "Segmenter stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(RecorderError::producer(format!(
                "failed to reap segmenter: {}",
                e
            ))),
            Err(_) => Err(RecorderError::producer(format!(
                "segmenter did not exit within {:?}",
                self.stop_timeout
            ))),
        }
    }

    fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}
