//! Ring segment producer command.
//!
//! Builds the long-running FFmpeg invocation that captures a camera and
//! writes fixed-duration MP4 segments through the `segment` muxer.
//!
//! On Linux the output pattern embeds the epoch start second
//! (`<ring>/%Y%m%d/%H/%Y%m%d%H%M%S_%s.mp4`), which is what the index parses.
//! DirectShow builds use a plain counter (`seg%06d.mp4`) and rely on the
//! file-modification-time fallback instead.

use std::path::{Path, PathBuf};

use crate::command::FfmpegCommand;

/// Capture backend for the input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePlatform {
    /// Video4Linux2 (`-f v4l2`)
    V4l2,
    /// DirectShow (`-f dshow`)
    Dshow,
}

impl CapturePlatform {
    /// Backend for the platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            CapturePlatform::Dshow
        } else {
            CapturePlatform::V4l2
        }
    }

    /// Whether the output pattern can carry strftime timestamps.
    pub fn supports_strftime(&self) -> bool {
        matches!(self, CapturePlatform::V4l2)
    }
}

/// Parameters of one segmenter process.
#[derive(Debug, Clone)]
pub struct SegmenterSpec {
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Segment duration in milliseconds
    pub segment_ms: i64,
    pub platform: CapturePlatform,
}

impl SegmenterSpec {
    /// Output filename pattern below the camera's ring directory.
    pub fn output_pattern(&self, ring_dir: &Path) -> PathBuf {
        match self.platform {
            CapturePlatform::V4l2 => ring_dir
                .join("%Y%m%d")
                .join("%H")
                .join("%Y%m%d%H%M%S_%s.mp4"),
            CapturePlatform::Dshow => ring_dir.join("seg%06d.mp4"),
        }
    }

    /// Build the segmenter command writing into `ring_dir`.
    pub fn command(&self, ring_dir: &Path) -> FfmpegCommand {
        let size = format!("{}x{}", self.width, self.height);
        let gop = (self.fps * 2).to_string();
        let segment_secs = (self.segment_ms as f64 / 1000.0).to_string();

        let cmd = FfmpegCommand::new(self.device.clone(), self.output_pattern(ring_dir));

        let cmd = match self.platform {
            CapturePlatform::V4l2 => cmd
                .input_format("v4l2")
                .input_args(["-framerate".to_string(), self.fps.to_string()])
                .input_args(["-video_size".to_string(), size]),
            CapturePlatform::Dshow => cmd
                .input_format("dshow")
                .input_args(["-video_size".to_string(), size])
                .input_args(["-framerate".to_string(), self.fps.to_string()]),
        };

        let cmd = cmd
            .video_codec("libx264")
            .preset("veryfast")
            .output_args(["-tune", "zerolatency"])
            .output_args(["-g".to_string(), gop.clone()])
            .output_args(["-keyint_min".to_string(), gop])
            .output_args(["-sc_threshold", "0"])
            .output_args(["-pix_fmt", "yuv420p"])
            .output_format("segment")
            .output_args(["-segment_time".to_string(), segment_secs])
            .output_args(["-reset_timestamps", "1"]);

        if self.platform.supports_strftime() {
            // The muxer does not create the date/hour directories by itself.
            cmd.output_args(["-strftime", "1", "-strftime_mkdir", "1"])
        } else {
            cmd
        }
    }
}
