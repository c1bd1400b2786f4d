//! FFmpeg CLI wrapper for the fallcam recorder.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A runner with timeout and stderr capture
//! - The segment-muxer command used as the ring segment producer
//! - Concat-demuxer manifests and lossless (`-c copy`) concatenation
//! - Best-effort filesystem helpers

pub mod command;
pub mod concat;
pub mod error;
pub mod fs_utils;
pub mod segmenter;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use concat::{build_manifest, concat_command, concat_copy, write_manifest};
pub use error::{MediaError, MediaResult};
pub use segmenter::{CapturePlatform, SegmenterSpec};
