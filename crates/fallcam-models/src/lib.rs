//! Shared data models for the fallcam recorder.
//!
//! This crate provides Serde-serializable types for:
//! - Camera identity and capture parameters
//! - Ring segments and their implied time intervals
//! - Fall events, clip descriptors and persisted clip metadata

pub mod camera;
pub mod clip;
pub mod segment;

// Re-export common types
pub use camera::{CameraId, CameraSpec};
pub use clip::{
    clip_file_name, ClipDescriptor, ClipMetadata, ClipNotice, FallEvent, FallOutcome,
    METADATA_FILE_NAME,
};
pub use segment::SegmentRecord;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
