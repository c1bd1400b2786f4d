//! Recorder metrics.
//!
//! Emitted through the `metrics` facade; the API binary installs the
//! Prometheus recorder. Without a recorder every call is a no-op.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const SEGMENTS_INDEXED_TOTAL: &str = "fallcam_segments_indexed_total";
    pub const SEGMENTS_SWEPT_TOTAL: &str = "fallcam_segments_swept_total";
    pub const FALLS_TOTAL: &str = "fallcam_falls_total";
    pub const CLIP_EXTRACTION_SECONDS: &str = "fallcam_clip_extraction_seconds";
    pub const INGEST_LATENCY_SECONDS: &str = "fallcam_ingest_latency_seconds";
    pub const FAULTS_TOTAL: &str = "fallcam_faults_total";
}

pub fn record_segment_indexed(cam_id: &str) {
    counter!(names::SEGMENTS_INDEXED_TOTAL, "cam_id" => cam_id.to_string()).increment(1);
}

pub fn record_segments_swept(cam_id: &str, count: u64) {
    counter!(names::SEGMENTS_SWEPT_TOTAL, "cam_id" => cam_id.to_string()).increment(count);
}

/// Record how a fall event ended (`saved`, `cooldown`, `no_footage`, `failed`, ...).
pub fn record_fall(cam_id: &str, outcome: &'static str) {
    counter!(
        names::FALLS_TOTAL,
        "cam_id" => cam_id.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_extraction_duration(cam_id: &str, secs: f64) {
    histogram!(names::CLIP_EXTRACTION_SECONDS, "cam_id" => cam_id.to_string()).record(secs);
}

/// Time from a segment being discovered to it being indexed.
pub fn record_ingest_latency(cam_id: &str, latency_ms: i64) {
    histogram!(names::INGEST_LATENCY_SECONDS, "cam_id" => cam_id.to_string())
        .record(latency_ms as f64 / 1000.0);
}

pub fn record_fault(kind: &'static str) {
    counter!(names::FAULTS_TOTAL, "kind" => kind).increment(1);
}
