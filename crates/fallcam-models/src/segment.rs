//! Ring segment records.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One retained ring segment.
///
/// Duration is not stored; every segment of a camera shares the configured
/// segment duration, so the implied interval is `[start_ms, start_ms + seg_ms)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// Absolute timestamp of the first frame (ms since epoch)
    pub start_ms: i64,
    /// Location of the segment file
    pub path: PathBuf,
}

impl SegmentRecord {
    pub fn new(start_ms: i64, path: impl Into<PathBuf>) -> Self {
        Self {
            start_ms,
            path: path.into(),
        }
    }

    /// Exclusive end of the implied interval.
    pub fn end_ms(&self, seg_ms: i64) -> i64 {
        self.start_ms + seg_ms
    }

    /// Half-open overlap test against `[from, to)`.
    pub fn overlaps(&self, from: i64, to: i64, seg_ms: i64) -> bool {
        self.end_ms(seg_ms) > from && self.start_ms < to
    }
}
