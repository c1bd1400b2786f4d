//! Time-indexed ring segment index.
//!
//! [`SegmentIndex`] is the ordered record of retained segments for one
//! camera. [`RingIndex`] wraps it for concurrent use: a mutex held only for
//! the duration of each operation, plus a `watch` channel publishing the
//! newest indexed start time so coverage waiters are woken by ingestion
//! instead of polling.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::Duration;

use regex::Regex;
use tokio::sync::watch;

use fallcam_media::fs_utils::modified_ms;
use fallcam_models::SegmentRecord;

use crate::error::RecorderResult;

/// Matches the `_<epoch seconds>.mp4` suffix written by the strftime segmenter.
fn epoch_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_(\d+)\.mp4$").expect("static regex"))
}

/// Parse the embedded epoch-seconds start from a segment filename.
pub fn parse_epoch_secs(file_name: &str) -> Option<i64> {
    epoch_suffix_re()
        .captures(file_name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Derive a segment's start time.
///
/// Prefers the filename's epoch suffix; otherwise the file's last-write time
/// minus one segment duration (the write finished when the segment ended).
pub async fn derive_start_ms(path: &Path, seg_ms: i64) -> RecorderResult<i64> {
    let from_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(parse_epoch_secs)
        .and_then(|secs| secs.checked_mul(1000));

    // An out-of-range suffix counts as no embedded timestamp.
    if let Some(start_ms) = from_name {
        return Ok(start_ms);
    }

    let mtime_ms = modified_ms(path).await?;
    Ok((mtime_ms - seg_ms).max(0))
}

/// Ordered, time-keyed record of retained segments.
///
/// Invariant: records are non-decreasing by `start_ms`.
#[derive(Debug, Clone)]
pub struct SegmentIndex {
    records: VecDeque<SegmentRecord>,
    seg_ms: i64,
}

impl SegmentIndex {
    pub fn new(seg_ms: i64) -> Self {
        Self {
            records: VecDeque::new(),
            seg_ms,
        }
    }

    pub fn seg_ms(&self) -> i64 {
        self.seg_ms
    }

    /// Insert a record at its sorted position.
    ///
    /// Arrivals are normally in order, so this is an append; a late arrival
    /// is placed after every record with an equal or earlier start. An exact
    /// duplicate (same start and path) is ignored. Returns whether the
    /// record was inserted.
    pub fn ingest(&mut self, record: SegmentRecord) -> bool {
        let pos = self
            .records
            .partition_point(|r| r.start_ms <= record.start_ms);

        let duplicate = self
            .records
            .range(..pos)
            .rev()
            .take_while(|r| r.start_ms == record.start_ms)
            .any(|r| r.path == record.path);
        if duplicate {
            return false;
        }

        if pos == self.records.len() {
            self.records.push_back(record);
        } else {
            self.records.insert(pos, record);
        }
        true
    }

    /// Records overlapping `[from, to)`, ascending by start.
    pub fn query_range(&self, from: i64, to: i64) -> Vec<SegmentRecord> {
        // Records starting at or after `to` can never overlap.
        let end = self.records.partition_point(|r| r.start_ms < to);
        self.records
            .range(..end)
            .filter(|r| r.overlaps(from, to, self.seg_ms))
            .cloned()
            .collect()
    }

    /// Remove every record with `start_ms < cutoff`. Returns how many were removed.
    pub fn evict(&mut self, cutoff: i64) -> usize {
        let mut removed = 0;
        while self
            .records
            .front()
            .is_some_and(|r| r.start_ms < cutoff)
        {
            self.records.pop_front();
            removed += 1;
        }
        removed
    }

    /// Start of the newest record.
    pub fn latest_start(&self) -> Option<i64> {
        self.records.back().map(|r| r.start_ms)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &SegmentRecord> {
        self.records.iter()
    }
}

/// Shared per-camera index.
#[derive(Debug)]
pub struct RingIndex {
    inner: Mutex<SegmentIndex>,
    latest_tx: watch::Sender<Option<i64>>,
}

impl RingIndex {
    pub fn new(seg_ms: i64) -> Self {
        let (latest_tx, _) = watch::channel(None);
        Self {
            inner: Mutex::new(SegmentIndex::new(seg_ms)),
            latest_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SegmentIndex> {
        // Every critical section is a plain collection operation that cannot
        // leave the index half-updated, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn seg_ms(&self) -> i64 {
        self.lock().seg_ms()
    }

    /// Insert a record, then trim everything older than `horizon_cutoff`.
    pub fn ingest(&self, record: SegmentRecord, horizon_cutoff: i64) -> bool {
        let (inserted, latest) = {
            let mut index = self.lock();
            let inserted = index.ingest(record);
            index.evict(horizon_cutoff);
            (inserted, index.latest_start())
        };
        self.latest_tx.send_replace(latest);
        inserted
    }

    pub fn query_range(&self, from: i64, to: i64) -> Vec<SegmentRecord> {
        self.lock().query_range(from, to)
    }

    pub fn evict(&self, cutoff: i64) -> usize {
        let (removed, latest) = {
            let mut index = self.lock();
            let removed = index.evict(cutoff);
            (removed, index.latest_start())
        };
        self.latest_tx.send_replace(latest);
        removed
    }

    pub fn latest_start(&self) -> Option<i64> {
        self.lock().latest_start()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
        self.latest_tx.send_replace(None);
    }

    /// Copy of the current records, ascending.
    pub fn snapshot(&self) -> Vec<SegmentRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Wait until the newest indexed start reaches `threshold`.
    ///
    /// Returns `true` once covered, `false` if `timeout` elapses first.
    pub async fn wait_for_coverage(&self, threshold: i64, timeout: Duration) -> bool {
        let mut rx = self.latest_tx.subscribe();
        let covered = |latest: &Option<i64>| latest.is_some_and(|start| start >= threshold);

        // The sender lives as long as `self`, so only the timeout can end the wait.
        // The `watch::Ref` must be dropped before `rx`, hence the local.
        let reached = matches!(
            tokio::time::timeout(timeout, rx.wait_for(covered)).await,
            Ok(Ok(_))
        );
        reached
    }
}
