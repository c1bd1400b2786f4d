//! Retention sweeper.
//!
//! Runs on a fixed interval and enforces the ring TTL twice over:
//! - on disk, by deleting every media file older than the retention window
//!   (authoritative: it also catches files the index never saw, e.g. after a
//!   restart)
//! - in the index, by evicting records older than the same cutoff
//!
//! Both steps are idempotent and tolerate per-file failures.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};
use walkdir::WalkDir;

use fallcam_media::fs_utils::{is_media_file, system_time_ms};
use fallcam_models::now_ms;

use crate::faults::{Fault, FaultReporter};
use crate::index::RingIndex;
use crate::metrics::record_segments_swept;

/// Counters from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Media files examined on disk
    pub scanned: usize,
    /// Media files deleted
    pub deleted: usize,
    /// Media files that could not be examined or deleted
    pub failed: usize,
    /// Index records evicted
    pub evicted: usize,
}

/// Periodic ring retention task for one camera.
pub struct RetentionSweeper {
    ring_dir: PathBuf,
    index: Arc<RingIndex>,
    retention_ms: i64,
    max_depth: usize,
    faults: FaultReporter,
}

impl RetentionSweeper {
    pub fn new(
        ring_dir: impl Into<PathBuf>,
        index: Arc<RingIndex>,
        retention: Duration,
        max_depth: usize,
        faults: FaultReporter,
    ) -> Self {
        Self {
            ring_dir: ring_dir.into(),
            index,
            retention_ms: retention.as_millis() as i64,
            max_depth,
            faults,
        }
    }

    /// Delete every media file under the ring directory older than the retention window.
    ///
    /// The walk runs on the blocking pool so it never stalls ingestion or
    /// extraction on the same camera.
    pub async fn sweep_disk(&self, now_ms: i64) -> SweepReport {
        let ring_dir = self.ring_dir.clone();
        let retention_ms = self.retention_ms;
        let max_depth = self.max_depth;
        let faults = self.faults.clone();

        let result = tokio::task::spawn_blocking(move || {
            sweep_dir(&ring_dir, now_ms, retention_ms, max_depth, &faults)
        })
        .await;

        match result {
            Ok(report) => report,
            Err(e) => {
                error!(cam_id = %self.faults.cam_id(), "Disk sweep task failed: {}", e);
                SweepReport::default()
            }
        }
    }

    /// Evict index records older than the retention window.
    pub fn trim_index(&self, now_ms: i64) -> usize {
        self.index.evict(now_ms - self.retention_ms)
    }

    /// One full sweep: disk first, then index.
    pub async fn tick(&self, now_ms: i64) -> SweepReport {
        let mut report = self.sweep_disk(now_ms).await;
        report.evicted = self.trim_index(now_ms);

        record_segments_swept(self.faults.cam_id().as_str(), report.deleted as u64);

        if report.deleted > 0 || report.failed > 0 || report.evicted > 0 {
            info!(
                cam_id = %self.faults.cam_id(),
                scanned = report.scanned,
                deleted = report.deleted,
                failed = report.failed,
                evicted = report.evicted,
                "Retention sweep complete"
            );
        }

        report
    }

    /// Spawn the periodic sweep loop; it exits when `shutdown` flips to true
    /// or its sender is dropped.
    pub fn spawn(self: Arc<Self>, period: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                cam_id = %self.faults.cam_id(),
                "Starting retention sweeper (interval: {:?})", period
            );

            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        self.tick(now_ms()).await;
                    }
                }
            }

            debug!(cam_id = %self.faults.cam_id(), "Retention sweeper stopped");
        })
    }
}

/// Blocking walk-and-delete over one ring directory.
fn sweep_dir(
    ring_dir: &Path,
    now_ms: i64,
    retention_ms: i64,
    max_depth: usize,
    faults: &FaultReporter,
) -> SweepReport {
    let mut report = SweepReport::default();

    for entry in WalkDir::new(ring_dir).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // Unreadable or vanished directories are skipped.
                debug!("Skipping ring entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_media_file(entry.path()) {
            continue;
        }
        report.scanned += 1;

        let mtime_ms = match entry
            .metadata()
            .map_err(|e| e.to_string())
            .and_then(|m| m.modified().map_err(|e| e.to_string()))
            .and_then(|t| system_time_ms(t).map_err(|e| e.to_string()))
        {
            Ok(ms) => ms,
            Err(error) => {
                report.failed += 1;
                faults.report(Fault::StatFailed {
                    path: entry.path().to_path_buf(),
                    error,
                });
                continue;
            }
        };

        if now_ms - mtime_ms <= retention_ms {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => report.deleted += 1,
            // Already gone: nothing left to enforce.
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                report.failed += 1;
                faults.report(Fault::DeleteFailed {
                    path: entry.path().to_path_buf(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}
