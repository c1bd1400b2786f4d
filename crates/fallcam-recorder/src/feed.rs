//! Segment arrival feeds.
//!
//! A feed reports newly completed segment files in a ring directory. Each
//! arrival is pushed into the session's bounded ingest channel, which has a
//! single consumer.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};
use walkdir::WalkDir;

use fallcam_media::fs_utils::is_media_file;
use fallcam_models::now_ms;

use crate::error::{RecorderError, RecorderResult};

/// A segment file that appeared in the ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentArrival {
    pub path: PathBuf,
    pub discovered_at_ms: i64,
}

impl SegmentArrival {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            discovered_at_ms: now_ms(),
        }
    }

    /// Milliseconds between discovery and `now`; clock steps backwards
    /// read as zero.
    pub fn latency_ms(&self, now: i64) -> i64 {
        now.saturating_sub(self.discovered_at_ms).max(0)
    }
}

/// Handle to an active feed; closing it stops further arrivals.
#[derive(Debug)]
pub struct FeedSubscription {
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl FeedSubscription {
    pub fn new(shutdown: watch::Sender<bool>, task: JoinHandle<()>) -> Self {
        Self {
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_none()
    }

    /// Signal the feed task and wait up to `timeout` for it to finish;
    /// a task that outlives the timeout is aborted.
    pub async fn close(&mut self, timeout: Duration) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }

        let Some(mut task) = self.task.take() else {
            return;
        };

        if tokio::time::timeout(timeout, &mut task).await.is_err() {
            warn!("Feed task did not stop within {:?}, aborting", timeout);
            task.abort();
        }
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[async_trait]
pub trait ArrivalFeed: Send + Sync {
    /// Start delivering arrivals under `ring_dir` into `tx`.
    async fn subscribe(
        &self,
        ring_dir: &Path,
        tx: mpsc::Sender<SegmentArrival>,
    ) -> RecorderResult<FeedSubscription>;
}

/// Periodically walks the ring directory and emits files it has not seen.
///
/// The first scan reports every file already present, so a restarted
/// session re-indexes the surviving ring.
#[derive(Debug, Clone)]
pub struct PollingFeed {
    period: Duration,
    max_depth: usize,
}

impl PollingFeed {
    pub fn new(period: Duration, max_depth: usize) -> Self {
        Self { period, max_depth }
    }
}

/// Media files under `dir`, sorted (chronological for timestamped names).
fn scan_media(dir: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_media_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    found
}

#[async_trait]
impl ArrivalFeed for PollingFeed {
    async fn subscribe(
        &self,
        ring_dir: &Path,
        tx: mpsc::Sender<SegmentArrival>,
    ) -> RecorderResult<FeedSubscription> {
        let ring_dir = ring_dir.to_path_buf();
        let period = self.period;
        let max_depth = self.max_depth;
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut seen: HashSet<PathBuf> = HashSet::new();
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let dir = ring_dir.clone();
                        let found = match tokio::task::spawn_blocking(move || scan_media(&dir, max_depth)).await {
                            Ok(found) => found,
                            Err(e) => {
                                warn!("Ring scan failed: {}", e);
                                continue;
                            }
                        };

                        for path in &found {
                            if seen.contains(path) {
                                continue;
                            }
                            if tx.send(SegmentArrival::new(path.clone())).await.is_err() {
                                debug!("Arrival receiver closed, stopping feed");
                                return;
                            }
                        }
                        // Forget files the sweeper removed.
                        seen = found.into_iter().collect();
                    }
                }
            }
        });

        Ok(FeedSubscription::new(shutdown_tx, task))
    }
}

/// Feed driven by an external watcher that pushes `{path}` notifications.
#[derive(Debug, Clone, Default)]
pub struct ChannelFeed {
    slot: Arc<Mutex<Option<mpsc::Sender<SegmentArrival>>>>,
}

impl ChannelFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self) -> Option<mpsc::Sender<SegmentArrival>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_subscribed(&self) -> bool {
        self.sender().is_some()
    }

    /// Report a completed segment. Fails when no session is subscribed.
    pub async fn notify(&self, path: impl Into<PathBuf>) -> RecorderResult<()> {
        let tx = self
            .sender()
            .ok_or_else(|| RecorderError::feed("no active subscription"))?;
        tx.send(SegmentArrival::new(path))
            .await
            .map_err(|_| RecorderError::feed("arrival receiver closed"))
    }
}

#[async_trait]
impl ArrivalFeed for ChannelFeed {
    async fn subscribe(
        &self,
        _ring_dir: &Path,
        tx: mpsc::Sender<SegmentArrival>,
    ) -> RecorderResult<FeedSubscription> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);

        let slot = Arc::clone(&self.slot);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let _ = shutdown_rx.wait_for(|closed| *closed).await;
            slot.lock().unwrap_or_else(|e| e.into_inner()).take();
        });

        Ok(FeedSubscription::new(shutdown_tx, task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

    #[test]
    fn test_arrival_latency() {
        let arrival = SegmentArrival {
            path: PathBuf::from("/ring/cam01/seg.mp4"),
            discovered_at_ms: 10_000,
        };
        assert_eq!(arrival.latency_ms(10_250), 250);
        assert_eq!(arrival.latency_ms(9_000), 0);
        assert_eq!(arrival.latency_ms(i64::MIN), 0);
    }

    async fn recv(rx: &mut mpsc::Receiver<SegmentArrival>) -> PathBuf {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no arrival")
            .expect("feed closed")
            .path
    }

    #[tokio::test]
    async fn test_polling_feed_reports_existing_then_new() {
        let dir = TempDir::new().unwrap();
        let hour = dir.path().join("20240101").join("12");
        std::fs::create_dir_all(&hour).unwrap();
        let first = hour.join("20240101120000_1704110400.mp4");
        std::fs::write(&first, b"a").unwrap();
        std::fs::write(hour.join("notes.txt"), b"x").unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let feed = PollingFeed::new(Duration::from_millis(20), 3);
        let mut sub = feed.subscribe(dir.path(), tx).await.unwrap();

        assert_eq!(recv(&mut rx).await, first);

        let second = hour.join("20240101120002_1704110402.mp4");
        std::fs::write(&second, b"b").unwrap();
        assert_eq!(recv(&mut rx).await, second);

        // Nothing is reported twice.
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(rx.try_recv().is_err());

        sub.close(CLOSE_TIMEOUT).await;
        assert!(sub.is_closed());
    }

    #[tokio::test]
    async fn test_channel_feed_forwards_until_closed() {
        let feed = ChannelFeed::new();
        assert!(feed.notify("/r/a.mp4").await.is_err());

        let (tx, mut rx) = mpsc::channel(4);
        let mut sub = feed.subscribe(Path::new("/r"), tx).await.unwrap();
        feed.notify("/r/a.mp4").await.unwrap();
        assert_eq!(recv(&mut rx).await, PathBuf::from("/r/a.mp4"));

        sub.close(CLOSE_TIMEOUT).await;
        assert!(!feed.is_subscribed());
        assert!(feed.notify("/r/b.mp4").await.is_err());

        // Closing twice is harmless.
        sub.close(CLOSE_TIMEOUT).await;
    }
}
