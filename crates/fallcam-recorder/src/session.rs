//! Per-camera recorder session.
//!
//! A session owns everything one camera needs: the ring index, the
//! extractor, the ingest consumer, the retention sweeper, the arrival
//! subscription and the segment producer. Sessions share nothing with
//! each other.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, trace, warn};

use fallcam_media::fs_utils::is_media_file;
use fallcam_models::{now_ms, CameraId, CameraSpec, FallOutcome, SegmentRecord};

use crate::config::RecorderConfig;
use crate::error::RecorderResult;
use crate::extractor::{ClipExtractor, Concatenator, ExtractorSettings, FfmpegConcatenator};
use crate::faults::{Fault, FaultReporter};
use crate::feed::{ArrivalFeed, FeedSubscription, PollingFeed, SegmentArrival};
use crate::index::{derive_start_ms, RingIndex};
use crate::logging::CameraLogger;
use crate::metrics::{record_ingest_latency, record_segment_indexed};
use crate::producer::{FfmpegSegmenter, SegmentProducer};
use crate::sweeper::RetentionSweeper;

/// Capacity of the arrival queue between the feed and the ingest consumer.
pub const ARRIVAL_QUEUE_CAPACITY: usize = 256;

/// Upper bound on each teardown step.
pub const STOP_STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Pluggable capabilities of a session.
pub struct SessionDeps {
    pub producer: Box<dyn SegmentProducer>,
    pub feed: Arc<dyn ArrivalFeed>,
    pub concat: Arc<dyn Concatenator>,
    pub faults: FaultReporter,
}

impl SessionDeps {
    /// FFmpeg segmenter, polling feed, FFmpeg concat, log-only faults.
    pub fn production(cam_id: &CameraId, config: &RecorderConfig) -> Self {
        Self {
            producer: Box::new(FfmpegSegmenter::new(config.segment_ms)),
            feed: Arc::new(PollingFeed::new(
                config.feed_poll_interval,
                config.feed_max_depth,
            )),
            concat: Arc::new(FfmpegConcatenator::from_config(config)),
            faults: FaultReporter::log_only(cam_id.clone()),
        }
    }
}

/// Tasks and handles that exist only while the session runs.
struct Running {
    sweeper_shutdown: watch::Sender<bool>,
    sweeper: Option<JoinHandle<()>>,
    ingest: Option<JoinHandle<()>>,
    subscription: Option<FeedSubscription>,
}

impl Running {
    fn new() -> Self {
        let (sweeper_shutdown, _) = watch::channel(false);
        Self {
            sweeper_shutdown,
            sweeper: None,
            ingest: None,
            subscription: None,
        }
    }
}

pub struct CameraRecorderSession {
    cam_id: CameraId,
    spec: CameraSpec,
    config: Arc<RecorderConfig>,
    ring_dir: PathBuf,
    archive_dir: PathBuf,
    index: Arc<RingIndex>,
    extractor: ClipExtractor,
    feed: Arc<dyn ArrivalFeed>,
    producer: Mutex<Box<dyn SegmentProducer>>,
    running: Mutex<Option<Running>>,
    faults: FaultReporter,
    logger: CameraLogger,
}

impl CameraRecorderSession {
    pub fn new(
        cam_id: CameraId,
        spec: CameraSpec,
        config: Arc<RecorderConfig>,
        deps: SessionDeps,
    ) -> Self {
        let ring_dir = config.ring_base(&cam_id);
        let archive_dir = config.archive_base(&cam_id);
        let index = Arc::new(RingIndex::new(config.segment_ms));
        let extractor = ClipExtractor::new(
            cam_id.clone(),
            Arc::clone(&index),
            archive_dir.clone(),
            ExtractorSettings::from(config.as_ref()),
            deps.concat,
            deps.faults.clone(),
        );

        Self {
            logger: CameraLogger::new(&cam_id, "session"),
            cam_id,
            spec,
            config,
            ring_dir,
            archive_dir,
            index,
            extractor,
            feed: deps.feed,
            producer: Mutex::new(deps.producer),
            running: Mutex::new(None),
            faults: deps.faults,
        }
    }

    pub fn cam_id(&self) -> &CameraId {
        &self.cam_id
    }

    pub fn spec(&self) -> &CameraSpec {
        &self.spec
    }

    pub fn ring_dir(&self) -> &Path {
        &self.ring_dir
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    pub fn index(&self) -> &Arc<RingIndex> {
        &self.index
    }

    pub fn faults(&self) -> &FaultReporter {
        &self.faults
    }

    pub fn last_fall_ms(&self) -> Option<i64> {
        self.extractor.last_fall_ms()
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    pub async fn producer_running(&self) -> bool {
        self.producer.lock().await.is_running()
    }

    /// Start recording. A running session is left as is.
    ///
    /// On failure everything started so far is torn down again before the
    /// error is returned, so the session can be started later.
    pub async fn start(&self) -> RecorderResult<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            debug!(cam_id = %self.cam_id, "Session already running");
            return Ok(());
        }

        let mut rt = Running::new();
        match self.start_steps(&mut rt).await {
            Ok(()) => {
                *running = Some(rt);
                self.logger.log_info(&format!(
                    "Recording started (ring: {}, archive: {})",
                    self.ring_dir.display(),
                    self.archive_dir.display()
                ));
                Ok(())
            }
            Err(e) => {
                self.logger
                    .log_error(&format!("Session start failed: {}", e));
                self.teardown(rt).await;
                Err(e)
            }
        }
    }

    async fn start_steps(&self, rt: &mut Running) -> RecorderResult<()> {
        tokio::fs::create_dir_all(&self.ring_dir).await?;
        tokio::fs::create_dir_all(&self.archive_dir).await?;

        // Cold start: the feed re-reports whatever survived in the ring.
        self.index.clear();

        let (tx, rx) = mpsc::channel(ARRIVAL_QUEUE_CAPACITY);
        let consumer = tokio::spawn(ingest_loop(
            Arc::clone(&self.index),
            self.config.segment_ms,
            self.config.index_horizon_ms(),
            self.faults.clone(),
            rx,
        ));
        rt.ingest = Some(tokio::spawn(supervise_ingest(
            self.cam_id.clone(),
            consumer,
            rt.sweeper_shutdown.subscribe(),
        )));

        rt.subscription = Some(self.feed.subscribe(&self.ring_dir, tx).await?);

        let sweeper = Arc::new(RetentionSweeper::new(
            self.ring_dir.clone(),
            Arc::clone(&self.index),
            self.config.retention,
            self.config.sweep_max_depth,
            self.faults.clone(),
        ));
        rt.sweeper = Some(sweeper.spawn(
            self.config.sweep_interval,
            rt.sweeper_shutdown.subscribe(),
        ));

        self.producer
            .lock()
            .await
            .start(&self.spec, &self.ring_dir)
            .await
    }

    /// Stop recording. Idempotent; never waits on running extractions.
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        let Some(rt) = running.take() else {
            debug!(cam_id = %self.cam_id, "Session not running");
            return;
        };

        self.teardown(rt).await;
        self.logger.log_info("Recording stopped");
    }

    /// Stop sweeper, close the feed, drain ingest, stop the producer.
    /// Each step is bounded and a failing step does not skip the rest.
    async fn teardown(&self, mut rt: Running) {
        let _ = rt.sweeper_shutdown.send(true);
        if let Some(task) = rt.sweeper.take() {
            self.join_bounded("sweeper", task).await;
        }

        if let Some(mut subscription) = rt.subscription.take() {
            subscription.close(STOP_STEP_TIMEOUT).await;
        }

        // The consumer ends once the feed has dropped its sender.
        if let Some(task) = rt.ingest.take() {
            self.join_bounded("ingest", task).await;
        }

        let mut producer = self.producer.lock().await;
        match tokio::time::timeout(STOP_STEP_TIMEOUT, producer.stop()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self
                .logger
                .log_warning(&format!("Producer stop failed: {}", e)),
            Err(_) => self.logger.log_warning("Producer stop timed out"),
        }
    }

    async fn join_bounded(&self, name: &str, mut task: JoinHandle<()>) {
        match tokio::time::timeout(STOP_STEP_TIMEOUT, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(cam_id = %self.cam_id, task = name, "Task ended abnormally: {}", e),
            Err(_) => {
                warn!(cam_id = %self.cam_id, task = name, "Task did not stop in time, aborting");
                task.abort();
            }
        }
    }

    /// Extract a clip around `event_ms`.
    pub async fn fall_detected(&self, event_ms: i64) -> RecorderResult<FallOutcome> {
        self.extractor.fall_detected(event_ms).await
    }
}

/// The single ingest consumer: stat, derive start, insert.
async fn ingest_loop(
    index: Arc<RingIndex>,
    seg_ms: i64,
    horizon_ms: i64,
    faults: FaultReporter,
    mut rx: mpsc::Receiver<SegmentArrival>,
) {
    while let Some(arrival) = rx.recv().await {
        if !is_media_file(&arrival.path) {
            continue;
        }

        match derive_start_ms(&arrival.path, seg_ms).await {
            Ok(start_ms) => {
                let now = now_ms();
                let latency_ms = arrival.latency_ms(now);
                let record = SegmentRecord::new(start_ms, arrival.path);
                if index.ingest(record, now - horizon_ms) {
                    record_segment_indexed(faults.cam_id().as_str());
                    record_ingest_latency(faults.cam_id().as_str(), latency_ms);
                    trace!(cam_id = %faults.cam_id(), start_ms, latency_ms, "Segment indexed");
                }
            }
            Err(e) => faults.report(Fault::StatFailed {
                path: arrival.path,
                error: e.to_string(),
            }),
        }
    }

    debug!(cam_id = %faults.cam_id(), "Ingest consumer stopped");
}

/// How the ingest consumer ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IngestExit {
    /// Ended after the session began stopping.
    Stopped,
    /// Ended on its own while the session was still running.
    Closed,
    Panicked,
}

/// Await the ingest consumer and log if it ends before the session stops.
///
/// `stopping` is the session's shutdown flag. Aborting the supervisor
/// aborts the consumer with it.
async fn supervise_ingest(
    cam_id: CameraId,
    consumer: JoinHandle<()>,
    stopping: watch::Receiver<bool>,
) {
    let exit = watch_ingest(consumer, &stopping).await;
    match exit {
        IngestExit::Stopped => {}
        IngestExit::Closed => {
            warn!(cam_id = %cam_id, "Ingest consumer ended while recording, arrivals are no longer indexed")
        }
        IngestExit::Panicked => {
            error!(cam_id = %cam_id, "Ingest consumer panicked, arrivals are no longer indexed")
        }
    }
}

async fn watch_ingest(consumer: JoinHandle<()>, stopping: &watch::Receiver<bool>) -> IngestExit {
    struct AbortOnDrop(AbortHandle);
    impl Drop for AbortOnDrop {
        fn drop(&mut self) {
            self.0.abort();
        }
    }

    let _abort = AbortOnDrop(consumer.abort_handle());
    let result = consumer.await;

    match result {
        Err(e) if e.is_panic() => IngestExit::Panicked,
        _ if *stopping.borrow() => IngestExit::Stopped,
        _ => IngestExit::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ingest_panic_is_detected_while_running() {
        let (_stop_tx, stopping) = watch::channel(false);
        let consumer = tokio::spawn(async { panic!("index poisoned") });

        assert_eq!(watch_ingest(consumer, &stopping).await, IngestExit::Panicked);
    }

    #[tokio::test]
    async fn test_ingest_end_while_running_is_unexpected() {
        let (_stop_tx, stopping) = watch::channel(false);
        let consumer = tokio::spawn(async {});

        assert_eq!(watch_ingest(consumer, &stopping).await, IngestExit::Closed);
    }

    #[tokio::test]
    async fn test_ingest_end_after_stop_is_expected() {
        let (stop_tx, stopping) = watch::channel(false);
        stop_tx.send(true).unwrap();
        let consumer = tokio::spawn(async {});

        assert_eq!(watch_ingest(consumer, &stopping).await, IngestExit::Stopped);
    }

    #[tokio::test]
    async fn test_aborting_supervisor_aborts_consumer() {
        let (_stop_tx, stopping) = watch::channel(false);
        let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
        let consumer = tokio::spawn(async move {
            let _held = done_tx;
            std::future::pending::<()>().await
        });

        let supervisor = tokio::spawn(supervise_ingest(CameraId::from("cam01"), consumer, stopping));
        tokio::time::sleep(Duration::from_millis(20)).await;
        supervisor.abort();

        // The consumer's sender half is dropped only once it has been aborted.
        let ended = tokio::time::timeout(Duration::from_secs(2), done_rx).await;
        assert!(matches!(ended, Ok(Err(_))));
    }
}
