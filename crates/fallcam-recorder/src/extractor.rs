//! Event-triggered clip extraction.
//!
//! `fall_detected` walks one event through:
//! cooldown check → coverage wait → segment selection → staging →
//! lossless concat → cleanup → metadata write.
//!
//! The extractor keeps no state between events beyond the cooldown gate.
//! Ring originals are only ever copied; the sweeper ages them out.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn, Instrument};

use fallcam_media::fs_utils::remove_all_best_effort;
use fallcam_media::{concat_copy, write_manifest, FfmpegRunner, MediaResult};
use fallcam_models::{
    clip_file_name, CameraId, ClipDescriptor, ClipMetadata, FallOutcome, SegmentRecord,
    METADATA_FILE_NAME,
};

use crate::config::RecorderConfig;
use crate::error::{RecorderError, RecorderResult};
use crate::faults::{Fault, FaultReporter};
use crate::index::RingIndex;
use crate::logging::CameraLogger;
use crate::metrics::{record_extraction_duration, record_fall};

/// Name of the concat manifest inside an event directory.
pub const MANIFEST_FILE_NAME: &str = "list.txt";

/// Lossless concatenation of a manifest into one clip.
#[async_trait]
pub trait Concatenator: Send + Sync {
    async fn concat(&self, manifest: &Path, output: &Path) -> MediaResult<()>;
}

/// Concatenation through the FFmpeg concat demuxer with stream copy.
#[derive(Debug, Clone, Default)]
pub struct FfmpegConcatenator {
    runner: FfmpegRunner,
}

impl FfmpegConcatenator {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }

    /// Concatenator bounded by the configured concat timeout.
    pub fn from_config(config: &RecorderConfig) -> Self {
        Self::new(FfmpegRunner::new().with_timeout(config.concat_timeout.as_secs().max(1)))
    }
}

#[async_trait]
impl Concatenator for FfmpegConcatenator {
    async fn concat(&self, manifest: &Path, output: &Path) -> MediaResult<()> {
        concat_copy(&self.runner, manifest, output).await
    }
}

/// Extraction timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorSettings {
    pub seg_ms: i64,
    pub pre_event_ms: i64,
    pub post_event_ms: i64,
    pub cooldown_ms: i64,
    pub coverage_timeout: Duration,
}

impl From<&RecorderConfig> for ExtractorSettings {
    fn from(config: &RecorderConfig) -> Self {
        Self {
            seg_ms: config.segment_ms,
            pre_event_ms: config.pre_event_ms,
            post_event_ms: config.post_event_ms,
            cooldown_ms: config.cooldown_ms,
            coverage_timeout: config.coverage_timeout,
        }
    }
}

/// The `[from, to)` clip window of one event and the segment start that
/// covers its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub from: i64,
    pub to: i64,
    pub threshold: i64,
}

impl ExtractorSettings {
    /// Window around `event_ms`, or `None` when a bound overflows.
    pub fn window(&self, event_ms: i64) -> Option<EventWindow> {
        let from = event_ms.checked_sub(self.pre_event_ms)?;
        let to = event_ms.checked_add(self.post_event_ms)?;
        let threshold = to.checked_sub(self.seg_ms)?;
        Some(EventWindow {
            from,
            to,
            threshold,
        })
    }
}

#[derive(Debug, Default)]
struct GateState {
    last_fall_ms: Option<i64>,
    in_flight: HashSet<i64>,
}

/// Per-camera duplicate suppression.
///
/// The cooldown check and the `last_fall_ms` update happen under one lock,
/// so two near-simultaneous events cannot both pass.
#[derive(Debug)]
pub struct CooldownGate {
    cooldown_ms: i64,
    state: Mutex<GateState>,
}

/// Held while an accepted event is being extracted.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    gate: &'a CooldownGate,
    event_ms: i64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.gate.lock().in_flight.remove(&self.event_ms);
    }
}

impl CooldownGate {
    pub fn new(cooldown_ms: i64) -> Self {
        Self {
            cooldown_ms,
            state: Mutex::new(GateState::default()),
        }
    }

    /// Gate that already saw an event at `last_fall_ms`.
    pub fn with_last_fall(cooldown_ms: i64, last_fall_ms: i64) -> Self {
        let gate = Self::new(cooldown_ms);
        gate.lock().last_fall_ms = Some(last_fall_ms);
        gate
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn last_fall_ms(&self) -> Option<i64> {
        self.lock().last_fall_ms
    }

    /// Accept or reject an event.
    ///
    /// A rejection leaves the gate untouched. Acceptance records
    /// `last_fall_ms = event_ms` and marks the event in flight until the
    /// returned guard is dropped.
    pub fn try_accept(&self, event_ms: i64) -> Result<InFlightGuard<'_>, FallOutcome> {
        let mut state = self.lock();

        if let Some(last) = state.last_fall_ms {
            if self.cooldown_ms > 0 && event_ms.saturating_sub(last) < self.cooldown_ms {
                return Err(FallOutcome::Cooldown { last_fall_ms: last });
            }
        }

        if !state.in_flight.insert(event_ms) {
            return Err(FallOutcome::InFlight { event_ms });
        }
        state.last_fall_ms = Some(event_ms);

        Ok(InFlightGuard {
            gate: self,
            event_ms,
        })
    }
}

/// Turns a point-in-time fall event into an archived clip for one camera.
pub struct ClipExtractor {
    cam_id: CameraId,
    index: Arc<RingIndex>,
    archive_base: PathBuf,
    settings: ExtractorSettings,
    gate: CooldownGate,
    concat: Arc<dyn Concatenator>,
    faults: FaultReporter,
    logger: CameraLogger,
}

impl ClipExtractor {
    pub fn new(
        cam_id: CameraId,
        index: Arc<RingIndex>,
        archive_base: impl Into<PathBuf>,
        settings: ExtractorSettings,
        concat: Arc<dyn Concatenator>,
        faults: FaultReporter,
    ) -> Self {
        let logger = CameraLogger::new(&cam_id, "extractor");
        Self {
            gate: CooldownGate::new(settings.cooldown_ms),
            cam_id,
            index,
            archive_base: archive_base.into(),
            settings,
            concat,
            faults,
            logger,
        }
    }

    pub fn cam_id(&self) -> &CameraId {
        &self.cam_id
    }

    pub fn last_fall_ms(&self) -> Option<i64> {
        self.gate.last_fall_ms()
    }

    /// Archive directory for one event.
    pub fn event_dir(&self, event_ms: i64) -> PathBuf {
        self.archive_base.join(event_ms.to_string())
    }

    /// Handle one fall event.
    ///
    /// Cooldown rejections and windows with no footage are reported as
    /// outcomes with no side effects. A failed concatenation is an error
    /// that leaves the staged copies and manifest in the event directory.
    /// An event whose window overflows is rejected before the cooldown gate.
    pub async fn fall_detected(&self, event_ms: i64) -> RecorderResult<FallOutcome> {
        let span = self.logger.event_span(event_ms);
        let started = Instant::now();

        let result = async {
            let Some(window) = self.settings.window(event_ms) else {
                warn!("Fall rejected, event time out of range");
                return Err(RecorderError::InvalidEvent(event_ms));
            };

            let _guard = match self.gate.try_accept(event_ms) {
                Ok(guard) => guard,
                Err(outcome) => {
                    info!("Fall ignored ({})", outcome.as_str());
                    return Ok(outcome);
                }
            };

            self.extract(event_ms, window).await
        }
        .instrument(span)
        .await;

        let label = match &result {
            Ok(outcome) => outcome.as_str(),
            Err(_) => "failed",
        };
        record_fall(self.cam_id.as_str(), label);
        if matches!(result, Ok(FallOutcome::Saved(_))) {
            record_extraction_duration(self.cam_id.as_str(), started.elapsed().as_secs_f64());
        }

        result
    }

    async fn extract(&self, event_ms: i64, window: EventWindow) -> RecorderResult<FallOutcome> {
        let EventWindow {
            from,
            to,
            threshold,
        } = window;

        // Coverage: wait for the segment that reaches `to`, but never longer
        // than the timeout; a short window is still extracted.
        if !self
            .index
            .wait_for_coverage(threshold, self.settings.coverage_timeout)
            .await
        {
            warn!(
                latest_start = ?self.index.latest_start(),
                threshold,
                "Coverage wait timed out, extracting available footage"
            );
        }

        let segments = self.index.query_range(from, to);
        if segments.is_empty() {
            info!(from, to, "No segments found for fall");
            return Ok(FallOutcome::NoFootage { from, to });
        }

        let event_dir = self.event_dir(event_ms);
        tokio::fs::create_dir_all(&event_dir).await?;

        let staged = self.stage(&segments, &event_dir).await;
        let segment_count = staged.len();

        let manifest = event_dir.join(MANIFEST_FILE_NAME);
        let output = event_dir.join(clip_file_name(&self.cam_id, event_ms));

        write_manifest(&manifest, &staged)
            .await
            .map_err(|source| RecorderError::ConcatFailed {
                event_dir: event_dir.clone(),
                source,
            })?;

        if let Err(source) = self.concat.concat(&manifest, &output).await {
            self.logger.log_error(&format!(
                "Concat failed for event {}, staged files kept in {}: {}",
                event_ms,
                event_dir.display(),
                source
            ));
            return Err(RecorderError::ConcatFailed { event_dir, source });
        }

        self.cleanup(&staged, &manifest).await;

        let metadata = ClipMetadata {
            cam_id: self.cam_id.clone(),
            event_ms,
            from,
            to,
            segment_count,
        };
        tokio::fs::write(
            event_dir.join(METADATA_FILE_NAME),
            serde_json::to_string_pretty(&metadata)?,
        )
        .await?;

        self.logger
            .log_info(&format!("Saved fall clip -> {}", output.display()));

        Ok(FallOutcome::Saved(ClipDescriptor {
            output_path: output,
            event_ms,
            from,
            to,
        }))
    }

    /// Copy the selected segments into the event directory.
    ///
    /// A failed copy is reported but its destination stays in the returned
    /// list, so the manifest still names it.
    async fn stage(&self, segments: &[SegmentRecord], event_dir: &Path) -> Vec<PathBuf> {
        let mut staged = Vec::with_capacity(segments.len());

        for segment in segments {
            let name = segment
                .path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| format!("seg_{}.mp4", segment.start_ms).into());
            let dest = event_dir.join(name);

            if let Err(e) = tokio::fs::copy(&segment.path, &dest).await {
                self.faults.report(Fault::CopyFailed {
                    source: segment.path.clone(),
                    dest: dest.clone(),
                    error: e.to_string(),
                });
            }
            staged.push(dest);
        }

        // Names carry zero-padded timestamps: lexical order is playback order.
        staged.sort();
        debug!(count = staged.len(), "Staged segments");
        staged
    }

    /// Remove staged copies and the manifest once the clip is self-contained.
    async fn cleanup(&self, staged: &[PathBuf], manifest: &Path) {
        let mut paths = staged.to_vec();
        paths.push(manifest.to_path_buf());

        for (path, e) in remove_all_best_effort(&paths).await {
            if e.kind() == std::io::ErrorKind::NotFound {
                continue;
            }
            self.faults.report(Fault::CleanupFailed {
                path,
                error: e.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tokio::sync::mpsc::UnboundedReceiver;

    use crate::faults::CameraFault;
    use fallcam_media::MediaError;

    const SEG_MS: i64 = 2000;

    /// Concatenates staged files byte-wise; fails on a missing input the
    /// way the concat demuxer does.
    #[derive(Default)]
    struct ByteConcat {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Concatenator for ByteConcat {
        async fn concat(&self, manifest: &Path, output: &Path) -> MediaResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = tokio::fs::read_to_string(manifest).await?;
            let mut out = Vec::new();
            for line in body.lines() {
                let path = line
                    .strip_prefix("file '")
                    .and_then(|l| l.strip_suffix('\''))
                    .ok_or_else(|| MediaError::internal("bad manifest line"))?;
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|_| MediaError::FileNotFound(PathBuf::from(path)))?;
                out.extend(bytes);
            }
            tokio::fs::write(output, out).await?;
            Ok(())
        }
    }

    struct FailingConcat;

    #[async_trait]
    impl Concatenator for FailingConcat {
        async fn concat(&self, _manifest: &Path, _output: &Path) -> MediaResult<()> {
            Err(MediaError::ffmpeg_failed("boom", None, Some(1)))
        }
    }

    struct Fixture {
        _dir: TempDir,
        ring: PathBuf,
        archive: PathBuf,
        index: Arc<RingIndex>,
        faults_rx: UnboundedReceiver<CameraFault>,
    }

    fn fixture() -> (Fixture, FaultReporter) {
        let dir = TempDir::new().unwrap();
        let ring = dir.path().join("ring").join("cam01");
        let archive = dir.path().join("archive").join("cam01");
        std::fs::create_dir_all(&ring).unwrap();
        let (faults, faults_rx) = FaultReporter::channel(CameraId::from("cam01"));
        (
            Fixture {
                _dir: dir,
                ring,
                archive,
                index: Arc::new(RingIndex::new(SEG_MS)),
                faults_rx,
            },
            faults,
        )
    }

    fn settings(cooldown_ms: i64) -> ExtractorSettings {
        ExtractorSettings {
            seg_ms: SEG_MS,
            pre_event_ms: 4000,
            post_event_ms: 4000,
            cooldown_ms,
            coverage_timeout: Duration::from_millis(50),
        }
    }

    /// Write a segment whose name encodes `start_ms` and index it.
    fn add_segment(fx: &Fixture, start_ms: i64) -> PathBuf {
        let path = fx.ring.join(format!("seg_{:013}_{}.mp4", start_ms, start_ms / 1000));
        std::fs::write(&path, format!("[{}]", start_ms)).unwrap();
        fx.index.ingest(SegmentRecord::new(start_ms, &path), 0);
        path
    }

    fn extractor(fx: &Fixture, faults: FaultReporter, concat: Arc<dyn Concatenator>, cooldown_ms: i64) -> ClipExtractor {
        ClipExtractor::new(
            CameraId::from("cam01"),
            Arc::clone(&fx.index),
            &fx.archive,
            settings(cooldown_ms),
            concat,
            faults,
        )
    }

    #[test]
    fn test_cooldown_gating() {
        let gate = CooldownGate::with_last_fall(20_000, 10_000);

        let rejected = tokio_test::assert_err!(gate.try_accept(25_000));
        assert_eq!(rejected, FallOutcome::Cooldown { last_fall_ms: 10_000 });
        assert_eq!(gate.last_fall_ms(), Some(10_000));

        drop(tokio_test::assert_ok!(gate.try_accept(31_000)));
        assert_eq!(gate.last_fall_ms(), Some(31_000));
    }

    #[test]
    fn test_first_event_always_accepted() {
        let gate = CooldownGate::new(20_000);
        assert!(gate.try_accept(5).is_ok());
    }

    #[test]
    fn test_zero_cooldown_rejects_identical_in_flight_event() {
        let gate = CooldownGate::new(0);
        let guard = gate.try_accept(50_000).unwrap();
        assert_eq!(
            gate.try_accept(50_000).unwrap_err(),
            FallOutcome::InFlight { event_ms: 50_000 }
        );
        assert!(gate.try_accept(50_001).is_ok());
        drop(guard);
        assert!(gate.try_accept(50_000).is_ok());
    }

    #[test]
    fn test_window_bounds() {
        let s = settings(0);
        assert_eq!(
            s.window(10_000),
            Some(EventWindow {
                from: 6000,
                to: 14_000,
                threshold: 12_000
            })
        );
        assert_eq!(s.window(i64::MAX - 1), None);
        assert_eq!(s.window(i64::MIN + 1), None);
    }

    #[test]
    fn test_gate_survives_extreme_gap() {
        let gate = CooldownGate::with_last_fall(20_000, i64::MIN + 1);
        assert!(gate.try_accept(i64::MAX - 1).is_ok());
    }

    #[tokio::test]
    async fn test_out_of_range_event_leaves_gate_untouched() {
        let (fx, faults) = fixture();
        add_segment(&fx, 96_000);
        let ex = extractor(&fx, faults, Arc::new(ByteConcat::default()), 20_000);

        let err = ex.fall_detected(i64::MAX - 1).await.unwrap_err();
        assert!(matches!(err, RecorderError::InvalidEvent(ms) if ms == i64::MAX - 1));
        assert_eq!(ex.last_fall_ms(), None);
        assert!(!fx.archive.exists());

        // A real event afterwards is not held back by a cooldown.
        let outcome = ex.fall_detected(100_000).await.unwrap();
        assert!(!matches!(outcome, FallOutcome::Cooldown { .. }));
        assert_eq!(ex.last_fall_ms(), Some(100_000));
    }

    #[test]
    fn test_concurrent_gate_accepts_one() {
        let gate = Arc::new(CooldownGate::new(20_000));
        let accepted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let gate = Arc::clone(&gate);
                let accepted = Arc::clone(&accepted);
                std::thread::spawn(move || {
                    if gate.try_accept(100_000 + i).is_ok() {
                        accepted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_successful_extraction() {
        let (fx, faults) = fixture();
        for start in [0, 2000, 4000, 6000, 8000, 10_000, 12_000, 14_000] {
            add_segment(&fx, start);
        }
        let concat = Arc::new(ByteConcat::default());
        let ex = extractor(&fx, faults, concat.clone(), 20_000);

        // window [6000, 14000) -> segments 6000..12000
        let outcome = ex.fall_detected(10_000).await.unwrap();
        let clip = outcome.clip().expect("clip saved").clone();

        assert_eq!(clip.from, 6000);
        assert_eq!(clip.to, 14_000);
        assert_eq!(clip.output_path, fx.archive.join("10000").join("fall_cam01_10000.mp4"));

        let body = std::fs::read_to_string(&clip.output_path).unwrap();
        assert_eq!(body, "[6000][8000][10000][12000]");

        let meta: ClipMetadata = serde_json::from_str(
            &std::fs::read_to_string(fx.archive.join("10000").join("meta.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(meta.segment_count, 4);
        assert_eq!((meta.from, meta.to, meta.event_ms), (6000, 14_000, 10_000));

        // Only the clip and its metadata remain.
        let mut names: Vec<String> = std::fs::read_dir(fx.archive.join("10000"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["fall_cam01_10000.mp4", "meta.json"]);

        // Ring originals are untouched.
        assert_eq!(std::fs::read_dir(&fx.ring).unwrap().count(), 8);
        assert_eq!(concat.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_footage_has_no_side_effects() {
        let (fx, faults) = fixture();
        add_segment(&fx, 0);
        let ex = extractor(&fx, faults, Arc::new(ByteConcat::default()), 20_000);

        let outcome = ex.fall_detected(100_000).await.unwrap();

        assert_eq!(outcome, FallOutcome::NoFootage { from: 96_000, to: 104_000 });
        assert!(!fx.archive.exists());
        assert_eq!(ex.last_fall_ms(), Some(100_000));
    }

    #[tokio::test]
    async fn test_cooldown_rejection_has_no_side_effects() {
        let (fx, faults) = fixture();
        for start in [6000, 8000, 10_000, 12_000] {
            add_segment(&fx, start);
        }
        let concat = Arc::new(ByteConcat::default());
        let ex = extractor(&fx, faults, concat.clone(), 20_000);

        assert!(ex.fall_detected(10_000).await.unwrap().clip().is_some());
        let second = ex.fall_detected(12_000).await.unwrap();

        assert_eq!(second, FallOutcome::Cooldown { last_fall_ms: 10_000 });
        assert!(!fx.archive.join("12000").exists());
        assert_eq!(concat.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_coverage_wait_picks_up_late_segment() {
        let (fx, faults) = fixture();
        for start in [6000, 8000, 10_000] {
            add_segment(&fx, start);
        }
        let ex = Arc::new(ClipExtractor::new(
            CameraId::from("cam01"),
            Arc::clone(&fx.index),
            &fx.archive,
            ExtractorSettings {
                coverage_timeout: Duration::from_secs(5),
                ..settings(0)
            },
            Arc::new(ByteConcat::default()),
            faults,
        ));

        let task = {
            let ex = Arc::clone(&ex);
            tokio::spawn(async move { ex.fall_detected(10_000).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        add_segment(&fx, 12_000);

        let outcome = task.await.unwrap().unwrap();
        let body = std::fs::read_to_string(&outcome.clip().unwrap().output_path).unwrap();
        assert_eq!(body, "[6000][8000][10000][12000]");
    }

    #[tokio::test]
    async fn test_coverage_timeout_extracts_partial_window() {
        let (fx, faults) = fixture();
        for start in [6000, 8000] {
            add_segment(&fx, start);
        }
        let ex = extractor(&fx, faults, Arc::new(ByteConcat::default()), 0);

        let outcome = ex.fall_detected(10_000).await.unwrap();
        let meta: ClipMetadata = serde_json::from_str(
            &std::fs::read_to_string(fx.archive.join("10000").join("meta.json")).unwrap(),
        )
        .unwrap();

        assert!(outcome.clip().is_some());
        assert_eq!(meta.segment_count, 2);
    }

    #[tokio::test]
    async fn test_concat_failure_keeps_staging() {
        let (fx, faults) = fixture();
        for start in [6000, 8000, 10_000, 12_000] {
            add_segment(&fx, start);
        }
        let ex = extractor(&fx, faults, Arc::new(FailingConcat), 0);

        let err = ex.fall_detected(10_000).await.unwrap_err();

        let event_dir = fx.archive.join("10000");
        assert_eq!(err.staged_dir(), Some(&event_dir));
        assert!(event_dir.join(MANIFEST_FILE_NAME).exists());
        assert!(!event_dir.join(METADATA_FILE_NAME).exists());
        let staged = std::fs::read_dir(&event_dir)
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .path()
                    .extension()
                    .is_some_and(|x| x == "mp4")
            })
            .count();
        assert_eq!(staged, 4);
    }

    /// A failed copy stays in the manifest, so the concat step sees a
    /// missing input and the whole extraction fails.
    #[tokio::test]
    async fn test_copy_failure_still_listed_in_manifest() {
        let (mut fx, faults) = fixture();
        for start in [6000, 8000, 12_000] {
            add_segment(&fx, start);
        }
        let vanished = add_segment(&fx, 10_000);
        std::fs::remove_file(&vanished).unwrap();

        let ex = extractor(&fx, faults, Arc::new(ByteConcat::default()), 0);
        let err = ex.fall_detected(10_000).await.unwrap_err();
        assert!(matches!(err, RecorderError::ConcatFailed { .. }));

        let manifest =
            std::fs::read_to_string(fx.archive.join("10000").join(MANIFEST_FILE_NAME)).unwrap();
        assert_eq!(manifest.lines().count(), 4);
        assert!(manifest.contains(vanished.file_name().unwrap().to_str().unwrap()));

        let fault = fx.faults_rx.try_recv().unwrap();
        assert_eq!(fault.fault.kind(), "copy");
    }
}
