//! Recorder manager: the set of running camera sessions.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use fallcam_models::{CameraId, CameraSpec, ClipNotice, FallOutcome};

use crate::config::RecorderConfig;
use crate::error::{RecorderError, RecorderResult};
use crate::faults::Fault;
use crate::session::{CameraRecorderSession, SessionDeps};
use crate::sink::ClipSink;

/// Builds the capabilities for a newly started camera.
pub type DepsFactory = Arc<dyn Fn(&CameraId, &RecorderConfig) -> SessionDeps + Send + Sync>;

pub struct RecorderManager {
    config: Arc<RecorderConfig>,
    sessions: RwLock<HashMap<CameraId, Arc<CameraRecorderSession>>>,
    sink: Arc<dyn ClipSink>,
    deps: DepsFactory,
}

impl RecorderManager {
    /// Manager using the FFmpeg producer, polling feed and FFmpeg concat.
    pub fn new(config: RecorderConfig, sink: Arc<dyn ClipSink>) -> Self {
        Self::with_deps(config, sink, Arc::new(SessionDeps::production))
    }

    pub fn with_deps(config: RecorderConfig, sink: Arc<dyn ClipSink>, deps: DepsFactory) -> Self {
        Self {
            config: Arc::new(config),
            sessions: RwLock::new(HashMap::new()),
            sink,
            deps,
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Start a session for every camera; failures are logged and skipped.
    ///
    /// Returns the number of sessions running afterwards.
    pub async fn start_all(&self, cameras: &BTreeMap<CameraId, CameraSpec>) -> usize {
        for (cam_id, spec) in cameras {
            if let Err(e) = self.start(cam_id.clone(), spec.clone()).await {
                error!(cam_id = %cam_id, "Failed to start camera: {}", e);
            }
        }
        let running = self.sessions.read().await.len();
        info!(running, configured = cameras.len(), "Cameras started");
        running
    }

    /// Start one camera. A camera that is already registered is left alone.
    pub async fn start(&self, cam_id: CameraId, spec: CameraSpec) -> RecorderResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&cam_id) {
            return Ok(());
        }

        let deps = (self.deps)(&cam_id, &self.config);
        let session = Arc::new(CameraRecorderSession::new(
            cam_id.clone(),
            spec,
            Arc::clone(&self.config),
            deps,
        ));
        session.start().await?;

        sessions.insert(cam_id, session);
        Ok(())
    }

    /// Stop and forget one camera.
    pub async fn stop(&self, cam_id: &CameraId) -> RecorderResult<()> {
        let session = self
            .sessions
            .write()
            .await
            .remove(cam_id)
            .ok_or_else(|| RecorderError::UnknownCamera(cam_id.clone()))?;
        session.stop().await;
        Ok(())
    }

    /// Stop every camera concurrently.
    pub async fn stop_all(&self) {
        let sessions: Vec<_> = self.sessions.write().await.drain().map(|(_, s)| s).collect();
        if sessions.is_empty() {
            return;
        }

        info!(count = sessions.len(), "Stopping all cameras");
        let handles: Vec<_> = sessions
            .into_iter()
            .map(|session| tokio::spawn(async move { session.stop().await }))
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Camera stop task failed: {}", e);
            }
        }
    }

    pub async fn session(&self, cam_id: &CameraId) -> Option<Arc<CameraRecorderSession>> {
        self.sessions.read().await.get(cam_id).cloned()
    }

    /// Ids of the registered cameras, sorted.
    pub async fn camera_ids(&self) -> Vec<CameraId> {
        let mut ids: Vec<_> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Route a fall event to its camera and announce a saved clip.
    ///
    /// Sink failures are reported as faults; they never change the outcome.
    pub async fn handle_fall(&self, cam_id: &CameraId, event_ms: i64) -> RecorderResult<FallOutcome> {
        let session = self
            .session(cam_id)
            .await
            .ok_or_else(|| RecorderError::UnknownCamera(cam_id.clone()))?;

        let outcome = session.fall_detected(event_ms).await?;

        if let FallOutcome::Saved(clip) = &outcome {
            let notice = ClipNotice::for_clip(cam_id, clip, &self.config.clip_base_url);
            if let Err(e) = self.sink.deliver(&notice).await {
                session.faults().report(Fault::DeliveryFailed {
                    event_ms,
                    error: e.to_string(),
                });
            }
        }

        Ok(outcome)
    }
}
