//! API integration tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use fallcam_api::{create_router, ApiConfig, AppState};
use fallcam_media::{MediaError, MediaResult};
use fallcam_models::{CameraId, CameraSpec};
use fallcam_recorder::{
    ChannelFeed, Concatenator, FaultReporter, LogSink, RecorderConfig, RecorderManager,
    RecorderResult, SegmentProducer, SessionDeps,
};

struct IdleProducer;

#[async_trait]
impl SegmentProducer for IdleProducer {
    async fn start(&mut self, _spec: &CameraSpec, _ring_dir: &Path) -> RecorderResult<()> {
        Ok(())
    }

    async fn stop(&mut self) -> RecorderResult<()> {
        Ok(())
    }

    fn is_running(&mut self) -> bool {
        false
    }
}

struct NoConcat;

#[async_trait]
impl Concatenator for NoConcat {
    async fn concat(&self, _manifest: &Path, _output: &Path) -> MediaResult<()> {
        Err(MediaError::internal("not available in tests"))
    }
}

async fn create_test_router(dir: &TempDir) -> (Router, Arc<RecorderManager>) {
    let config = RecorderConfig {
        ring_dir: dir.path().join("ring"),
        archive_dir: dir.path().join("archive"),
        coverage_timeout: Duration::from_millis(50),
        sweep_interval: Duration::from_secs(3600),
        ..RecorderConfig::default()
    };

    let manager = Arc::new(RecorderManager::with_deps(
        config,
        Arc::new(LogSink),
        Arc::new(|cam_id: &CameraId, _config: &RecorderConfig| SessionDeps {
            producer: Box::new(IdleProducer),
            feed: Arc::new(ChannelFeed::new()),
            concat: Arc::new(NoConcat),
            faults: FaultReporter::log_only(cam_id.clone()),
        }),
    ));
    manager
        .start(CameraId::from("cam01"), CameraSpec::new("/dev/video0"))
        .await
        .unwrap();

    let state = AppState::new(ApiConfig::default(), Arc::clone(&manager));
    (create_router(state, None), manager)
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_fall(cam: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/cameras/{}/falls", cam))
        .header("content-type", "application/json")
        .body(body)
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let (app, manager) = create_test_router(&dir).await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(json_body(response).await["status"], "healthy");
    manager.stop_all().await;
}

#[tokio::test]
async fn test_metrics_disabled_is_not_routed() {
    let dir = TempDir::new().unwrap();
    let (app, manager) = create_test_router(&dir).await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    manager.stop_all().await;
}

#[tokio::test]
async fn test_list_cameras() {
    let dir = TempDir::new().unwrap();
    let (app, manager) = create_test_router(&dir).await;

    let response = app
        .oneshot(Request::builder().uri("/cameras").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["cameras"][0]["camId"], "cam01");
    assert_eq!(body["cameras"][0]["running"], true);
    assert_eq!(body["cameras"][0]["indexedSegments"], 0);
    manager.stop_all().await;
}

#[tokio::test]
async fn test_fall_on_unknown_camera_is_404() {
    let dir = TempDir::new().unwrap();
    let (app, manager) = create_test_router(&dir).await;

    let response = app
        .oneshot(post_fall("cam09", Body::from(json!({"eventMs": 1000}).to_string())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], "unknown_camera");
    manager.stop_all().await;
}

#[tokio::test]
async fn test_fall_without_footage_then_cooldown() {
    let dir = TempDir::new().unwrap();
    let (app, manager) = create_test_router(&dir).await;

    let response = app
        .clone()
        .oneshot(post_fall("cam01", Body::from(json!({"eventMs": 100000}).to_string())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "no_footage");
    assert_eq!(body["from"], 84_000);
    assert_eq!(body["to"], 116_000);

    let response = app
        .oneshot(post_fall("cam01", Body::from(json!({"eventMs": 105000}).to_string())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "cooldown");
    assert_eq!(body["lastFallMs"], 100_000);

    assert!(!dir.path().join("archive").join("cam01").join("100000").exists());
    manager.stop_all().await;
}

#[tokio::test]
async fn test_fall_with_malformed_body_is_400() {
    let dir = TempDir::new().unwrap();
    let (app, manager) = create_test_router(&dir).await;

    let response = app
        .oneshot(post_fall("cam01", Body::from("{eventMs")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    manager.stop_all().await;
}

#[tokio::test]
async fn test_far_future_fall_is_400_and_keeps_cooldown_clear() {
    let dir = TempDir::new().unwrap();
    let (app, manager) = create_test_router(&dir).await;

    let response = app
        .clone()
        .oneshot(post_fall(
            "cam01",
            Body::from(json!({"eventMs": i64::MAX - 1}).to_string()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_fall("cam01", Body::from(json!({"eventMs": 100000}).to_string())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "no_footage");
    manager.stop_all().await;
}
