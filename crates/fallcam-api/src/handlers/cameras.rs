//! Camera status handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use fallcam_models::CameraId;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraStatus {
    pub cam_id: CameraId,
    pub running: bool,
    pub producer_running: bool,
    pub indexed_segments: usize,
    pub latest_segment_ms: Option<i64>,
    pub last_fall_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CamerasResponse {
    pub cameras: Vec<CameraStatus>,
}

/// List registered cameras with their recording state.
pub async fn list_cameras(State(state): State<AppState>) -> Json<CamerasResponse> {
    let mut cameras = Vec::new();

    for cam_id in state.manager.camera_ids().await {
        // Removed between listing and lookup.
        let Some(session) = state.manager.session(&cam_id).await else {
            continue;
        };
        cameras.push(CameraStatus {
            running: session.is_running().await,
            producer_running: session.producer_running().await,
            indexed_segments: session.index().len(),
            latest_segment_ms: session.index().latest_start(),
            last_fall_ms: session.last_fall_ms(),
            cam_id,
        });
    }

    Json(CamerasResponse { cameras })
}
