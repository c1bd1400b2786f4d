//! Fall events and the clips extracted for them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::CameraId;

/// Name of the concatenated clip inside its event directory.
pub fn clip_file_name(cam_id: &CameraId, event_ms: i64) -> String {
    format!("fall_{}_{}.mp4", cam_id, event_ms)
}

/// Name of the metadata sidecar inside an event directory.
pub const METADATA_FILE_NAME: &str = "meta.json";

/// A timestamped trigger from the external fall detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallEvent {
    pub event_ms: i64,
}

/// Result of a successful extraction, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipDescriptor {
    /// Path of the concatenated clip
    pub output_path: PathBuf,
    pub event_ms: i64,
    /// Start of the requested window (`event_ms - pre`)
    pub from: i64,
    /// End of the requested window (`event_ms + post`)
    pub to: i64,
}

/// Persisted sidecar written once beside each clip (`meta.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipMetadata {
    pub cam_id: CameraId,
    pub event_ms: i64,
    pub from: i64,
    pub to: i64,
    pub segment_count: usize,
}

/// Payload handed to the clip sink once a clip is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipNotice {
    pub cam_id: CameraId,
    pub event_ms: i64,
    pub from: i64,
    pub to: i64,
    pub clip_url: String,
}

impl ClipNotice {
    /// Build a notice for a saved clip.
    ///
    /// The URL follows `<base>/clips/<camId>/<eventMs>/<file>`.
    pub fn for_clip(cam_id: &CameraId, clip: &ClipDescriptor, base_url: &str) -> Self {
        let file_name = clip
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| clip_file_name(cam_id, clip.event_ms));

        Self {
            cam_id: cam_id.clone(),
            event_ms: clip.event_ms,
            from: clip.from,
            to: clip.to,
            clip_url: format!(
                "{}/clips/{}/{}/{}",
                base_url.trim_end_matches('/'),
                cam_id,
                clip.event_ms,
                file_name
            ),
        }
    }
}

/// Outcome of handling one fall event.
///
/// Everything except `Saved` is a silent success for the caller: no
/// artifact is produced and nothing is raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FallOutcome {
    /// Clip concatenated and metadata written.
    Saved(ClipDescriptor),
    /// Rejected as a duplicate inside the cooldown window.
    #[serde(rename_all = "camelCase")]
    Cooldown { last_fall_ms: i64 },
    /// An extraction for the same event is already running.
    #[serde(rename_all = "camelCase")]
    InFlight { event_ms: i64 },
    /// Nothing indexed overlaps the window.
    NoFootage { from: i64, to: i64 },
}

impl FallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallOutcome::Saved(_) => "saved",
            FallOutcome::Cooldown { .. } => "cooldown",
            FallOutcome::InFlight { .. } => "in_flight",
            FallOutcome::NoFootage { .. } => "no_footage",
        }
    }

    /// The saved clip, if any.
    pub fn clip(&self) -> Option<&ClipDescriptor> {
        match self {
            FallOutcome::Saved(clip) => Some(clip),
            _ => None,
        }
    }
}
