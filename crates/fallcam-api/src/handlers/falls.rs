//! Fall event intake.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use fallcam_models::{now_ms, CameraId, FallOutcome};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// How far ahead of the server clock a reported event may lie.
pub const MAX_EVENT_LEAD_MS: i64 = 24 * 60 * 60 * 1000;

/// Body of `POST /cameras/:cam_id/falls`. An empty body means "now".
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallRequest {
    pub event_ms: Option<i64>,
}

impl FallRequest {
    fn parse(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid body: {}", e)))
    }
}

/// Report a fall on one camera and return how it was handled.
///
/// Cooldown and no-footage outcomes are successful responses; only an
/// unknown camera or a failed concatenation is an error.
pub async fn report_fall(
    State(state): State<AppState>,
    Path(cam_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<FallOutcome>> {
    let request = FallRequest::parse(&body)?;
    let event_ms = validate_event_ms(request.event_ms, now_ms())?;

    let cam_id = CameraId::from(cam_id);
    info!(cam_id = %cam_id, event_ms, "Fall reported");

    let outcome = state.manager.handle_fall(&cam_id, event_ms).await?;
    Ok(Json(outcome))
}

/// Resolve the event time, rejecting negative and far-future values.
fn validate_event_ms(event_ms: Option<i64>, now: i64) -> ApiResult<i64> {
    let event_ms = event_ms.unwrap_or(now);
    if event_ms < 0 {
        return Err(ApiError::bad_request("eventMs must not be negative"));
    }
    if event_ms > now.saturating_add(MAX_EVENT_LEAD_MS) {
        return Err(ApiError::bad_request("eventMs is too far in the future"));
    }
    Ok(event_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fall_request() {
        assert_eq!(FallRequest::parse(b"").unwrap().event_ms, None);
        assert_eq!(FallRequest::parse(b"  \n").unwrap().event_ms, None);
        assert_eq!(FallRequest::parse(b"{}").unwrap().event_ms, None);
        assert_eq!(
            FallRequest::parse(br#"{"eventMs": 1704110405000}"#).unwrap().event_ms,
            Some(1_704_110_405_000)
        );
        assert!(FallRequest::parse(b"{not json").is_err());
    }

    #[test]
    fn test_validate_event_ms() {
        let now = 1_704_110_405_000;
        assert_eq!(validate_event_ms(None, now).unwrap(), now);
        assert_eq!(validate_event_ms(Some(1000), now).unwrap(), 1000);
        assert_eq!(
            validate_event_ms(Some(now + MAX_EVENT_LEAD_MS), now).unwrap(),
            now + MAX_EVENT_LEAD_MS
        );
        assert!(validate_event_ms(Some(-1), now).is_err());
        assert!(validate_event_ms(Some(now + MAX_EVENT_LEAD_MS + 1), now).is_err());
        assert!(validate_event_ms(Some(i64::MAX - 1), now).is_err());
    }
}
