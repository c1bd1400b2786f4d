//! Non-fatal fault reporting.
//!
//! Batch operations (ingestion, disk sweep, staging, cleanup) never abort on a
//! single failed item. Every such failure is logged and, when a receiver is
//! attached, also delivered as a [`Fault`] so callers can observe it.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::warn;

use fallcam_models::CameraId;

use crate::metrics::record_fault;

/// A per-item failure that was tolerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// An arrival could not be stat'd and was not indexed.
    StatFailed { path: PathBuf, error: String },
    /// A ring file could not be deleted by the sweeper.
    DeleteFailed { path: PathBuf, error: String },
    /// A segment could not be copied into the event directory.
    CopyFailed {
        source: PathBuf,
        dest: PathBuf,
        error: String,
    },
    /// A staged copy or manifest survived cleanup.
    CleanupFailed { path: PathBuf, error: String },
    /// The clip sink rejected a notice.
    DeliveryFailed { event_ms: i64, error: String },
}

impl Fault {
    pub fn kind(&self) -> &'static str {
        match self {
            Fault::StatFailed { .. } => "stat",
            Fault::DeleteFailed { .. } => "delete",
            Fault::CopyFailed { .. } => "copy",
            Fault::CleanupFailed { .. } => "cleanup",
            Fault::DeliveryFailed { .. } => "delivery",
        }
    }
}

/// A fault tagged with the camera it happened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFault {
    pub cam_id: CameraId,
    pub fault: Fault,
}

/// Cloneable handle through which components report tolerated failures.
#[derive(Debug, Clone)]
pub struct FaultReporter {
    cam_id: CameraId,
    tx: Option<mpsc::UnboundedSender<CameraFault>>,
}

impl FaultReporter {
    /// Reporter that only logs.
    pub fn log_only(cam_id: CameraId) -> Self {
        Self { cam_id, tx: None }
    }

    /// Reporter that logs and forwards to `tx`.
    pub fn with_channel(cam_id: CameraId, tx: mpsc::UnboundedSender<CameraFault>) -> Self {
        Self {
            cam_id,
            tx: Some(tx),
        }
    }

    /// Reporter plus the receiving end of its channel.
    pub fn channel(cam_id: CameraId) -> (Self, mpsc::UnboundedReceiver<CameraFault>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::with_channel(cam_id, tx), rx)
    }

    pub fn cam_id(&self) -> &CameraId {
        &self.cam_id
    }

    /// Log and forward a fault. Never fails.
    pub fn report(&self, fault: Fault) {
        warn!(cam_id = %self.cam_id, kind = fault.kind(), "Tolerated failure: {:?}", fault);
        record_fault(fault.kind());

        if let Some(tx) = &self.tx {
            // A dropped receiver just means nobody is listening.
            let _ = tx.send(CameraFault {
                cam_id: self.cam_id.clone(),
                fault,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_forwards_to_channel() {
        let (reporter, mut rx) = FaultReporter::channel(CameraId::from("cam01"));

        reporter.report(Fault::DeleteFailed {
            path: PathBuf::from("/r/a.mp4"),
            error: "permission denied".to_string(),
        });

        let received = rx.try_recv().unwrap();
        assert_eq!(received.cam_id.as_str(), "cam01");
        assert_eq!(received.fault.kind(), "delete");
    }

    #[test]
    fn test_report_without_listener_does_not_panic() {
        let (reporter, rx) = FaultReporter::channel(CameraId::from("cam01"));
        drop(rx);
        reporter.report(Fault::StatFailed {
            path: PathBuf::from("/r/b.mp4"),
            error: "not found".to_string(),
        });

        FaultReporter::log_only(CameraId::from("cam02")).report(Fault::DeliveryFailed {
            event_ms: 1,
            error: "closed".to_string(),
        });
    }
}
