//! Clip sinks: where notices about saved clips go.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use fallcam_models::ClipNotice;

use crate::error::{RecorderError, RecorderResult};

#[async_trait]
pub trait ClipSink: Send + Sync {
    async fn deliver(&self, notice: &ClipNotice) -> RecorderResult<()>;
}

/// Writes each notice as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl ClipSink for LogSink {
    async fn deliver(&self, notice: &ClipNotice) -> RecorderResult<()> {
        info!(
            cam_id = %notice.cam_id,
            event_ms = notice.event_ms,
            from = notice.from,
            to = notice.to,
            clip_url = %notice.clip_url,
            "Fall clip available"
        );
        Ok(())
    }
}

/// Forwards notices to an in-process receiver.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ClipNotice>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ClipNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ClipSink for ChannelSink {
    async fn deliver(&self, notice: &ClipNotice) -> RecorderResult<()> {
        self.tx
            .send(notice.clone())
            .map_err(|_| RecorderError::Sink("notice receiver closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fallcam_models::CameraId;

    fn notice() -> ClipNotice {
        ClipNotice {
            cam_id: CameraId::from("cam01"),
            event_ms: 10_000,
            from: 6000,
            to: 14_000,
            clip_url: "http://localhost:8080/clips/cam01/10000/fall_cam01_10000.mp4".to_string(),
        }
    }

    #[tokio::test]
    async fn test_channel_sink_delivers() {
        let (sink, mut rx) = ChannelSink::new();
        sink.deliver(&notice()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), notice());
    }

    #[tokio::test]
    async fn test_channel_sink_reports_closed_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        assert!(sink.deliver(&notice()).await.is_err());
    }

    #[tokio::test]
    async fn test_log_sink_accepts() {
        LogSink.deliver(&notice()).await.unwrap();
    }
}
