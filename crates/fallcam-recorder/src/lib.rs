//! Per-camera ring recording and fall-triggered clip extraction.
//!
//! This crate provides:
//! - The time-ordered segment index with coverage notification
//! - Retention sweeping of the on-disk ring and the index
//! - Clip extraction with cooldown, coverage wait and lossless concat
//! - Camera sessions wiring producer, arrival feed, sweeper and extractor
//! - The manager routing fall events to sessions

pub mod config;
pub mod error;
pub mod extractor;
pub mod faults;
pub mod feed;
pub mod index;
pub mod logging;
pub mod manager;
pub mod metrics;
pub mod producer;
pub mod session;
pub mod sink;
pub mod sweeper;

pub use config::{load_cameras_file, RecorderConfig};
pub use error::{RecorderError, RecorderResult};
pub use extractor::{
    ClipExtractor, Concatenator, CooldownGate, EventWindow, ExtractorSettings, FfmpegConcatenator,
};
pub use faults::{CameraFault, Fault, FaultReporter};
pub use feed::{ArrivalFeed, ChannelFeed, FeedSubscription, PollingFeed, SegmentArrival};
pub use index::{RingIndex, SegmentIndex};
pub use logging::CameraLogger;
pub use manager::{DepsFactory, RecorderManager};
pub use producer::{FfmpegSegmenter, SegmentProducer};
pub use session::{CameraRecorderSession, SessionDeps};
pub use sink::{ChannelSink, ClipSink, LogSink};
pub use sweeper::{RetentionSweeper, SweepReport};
