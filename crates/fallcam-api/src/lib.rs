//! Axum HTTP service for the fallcam recorder.
//!
//! This crate provides:
//! - Fall-event intake routed to per-camera sessions
//! - Camera status listing
//! - Health and Prometheus metrics endpoints

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
