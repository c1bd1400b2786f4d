//! Application state.

use std::sync::Arc;

use fallcam_recorder::RecorderManager;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub manager: Arc<RecorderManager>,
}

impl AppState {
    pub fn new(config: ApiConfig, manager: Arc<RecorderManager>) -> Self {
        Self { config, manager }
    }
}
