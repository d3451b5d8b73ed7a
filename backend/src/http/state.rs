//! Application state for the HTTP server.

use std::time::Duration;

use crate::config::{RequestDefaults, ServiceConfig};
use crate::services::VegetationService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Map pipeline orchestration (holds the backend and the mask)
    pub vegetation: VegetationService,
    /// Year/month used when a request omits them
    pub defaults: RequestDefaults,
    /// Upper bound on one pipeline run
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(vegetation: VegetationService, config: &ServiceConfig) -> Self {
        Self {
            vegetation,
            defaults: config.defaults,
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
        }
    }
}
