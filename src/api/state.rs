//! Application state for the API server

use crate::{Config, WeatherCollector};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the collector instance and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The collector that owns every weather task
    pub collector: Arc<WeatherCollector>,

    /// Configuration (read-only)
    pub config: Arc<Config>,

    /// Cancelled when the server begins its graceful shutdown; ends `/events` streams
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create a new AppState whose shutdown token is never cancelled by the server
    pub fn new(collector: Arc<WeatherCollector>, config: Arc<Config>) -> Self {
        Self::with_shutdown(collector, config, CancellationToken::new())
    }

    /// Create an AppState tied to an external shutdown token
    pub fn with_shutdown(
        collector: Arc<WeatherCollector>,
        config: Arc<Config>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            collector,
            config,
            shutdown,
        }
    }
}
