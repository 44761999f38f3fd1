//! # weather-collector
//!
//! Rate-limited batch collector for per-city weather data.
//!
//! A caller submits a `user_id`; the collector fetches current weather for
//! every configured city concurrently, throttled by one shared sliding-window limiter,
//! retries the whole batch on failure, and stores the result once. Progress
//! can be polled at any time while the batch runs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use weather_collector::{Config, UserId, WeatherCollector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let collector = WeatherCollector::new(config).await?;
//!
//!     // Subscribe to events
//!     let mut events = collector.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     collector.submit(UserId(1)).await?;
//!     println!("progress: {:?}", collector.progress(UserId(1)).await);
//!
//!     collector.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Weather collection service, provider client and tasks
pub mod collector;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Sliding-window limiter shared by all provider requests
pub mod rate_limiter;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use collector::WeatherCollector;
pub use collector::client::{OpenWeatherClient, WeatherProvider};
pub use collector::registry::TaskRegistry;
pub use collector::task::{BatchProgress, WeatherTask};
pub use config::Config;
pub use db::{Database, NewUserRequest, WeatherStore};
pub use error::{
    ApiError, BatchError, DatabaseError, Error, ErrorDetail, FetchError, Result, ToHttpStatus,
};
pub use rate_limiter::RateLimiter;
pub use types::{
    CityId, Event, StoredUserRequest, TaskInfo, TaskStatus, UserId, WeatherRecord,
};

/// Serve the REST API until SIGTERM/SIGINT (Ctrl+C elsewhere), then shut the
/// collector down.
///
/// The server stops accepting connections and closes `/events` streams first;
/// running weather tasks get `task.shutdown_timeout` to finish afterwards.
pub async fn serve_with_shutdown(collector: std::sync::Arc<WeatherCollector>) -> Result<()> {
    let config = collector.get_config();
    api::start_api_server(std::sync::Arc::clone(&collector), config, wait_for_signal()).await?;
    collector.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "signal handlers unavailable, waiting for ctrl_c");
                tokio::signal::ctrl_c().await.ok();
                return;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("SIGTERM received, stopping"),
        _ = sigint.recv() => tracing::info!("SIGINT received, stopping"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Ctrl+C listener failed, stopping");
    } else {
        tracing::info!("Ctrl+C received, stopping");
    }
}
