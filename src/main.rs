//! weather-collector HTTP server
//!
//! Reads configuration from the environment (and `.env`), then serves the
//! REST API until SIGTERM/SIGINT.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weather_collector::{Config, WeatherCollector};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_collector=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "weather-collector starting");

    let config = Config::from_env()?;
    tracing::info!(
        bind_address = %config.server.bind_address,
        database = %config.persistence.database_path.display(),
        cities_path = %config.cities_path.display(),
        "Configuration loaded"
    );

    let collector = Arc::new(WeatherCollector::new(config).await?);

    weather_collector::serve_with_shutdown(collector).await?;

    tracing::info!("weather-collector stopped");
    Ok(())
}
