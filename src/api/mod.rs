//! REST API server module
//!
//! Provides an OpenAPI 3.1 compliant REST API for starting weather
//! collections and polling their progress.

use crate::{Config, Result, WeatherCollector};
use axum::{Router, http::HeaderValue, routing::get, routing::post};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tasks
/// - `POST /` - Start a weather collection for `{"user_id": int}`
/// - `GET /:user_id` - Status and progress of a user's task
/// - `GET /tasks` - List all tasks
///
/// ## Configuration
/// - `GET /config` - Get current config (API key redacted)
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /events` - Server-sent events stream
pub fn create_router(collector: Arc<WeatherCollector>, config: Arc<Config>) -> Router {
    build_router(AppState::new(collector, config))
}

fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let router = Router::new()
        // Tasks
        .route("/", post(routes::submit_task))
        .route("/:user_id", get(routes::get_task))
        .route("/tasks", get(routes::list_tasks))
        // Configuration
        .route("/config", get(routes::get_config))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream));

    // Merge Swagger UI routes if enabled in config (before applying state)
    let router = if config.server.swagger_ui {
        router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.server.cors_enabled {
        let cors = build_cors_layer(&config.server.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` or an empty list allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Serve the API on `config.server.bind_address` until `shutdown` resolves
///
/// In-flight requests are drained and open `/events` streams are closed
/// before this returns. Shutting down the collector itself is left to the
/// caller.
///
/// # Example
///
/// ```no_run
/// use weather_collector::{Config, WeatherCollector};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::from_env()?);
/// let collector = Arc::new(WeatherCollector::new((*config).clone()).await?);
///
/// weather_collector::api::start_api_server(collector, config, async {
///     let _ = tokio::signal::ctrl_c().await;
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server<F>(
    collector: Arc<WeatherCollector>,
    config: Arc<Config>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = config.server.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    serve(listener, collector, config, shutdown).await
}

/// Serve the API on an already bound `listener` until `shutdown` resolves
pub async fn serve<F>(
    listener: TcpListener,
    collector: Arc<WeatherCollector>,
    config: Arc<Config>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let token = CancellationToken::new();
    let app = build_router(AppState::with_shutdown(collector, config, token.clone()));

    tracing::info!(
        address = %listener.local_addr().map_err(crate::error::Error::Io)?,
        "API server listening"
    );

    // SSE responses never complete on their own; end them so draining can finish
    let shutdown = async move {
        shutdown.await;
        token.cancel();
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
