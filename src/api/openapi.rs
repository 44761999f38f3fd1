//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the weather-collector
//! REST API using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the weather-collector REST API
///
/// The document can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "weather-collector REST API",
        version = "0.1.0",
        description = "Start per-user weather collections over a fixed city list and poll their progress",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::submit_task,
        crate::api::routes::get_task,
        crate::api::routes::list_tasks,

        // Configuration
        crate::api::routes::get_config,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::UserId,
        crate::types::TaskStatus,
        crate::types::TaskInfo,
        crate::types::WeatherRecord,
        crate::types::StoredUserRequest,
        crate::types::Event,

        // Config types from config.rs
        crate::config::Config,
        crate::config::WeatherConfig,
        crate::config::TaskConfig,
        crate::config::PersistenceConfig,
        crate::config::ApiConfig,

        // API request/response types from routes
        crate::api::routes::UserRequest,
        crate::api::routes::TaskAccepted,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Weather tasks - Start a collection for a user and poll its progress"),
        (name = "config", description = "Configuration - Read the running configuration"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_has_task_paths() {
        let spec = ApiDoc::openapi();

        assert!(spec.paths.paths.contains_key("/"));
        assert!(spec.paths.paths.contains_key("/{user_id}"));
        assert!(spec.paths.paths.contains_key("/health"));
    }

    #[test]
    fn test_openapi_spec_has_components() {
        let spec = ApiDoc::openapi();

        let components = spec.components.expect("components should be defined");
        for schema in ["TaskInfo", "TaskStatus", "UserRequest", "ApiError"] {
            assert!(
                components.schemas.contains_key(schema),
                "missing schema {schema}"
            );
        }
    }

    #[test]
    fn test_openapi_spec_has_tags() {
        let spec = ApiDoc::openapi();

        let tags = spec.tags.expect("tags should be defined");
        let tag_names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tag_names, vec!["tasks", "config", "system"]);
    }

    #[test]
    fn test_openapi_spec_info() {
        let spec = ApiDoc::openapi();

        assert_eq!(spec.info.title, "weather-collector REST API");
        assert_eq!(spec.info.version, "0.1.0");
        assert!(spec.info.description.is_some());
    }

    #[test]
    fn test_openapi_spec_version() {
        let spec = ApiDoc::openapi();

        let json = serde_json::to_value(&spec).expect("Should serialize to JSON");
        let version = json.get("openapi").and_then(|v| v.as_str());
        assert!(version.unwrap().starts_with("3."));
    }
}
