//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the submirror REST API using utoipa
//! for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the submirror REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "submirror REST API",
        version = "0.2.0",
        description = "REST API for the submirror media download pipeline: batch triggering, live progress, and post bookkeeping",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Downloads
        crate::api::routes::list_downloads,
        crate::api::routes::start_batch,
        crate::api::routes::reset_download_tries,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::PostId,
        crate::types::DownloadState,
        crate::types::TrimmedRecord,
        crate::types::Event,

        // Config types from config.rs
        crate::config::Config,
        crate::config::DownloadConfig,
        crate::config::PersistenceConfig,
        crate::config::ApiConfig,

        // Error body
        crate::api::error_response::ApiError,
    )),
    tags(
        (name = "downloads", description = "Batch snapshot, batch triggering, and try-counter reset"),
        (name = "system", description = "Health, live events, and API documentation")
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_doc_generation() {
        // Spec generation must not panic
        let _spec = ApiDoc::openapi();
    }

    #[test]
    fn test_openapi_spec_has_paths() {
        let spec = ApiDoc::openapi();
        assert!(
            !spec.paths.paths.is_empty(),
            "OpenAPI spec should have paths defined"
        );
        assert!(spec.paths.paths.contains_key("/downloads"));
        assert!(spec.paths.paths.contains_key("/events"));
    }

    #[test]
    fn test_openapi_spec_has_components() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("spec should have components");
        assert!(
            !components.schemas.is_empty(),
            "OpenAPI spec should have schemas defined"
        );
    }

    #[test]
    fn test_openapi_spec_has_tags() {
        let spec = ApiDoc::openapi();
        let tags = spec.tags.expect("spec should have tags");
        let tag_names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert!(tag_names.contains(&"downloads"));
        assert!(tag_names.contains(&"system"));
    }

    #[test]
    fn test_openapi_json_serialization() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string(&spec).expect("should serialize to JSON");
        assert!(!json.is_empty());
        let _value: serde_json::Value =
            serde_json::from_str(&json).expect("generated JSON should be valid");
    }
}
