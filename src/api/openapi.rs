//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the shortvid-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the shortvid-dl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "shortvid-dl REST API",
        version = "0.1.0",
        description = "Submit short-video URLs, poll download tasks and stream each finished video once",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::request_download,
        crate::api::routes::task_status,
        crate::api::routes::stream_video,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskId,
        crate::types::TaskStatus,
        crate::types::ErrorCode,

        // Config types from config.rs
        crate::config::Config,
        crate::config::DownloadConfig,
        crate::config::ExtractorConfig,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        // API request/response types
        crate::api::routes::RequestDownloadForm,
        crate::api::routes::RequestDownloadResponse,
        crate::api::routes::TaskStatusResponse,
        crate::api::routes::HealthResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Download tasks - Submit URLs, poll status, stream results"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
