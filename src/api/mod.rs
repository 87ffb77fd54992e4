//! REST API server module
//!
//! Provides the HTTP gateway: submit a download, poll its task, stream the
//! finished video once. Also serves a health check and the OpenAPI document.

use crate::{Config, Result, VideoDownloader};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
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
/// - `POST /request-download` - Submit a video URL (form field `url`)
/// - `GET /task-status/:task_id` - Poll a task
/// - `GET /stream-video/:task_id` - Stream the finished video (once)
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(downloader: Arc<VideoDownloader>, config: Arc<Config>) -> Router {
    let state = AppState { downloader };

    let router = Router::new()
        // Tasks
        .route("/request-download", post(routes::request_download))
        .route("/task-status/:task_id", get(routes::task_status))
        .route("/stream-video/:task_id", get(routes::stream_video))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // Swagger UI serves its own copy of the document under a separate path
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// CORS for browser clients
///
/// `"*"` (or an empty list) allows any origin. `Content-Disposition` is
/// exposed so a page can read the delivered filename.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .expose_headers([header::CONTENT_DISPOSITION, header::CONTENT_LENGTH]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin.escape_debug(), "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

/// Start the API server on the configured bind address.
///
/// Runs until the server fails. Use [`serve_until`] to stop it on a signal.
///
/// # Example
///
/// ```no_run
/// use shortvid_dl::{Config, VideoDownloader};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let downloader = Arc::new(VideoDownloader::new((*config).clone())?);
///
/// // Start API server (blocks until shutdown)
/// shortvid_dl::api::start_api_server(downloader, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(downloader: Arc<VideoDownloader>, config: Arc<Config>) -> Result<()> {
    serve_until(downloader, config, std::future::pending()).await
}

/// Start the API server and stop accepting connections once `shutdown` resolves.
///
/// In-flight responses, including video streams, are allowed to finish.
pub async fn serve_until(
    downloader: Arc<VideoDownloader>,
    config: Arc<Config>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(downloader, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    let local_address = listener.local_addr().map_err(crate::error::Error::Io)?;
    tracing::info!(address = %local_address, "API server listening");

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
