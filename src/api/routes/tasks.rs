//! Task handlers: request a download, poll it, stream the result.

use super::{RequestDownloadForm, RequestDownloadResponse};
use crate::api::AppState;
use crate::error::{ApiError, Error};
use crate::types::TaskId;
use axum::{
    Form, Json,
    body::Body,
    extract::{Path, State, rejection::FormRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

/// Parse a path segment into a task id; ids that cannot parse were never issued
fn parse_task_id(raw: &str) -> Result<TaskId, Response> {
    raw.parse::<TaskId>().map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            Json(ApiError::new("NOT_FOUND", format!("task {raw} not found"))),
        )
            .into_response()
    })
}

/// POST /request-download - Submit a video URL for download
#[utoipa::path(
    post,
    path = "/request-download",
    tag = "tasks",
    request_body(
        content = RequestDownloadForm,
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 200, description = "Task created", body = RequestDownloadResponse),
        (status = 400, description = "Missing or empty url", body = crate::error::ApiError),
        (status = 503, description = "Server is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn request_download(
    State(state): State<AppState>,
    form: Result<Form<RequestDownloadForm>, FormRejection>,
) -> Response {
    let url = match form {
        Ok(Form(form)) => form.url.unwrap_or_default(),
        Err(rejection) => return Error::Validation(rejection.body_text()).into_response(),
    };

    match state.downloader.request_download(&url) {
        Ok(task_id) => (
            StatusCode::OK,
            Json(RequestDownloadResponse {
                success: true,
                task_id,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /task-status/:task_id - Current state of a task
#[utoipa::path(
    get,
    path = "/task-status/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task ID returned by /request-download")
    ),
    responses(
        (status = 200, description = "Task state", body = super::TaskStatusResponse),
        (status = 404, description = "Unknown task", body = crate::error::ApiError)
    )
)]
pub async fn task_status(State(state): State<AppState>, Path(task_id): Path<String>) -> Response {
    let id = match parse_task_id(&task_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.downloader.task_status(id) {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /stream-video/:task_id - Stream the finished video once
///
/// The file is deleted from the server once the response body is dropped.
#[utoipa::path(
    get,
    path = "/stream-video/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task ID returned by /request-download")
    ),
    responses(
        (status = 200, description = "Video bytes", content_type = "video/mp4"),
        (status = 404, description = "Unknown task, not ready, failed, already delivered, or file missing", body = crate::error::ApiError)
    )
)]
pub async fn stream_video(State(state): State<AppState>, Path(task_id): Path<String>) -> Response {
    let id = match parse_task_id(&task_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let delivery = match state.downloader.open_delivery(id).await {
        Ok(delivery) => delivery,
        Err(e) => return e.into_response(),
    };

    let disposition = format!("attachment; filename=\"{}\"", delivery.filename);
    let disposition = match HeaderValue::from_str(&disposition) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(task_id = %id, error = %e, "Invalid Content-Disposition header");
            return ApiError::internal(e.to_string()).into_response();
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    if let Some(len) = delivery.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }

    (StatusCode::OK, headers, Body::from_stream(delivery.body)).into_response()
}
