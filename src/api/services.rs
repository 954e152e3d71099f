use std::collections::BTreeMap;
use std::path::PathBuf;

use axum::{
    Form, Json,
    extract::{Path, Request, State, rejection::FormRejection},
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{Html, IntoResponse, Response},
};
use tower_http::services::ServeFile;
use tracing::{debug, info, warn};

use super::{error::ApiError, models::SubmitForm, pages, state::AppState};
use crate::job::JobId;
use crate::status::{JobStatus, VideoKind};

const DIAGNOSTIC_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Submit form (GET /)
pub async fn submit_form() -> Html<String> {
    Html(pages::submit_form())
}

/// Job submission endpoint (POST /)
///
/// Takes a form-encoded `url`, derives the job id from it and enqueues the
/// id without waiting. A full queue is reported as 503 rather than blocking
/// the request.
pub async fn submit_job(
    State(state): State<AppState>,
    form: Result<Form<SubmitForm>, FormRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Form(form) = form.map_err(|e| ApiError::InvalidPayload(e.body_text()))?;

    let id = JobId::from_video_url(&form.url)?;

    if let Err(e) = state.queue.submit(id.clone()) {
        state.metrics.job_rejected();
        warn!(job_id = %id, error = %e, "Job rejected");
        return Err(e.into());
    }

    state.metrics.job_accepted();
    info!(
        job_id = %id,
        queue_depth = state.queue.queue_depth(),
        "Job accepted"
    );

    Ok((StatusCode::ACCEPTED, Html(pages::accepted(&id))))
}

/// Job page (GET /{id})
///
/// Serves the artifact once one exists, a self-refreshing page while work
/// is queued or running and 404 otherwise.
pub async fn get_job(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let id = JobId::parse(&raw_id).map_err(|_| ApiError::NotFound(format!("job {raw_id}")))?;

    match state.results.status(&id, &state.queue).await {
        JobStatus::Ready => {
            let kind = state.results.sniff(&id).await;
            let path = state.results.artifact_path(&id);
            serve_artifact(path, request, Some(&id), kind).await
        }
        JobStatus::Failed => {
            let path = state.results.artifact_path(&id);
            serve_artifact(path, request, None, None).await
        }
        JobStatus::Pending { ahead } => {
            debug!(job_id = %id, ahead, "Job pending");
            Ok(Html(pages::pending(ahead)).into_response())
        }
        JobStatus::NotFound => Err(ApiError::NotFound(format!("job {id}"))),
    }
}

/// Stream an artifact, honoring range and conditional headers.
///
/// `download_as` marks a video that should be saved as `<id>.mp4`.
async fn serve_artifact(
    path: PathBuf,
    request: Request,
    download_as: Option<&JobId>,
    kind: Option<VideoKind>,
) -> Result<Response, ApiError> {
    let mut response = ServeFile::new(path)
        .try_call(request)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to serve file: {e}")))?
        .into_response();

    if !response.status().is_success() {
        return Ok(response);
    }

    let content_type = match (download_as, kind) {
        (Some(_), Some(kind)) => kind.mime_type(),
        (Some(_), None) => "application/octet-stream",
        (None, _) => DIAGNOSTIC_CONTENT_TYPE,
    };
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

    if let Some(id) = download_as {
        let disposition = format!("attachment; filename=\"{id}.mp4\"");
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            response.headers_mut().insert(CONTENT_DISPOSITION, value);
        }
    }

    Ok(response)
}

/// Health check endpoint (GET /health)
///
/// Reports the worker attachment, the configured directories and queue
/// occupancy. Returns 503 if any component is unhealthy.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut components = BTreeMap::new();

    components.insert("api".to_string(), "healthy".to_string());

    let worker = if state.queue.health_check() {
        "healthy"
    } else {
        "unhealthy"
    };
    components.insert("worker".to_string(), worker.to_string());

    let storage = &state.config.storage;
    for (name, dir) in [
        ("results_dir", &storage.results_dir),
        ("work_dir", &storage.work_dir),
    ] {
        components.insert(name.to_string(), dir_status(dir).await.to_string());
    }

    let all_healthy = components.values().all(|status| status == "healthy");
    let overall_status = if all_healthy {
        "healthy"
    } else {
        "unhealthy"
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = super::models::HealthResponse {
        status: overall_status.to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
        queue_depth: state.queue.queue_depth(),
        queue_capacity: state.queue.capacity(),
        worker_busy: state.queue.is_worker_busy(),
        metrics: state.metrics.snapshot(),
    };

    (status_code, Json(response))
}

async fn dir_status(dir: &std::path::Path) -> &'static str {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => "healthy",
        _ => "unhealthy",
    }
}
