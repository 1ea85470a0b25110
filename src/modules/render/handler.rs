use super::dto::{JobStatusResponse, RenderAccepted, RenderRequest};
use super::error::RenderError;
use super::model::RenderJob;
use super::service::RenderService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::state::AppState;
use crate::workers::sweeper::SweepReport;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

fn error_status(e: &RenderError) -> StatusCode {
    match e {
        RenderError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        RenderError::JobNotFound => StatusCode::NOT_FOUND,
        RenderError::JobInProgress => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Submit a render job
#[utoipa::path(
    post,
    path = "/api/v1/render",
    request_body = RenderRequest,
    responses(
        (status = 202, description = "Render job accepted", body = ApiResponse<RenderAccepted>),
        (status = 400, description = "Invalid scenes or settings")
    ),
    tag = "Render"
)]
pub async fn submit_render(
    State(state): State<AppState>,
    Json(payload): Json<RenderRequest>,
) -> impl IntoResponse {
    match RenderService::submit(state, payload).await {
        Ok(accepted) => ApiSuccess::accepted(accepted, "Render job accepted").into_response(),
        Err(e) => ApiError::new(&e, error_status(&e)).into_response(),
    }
}

/// Poll a render job
#[utoipa::path(
    get,
    path = "/api/v1/render/status/{id}",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job status; unknown ids report `not_found`", body = ApiResponse<JobStatusResponse>)
    ),
    tag = "Render"
)]
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let status = RenderService::status(state, &id).await;
    ApiSuccess::ok(status, "Job status retrieved")
}

/// List all render jobs
#[utoipa::path(
    get,
    path = "/api/v1/render/jobs",
    responses(
        (status = 200, description = "Jobs, newest first", body = ApiResponse<Vec<RenderJob>>)
    ),
    tag = "Render"
)]
pub async fn list_jobs(State(state): State<AppState>) -> impl IntoResponse {
    let jobs = RenderService::list(state).await;
    ApiSuccess::ok(jobs, "Jobs retrieved successfully")
}

/// Delete a render job and its video
#[utoipa::path(
    delete,
    path = "/api/v1/render/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job deleted", body = ApiResponse<String>),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Job is still processing")
    ),
    tag = "Render"
)]
pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match RenderService::delete(state, id).await {
        Ok(()) => ApiSuccess::ok(id.to_string(), "Job deleted successfully").into_response(),
        Err(e) => ApiError::new(&e, error_status(&e)).into_response(),
    }
}

/// Remove expired jobs and stale temp files now
#[utoipa::path(
    post,
    path = "/api/v1/render/jobs/cleanup",
    responses(
        (status = 200, description = "Cleanup report", body = ApiResponse<SweepReport>)
    ),
    tag = "Render"
)]
pub async fn cleanup_jobs(State(state): State<AppState>) -> impl IntoResponse {
    let report = RenderService::cleanup(state).await;
    ApiSuccess::ok(report, "Cleanup finished")
}
