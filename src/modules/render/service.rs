use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::dto::{JobStatusResponse, RenderAccepted, RenderRequest};
use super::error::RenderError;
use super::model::RenderJob;
use crate::state::AppState;
use crate::workers::renderer::run_render_job;
use crate::workers::sweeper::{sweep_once, SweepReport};

/// Rough wall-clock cost of one scene, used for the estimate returned on submit.
const SECONDS_PER_SCENE: u64 = 10;

pub struct RenderService;

impl RenderService {
    /// Validates the request, registers a job and starts it in the background.
    pub async fn submit(state: AppState, req: RenderRequest) -> Result<RenderAccepted, RenderError> {
        req.validate()
            .map_err(|e| RenderError::InvalidRequest(e.to_string()))?;

        let scene_count = req.scenes.len();
        let job = state.jobs.create(scene_count).await;
        state.jobs.progress(job.id, 5, "Render accepted").await;
        info!("📥 Accepted render job {} ({} scenes)", job.id, scene_count);

        tokio::spawn(run_render_job(state.clone(), job.id, req));

        Ok(RenderAccepted {
            job_id: job.id,
            status: job.status,
            message: "Render started".to_string(),
            estimated_seconds: scene_count as u64 * SECONDS_PER_SCENE,
            check_url: format!("/api/v1/render/status/{}", job.id),
        })
    }

    /// Unknown or malformed ids are reported as `not_found`.
    pub async fn status(state: AppState, id: &str) -> JobStatusResponse {
        let job = match Uuid::parse_str(id) {
            Ok(uuid) => state.jobs.get(uuid).await,
            Err(_) => None,
        };
        job.map(JobStatusResponse::from)
            .unwrap_or_else(|| JobStatusResponse::not_found(id))
    }

    pub async fn list(state: AppState) -> Vec<RenderJob> {
        state.jobs.list().await
    }

    /// Forgets a finished job and deletes its published video, if any. Running jobs
    /// cannot be deleted.
    pub async fn delete(state: AppState, id: Uuid) -> Result<(), RenderError> {
        let job = state.jobs.get(id).await.ok_or(RenderError::JobNotFound)?;
        if !job.status.is_terminal() {
            return Err(RenderError::JobInProgress);
        }
        let job = state.jobs.remove(id).await.ok_or(RenderError::JobNotFound)?;

        if let Some(result) = job.result {
            match tokio::fs::remove_file(&result.path).await {
                Ok(()) => info!("🗑️ Deleted video {}", result.path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to delete video {}: {}", result.path, e),
            }
        }
        Ok(())
    }

    pub async fn cleanup(state: AppState) -> SweepReport {
        sweep_once(&state).await
    }
}
