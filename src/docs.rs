use utoipa::OpenApi;
use crate::modules::render::dto::*;
use crate::modules::render::model::{JobStatus, RenderJob, RenderResult};
use crate::workers::sweeper::SweepReport;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::modules::render::handler::submit_render,
        crate::modules::render::handler::get_status,
        crate::modules::render::handler::list_jobs,
        crate::modules::render::handler::delete_job,
        crate::modules::render::handler::cleanup_jobs,
    ),
    components(
        schemas(
            RenderRequest, SceneRequest, SettingsRequest, TextStyleRequest,
            MusicRequest, BackdropRequest, RenderAccepted, JobStatusResponse,
            JobStatus, RenderJob, RenderResult, SweepReport,
        )
    ),
    tags(
        (name = "Render", description = "Scene-based vertical video rendering"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;
