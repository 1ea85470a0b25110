use axum::{response::IntoResponse, routing::get, Router};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::common::response::{ApiResponse, ApiSuccess};
use crate::docs::ApiDoc;
use crate::state::AppState;

pub fn configure_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/v1/health", get(health))
        .nest("/api/v1/render", crate::modules::render::router())
        // Published videos, e.g. /outputs/videos/<id>.mp4
        .nest_service("/outputs", ServeDir::new(&state.config.output_dir))
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is up", body = ApiResponse<String>)
    ),
    tag = "Health"
)]
pub async fn health() -> impl IntoResponse {
    ApiSuccess::ok(env!("CARGO_PKG_VERSION").to_string(), "ok")
}
