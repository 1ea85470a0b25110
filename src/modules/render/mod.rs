use axum::Router;
use axum::routing::{delete, get, post};
use crate::state::AppState;

pub mod dto;
pub mod error;
pub mod handler;
pub mod model;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::submit_render))
        .route("/status/{id}", get(handler::get_status))
        .route("/jobs", get(handler::list_jobs))
        .route("/jobs/cleanup", post(handler::cleanup_jobs))
        .route("/{id}", delete(handler::delete_job))
}
