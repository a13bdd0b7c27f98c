pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::form;
use crate::resumes::handlers;
use crate::state::AppState;

/// Rendered snapshots of a long resume at device resolution can run to several MB.
const SNAPSHOT_BODY_LIMIT: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resumes", post(handlers::handle_save_resume))
        .route("/api/v1/resumes/:id", get(handlers::handle_get_resume))
        .route("/api/v1/resumes/:id/export", post(handlers::handle_export))
        .route(
            "/api/v1/resumes/:id/export/snapshot",
            post(handlers::handle_export_snapshot).layer(DefaultBodyLimit::max(SNAPSHOT_BODY_LIMIT)),
        )
        .route(
            "/api/v1/resumes/:id/export/status",
            get(handlers::handle_export_status),
        )
        .route("/api/v1/form/reduce", post(form::handlers::handle_reduce))
        .with_state(state)
}
