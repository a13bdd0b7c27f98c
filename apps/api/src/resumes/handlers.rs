//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::auth::credential_from_headers;
use crate::errors::AppError;
use crate::export::{ExportFormat, ExportOutcome, ExportStatus, RenderSurface, SnapshotSurface};
use crate::models::resume::{Resume, StoredResume};
use crate::state::AppState;

const SNAPSHOT_FIELD: &str = "snapshot";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SaveResumeResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes
///
/// Saves the submitted form for the signed-in user.
pub async fn handle_save_resume(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(resume): Json<Resume>,
) -> Result<(StatusCode, Json<SaveResumeResponse>), AppError> {
    let user = state
        .auth
        .current_user(credential_from_headers(&headers))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Please sign in to save your resume".to_string()))?;

    let id = state.store.save(user.id, &resume).await?;

    Ok((StatusCode::CREATED, Json(SaveResumeResponse { id })))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredResume>, AppError> {
    let stored = state
        .store
        .load(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(stored))
}

/// POST /api/v1/resumes/:id/export?format=txt|docx|pdf
///
/// No rendered surface accompanies this request, so `pdf` is a no-op (204).
/// Use the snapshot endpoint to export PDF.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let format = query
        .format
        .parse::<ExportFormat>()
        .map_err(AppError::Validation)?;
    run_export(&state, id, None, format).await
}

/// POST /api/v1/resumes/:id/export/snapshot
///
/// Multipart upload with a `snapshot` field holding a PNG of the rendered
/// resume. The snapshot is embedded into `resume.pdf`.
pub async fn handle_export_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut snapshot = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(SNAPSHOT_FIELD) {
            warn!("Ignoring unexpected multipart field {:?}", field.name());
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("unreadable snapshot: {e}")))?;
        snapshot = Some(SnapshotSurface::from_png(bytes));
    }

    let surface = snapshot.as_ref().map(|s| s as &dyn RenderSurface);
    run_export(&state, id, surface, ExportFormat::Pdf).await
}

/// GET /api/v1/resumes/:id/export/status
///
/// Lets the client disable its export controls while a run of this resume is in flight.
pub async fn handle_export_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<ExportStatus> {
    Json(state.dispatcher.status(id))
}

async fn run_export(
    state: &AppState,
    id: Uuid,
    surface: Option<&dyn RenderSurface>,
    format: ExportFormat,
) -> Result<Response, AppError> {
    let stored = state
        .store
        .load(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;

    match state
        .dispatcher
        .export(id, Some(&stored.resume.0), surface, format)
        .await
    {
        ExportOutcome::Delivered(receipt) => Ok(Json(receipt).into_response()),
        ExportOutcome::Skipped => Ok(StatusCode::NO_CONTENT.into_response()),
        ExportOutcome::Busy => Err(AppError::Conflict(
            "An export is already in progress".to_string(),
        )),
        ExportOutcome::Failed { message } => Err(AppError::ExportFailed(message)),
    }
}
