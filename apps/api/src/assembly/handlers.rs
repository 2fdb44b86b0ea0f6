//! Axum route handlers for preview, finalize, and the finalized slot.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;

use crate::assembly::finalize::{finalize_resume, preview_resume, AssemblyPayload, FinalizeOutcome};
use crate::errors::AppError;
use crate::models::version::FinalizedResume;
use crate::state::AppState;

fn pdf_response(document: Bytes, disposition: String) -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document,
    )
}

/// POST /api/v1/applications/:app_id/preview
///
/// Filters, fits and renders the posted resume. Returns the PDF; nothing is stored.
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    payload: Result<Json<AssemblyPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let request = payload.parse()?;
    let assembled = preview_resume(
        state.applications.as_ref(),
        state.renderer.clone(),
        &state.default_variables,
        &app_id,
        request,
    )
    .await?;

    Ok(pdf_response(
        Bytes::from(assembled.document),
        format!("inline; filename=\"{app_id}_preview.pdf\""),
    ))
}

/// POST /api/v1/applications/:app_id/finalize
///
/// Same as preview, then replaces the application's finalized slot with the fitted
/// record and its PDF. `baseVersionFile` names the draft the edit started from.
pub async fn handle_finalize(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    payload: Result<Json<AssemblyPayload>, JsonRejection>,
) -> Result<Json<FinalizeOutcome>, AppError> {
    let Json(payload) = payload?;
    let base_version = payload.base_version()?;
    let request = payload.parse()?;
    let outcome = finalize_resume(
        state.versions.as_ref(),
        state.applications.as_ref(),
        state.renderer.clone(),
        &state.default_variables,
        &app_id,
        request,
        base_version,
    )
    .await?;

    Ok(Json(outcome))
}

/// GET /api/v1/applications/:app_id/finalized
pub async fn handle_get_finalized(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<Json<FinalizedResume>, AppError> {
    let finalized = state
        .versions
        .get_finalized(&app_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No finalized resume for {app_id}")))?;
    Ok(Json(finalized))
}

/// GET /api/v1/applications/:app_id/finalized/pdf
pub async fn handle_download_finalized(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let document = state
        .versions
        .get_finalized_document(&app_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No finalized resume for {app_id}")))?;

    Ok(pdf_response(
        Bytes::from(document),
        format!("attachment; filename=\"{app_id}_resume.pdf\""),
    ))
}
