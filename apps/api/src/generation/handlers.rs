//! Axum route handlers for the Generation API.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::AppError;
use crate::generation::generator::{generate_resume, GeneratedVersion};
use crate::state::AppState;

/// POST /api/v1/applications/:app_id/resumes/generate
///
/// Tailors the base profile to the stored job description and saves the result as the
/// next draft version. Returns the new version number and its content.
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<Json<GeneratedVersion>, AppError> {
    let generated = generate_resume(
        state.applications.as_ref(),
        state.versions.as_ref(),
        state.generator.as_ref(),
        &state.config.base_resume_path,
        &app_id,
    )
    .await?;

    Ok(Json(generated))
}
