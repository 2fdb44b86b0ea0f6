//! Axum route handlers for applications, job descriptions, and draft versions.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::application::{Application, NewApplication};
use crate::models::resume::ResumeRecord;
use crate::models::version::VersionRef;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptionRequest {
    pub html_content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub file: String,
    /// `None` for the legacy unnumbered draft.
    pub version: Option<u32>,
}

impl From<VersionRef> for VersionSummary {
    fn from(version: VersionRef) -> Self {
        Self {
            file: version.file_name(),
            version: version.number(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub job_description: Option<String>,
    pub versions: Vec<VersionSummary>,
    pub has_finalized: bool,
}

fn parse_version(raw: &str) -> Result<VersionRef, AppError> {
    raw.parse().map_err(AppError::InvalidInput)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/applications
///
/// Most recently updated first.
pub async fn handle_list_applications(
    State(state): State<AppState>,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(state.applications.list_applications().await?))
}

/// POST /api/v1/applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    request: Result<Json<NewApplication>, JsonRejection>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let Json(request) = request?;
    let application = state.applications.create_application(&request).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/applications/:app_id
///
/// Metadata plus the stored job description, the draft versions, and whether a
/// finalized resume exists.
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<Json<ApplicationDetail>, AppError> {
    let application = state.applications.get_application(&app_id).await?;
    let job_description = state.applications.load_job_description(&app_id).await?;
    let versions = state.versions.list_versions(&app_id).await?;
    let has_finalized = state.versions.get_finalized(&app_id).await?.is_some();

    Ok(Json(ApplicationDetail {
        application,
        job_description,
        versions: versions.into_iter().map(VersionSummary::from).collect(),
        has_finalized,
    }))
}

/// DELETE /api/v1/applications/:app_id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.applications.delete_application(&app_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/applications/:app_id/job-description
pub async fn handle_save_job_description(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    request: Result<Json<JobDescriptionRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(request) = request?;
    if request.html_content.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "htmlContent cannot be empty".to_string(),
        ));
    }
    state
        .applications
        .save_job_description(&app_id, &request.html_content)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/applications/:app_id/resumes
///
/// Newest first; the legacy unnumbered draft, if any, is last.
pub async fn handle_list_versions(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<Json<Vec<VersionSummary>>, AppError> {
    let versions = state.versions.list_versions(&app_id).await?;
    Ok(Json(versions.into_iter().map(VersionSummary::from).collect()))
}

/// GET /api/v1/applications/:app_id/resumes/:version
///
/// `:version` accepts `resume_v3.json`, `v3`, `3`, or `resume.json`.
pub async fn handle_get_version(
    State(state): State<AppState>,
    Path((app_id, version)): Path<(String, String)>,
) -> Result<Json<ResumeRecord>, AppError> {
    let version = parse_version(&version)?;
    Ok(Json(state.versions.get_version(&app_id, version).await?))
}

/// DELETE /api/v1/applications/:app_id/resumes/:version
pub async fn handle_delete_version(
    State(state): State<AppState>,
    Path((app_id, version)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let version = parse_version(&version)?;
    state.versions.delete_version(&app_id, version).await?;
    Ok(StatusCode::NO_CONTENT)
}
