//! Axum route handlers for formatting variables.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::state::AppState;
use crate::variables::{resolve, VariableSet};

#[derive(Debug, Serialize)]
pub struct ApplicationVariablesResponse {
    /// The stored override tree, `null` when the application uses the defaults.
    pub overrides: Option<Value>,
    /// Defaults with the override applied.
    pub effective: VariableSet,
}

/// GET /api/v1/variables/defaults
pub async fn handle_get_defaults(State(state): State<AppState>) -> Json<VariableSet> {
    Json(state.default_variables.as_ref().clone())
}

/// GET /api/v1/applications/:app_id/variables
pub async fn handle_get_variables(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<Json<ApplicationVariablesResponse>, AppError> {
    let overrides = state.applications.get_custom_variables(&app_id).await?;
    let effective = resolve(&state.default_variables, overrides.as_ref(), None)?;
    Ok(Json(ApplicationVariablesResponse {
        overrides,
        effective,
    }))
}

/// PUT /api/v1/applications/:app_id/variables
///
/// Stores a partial override tree. It is validated against the defaults first, so
/// unknown keys or wrongly typed values are rejected and nothing is written.
pub async fn handle_set_variables(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    overrides: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApplicationVariablesResponse>, AppError> {
    let Json(overrides) = overrides?;
    if !overrides.is_object() {
        return Err(AppError::InvalidInput(
            "variables override must be a JSON object".to_string(),
        ));
    }
    let effective = resolve(&state.default_variables, Some(&overrides), None)?;
    state
        .applications
        .set_custom_variables(&app_id, &overrides)
        .await?;

    Ok(Json(ApplicationVariablesResponse {
        overrides: Some(overrides),
        effective,
    }))
}

/// DELETE /api/v1/applications/:app_id/variables
pub async fn handle_clear_variables(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.applications.clear_custom_variables(&app_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
