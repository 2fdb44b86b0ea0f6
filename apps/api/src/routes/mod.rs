pub mod applications;
pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::assembly::handlers as assembly;
use crate::generation::handlers as generation;
use crate::state::AppState;
use crate::variables::handlers as variables;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/variables/defaults",
            get(variables::handle_get_defaults),
        )
        // Applications
        .route(
            "/api/v1/applications",
            get(applications::handle_list_applications)
                .post(applications::handle_create_application),
        )
        .route(
            "/api/v1/applications/:app_id",
            get(applications::handle_get_application)
                .delete(applications::handle_delete_application),
        )
        .route(
            "/api/v1/applications/:app_id/job-description",
            put(applications::handle_save_job_description),
        )
        .route(
            "/api/v1/applications/:app_id/variables",
            get(variables::handle_get_variables)
                .put(variables::handle_set_variables)
                .delete(variables::handle_clear_variables),
        )
        // Draft versions
        .route(
            "/api/v1/applications/:app_id/resumes",
            get(applications::handle_list_versions),
        )
        .route(
            "/api/v1/applications/:app_id/resumes/generate",
            post(generation::handle_generate),
        )
        .route(
            "/api/v1/applications/:app_id/resumes/:version",
            get(applications::handle_get_version).delete(applications::handle_delete_version),
        )
        // Assembly
        .route(
            "/api/v1/applications/:app_id/preview",
            post(assembly::handle_preview),
        )
        .route(
            "/api/v1/applications/:app_id/finalize",
            post(assembly::handle_finalize),
        )
        .route(
            "/api/v1/applications/:app_id/finalized",
            get(assembly::handle_get_finalized),
        )
        .route(
            "/api/v1/applications/:app_id/finalized/pdf",
            get(assembly::handle_download_finalized),
        )
        .with_state(state)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
