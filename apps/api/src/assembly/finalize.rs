//! Finalize and preview pipelines.
//!
//! A finalize moves strictly through
//! `ReceivedRequest → Filtered → Fitted → Rendered → Persisted`. Nothing is written
//! before the last step, so any failure leaves the previous finalized slot in place.
//! The record that is rendered is the record that is persisted.
//!
//! Preview runs the same steps without persisting.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::assembly::selection::filter;
use crate::errors::AppError;
use crate::layout::{fit_skills, DocumentRenderer, FitReport};
use crate::models::resume::ResumeRecord;
use crate::models::selection::SelectionMap;
use crate::models::version::{FinalizedResume, VersionRef};
use crate::store::{ApplicationStore, VersionStore};
use crate::variables::{resolve, VariableSet};

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Wire form of a preview/finalize body. Fields stay untyped until [`Self::parse`] so
/// that malformed structure surfaces as `InvalidInput` with a useful message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyPayload {
    pub resume: Value,
    #[serde(default)]
    pub selections: Value,
    #[serde(default)]
    pub variables: Option<Value>,
    #[serde(default)]
    pub base_version_file: Option<String>,
}

/// A validated preview/finalize request.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    pub resume: ResumeRecord,
    pub selections: SelectionMap,
    /// Per-request variable override, merged over the application's override.
    pub variables: Option<Value>,
}

impl AssemblyPayload {
    pub fn parse(&self) -> Result<AssemblyRequest, AppError> {
        let resume: ResumeRecord = serde_json::from_value(self.resume.clone())
            .map_err(|e| AppError::InvalidInput(format!("resume: {e}")))?;
        if resume.name.trim().is_empty() {
            return Err(AppError::InvalidInput("resume.name must not be empty".to_string()));
        }
        let selections = SelectionMap::from_value(&self.selections)?;
        if let Some(variables) = &self.variables {
            if !variables.is_null() && !variables.is_object() {
                return Err(AppError::InvalidInput(
                    "variables must be a JSON object".to_string(),
                ));
            }
        }
        Ok(AssemblyRequest {
            resume,
            selections,
            variables: self.variables.clone(),
        })
    }

    pub fn base_version(&self) -> Result<VersionRef, AppError> {
        let raw = self
            .base_version_file
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput("baseVersionFile is required".to_string()))?;
        raw.parse().map_err(AppError::InvalidInput)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Outcomes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeStage {
    ReceivedRequest,
    Filtered,
    Fitted,
    Rendered,
    Persisted,
}

impl fmt::Display for FinalizeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FinalizeStage::ReceivedRequest => "received_request",
            FinalizeStage::Filtered => "filtered",
            FinalizeStage::Fitted => "fitted",
            FinalizeStage::Rendered => "rendered",
            FinalizeStage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// The fitted record together with the document rendered from it.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub record: ResumeRecord,
    pub document: Vec<u8>,
    pub fit_report: FitReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalizeOutcome {
    pub finalized: FinalizedResume,
    pub fit_report: FitReport,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipelines
// ────────────────────────────────────────────────────────────────────────────

/// Filters, fits and renders `request` for `app_id`, then stores the result in the
/// application's finalized slot with `base_version` as its provenance.
pub async fn finalize_resume(
    versions: &dyn VersionStore,
    applications: &dyn ApplicationStore,
    renderer: Arc<dyn DocumentRenderer>,
    defaults: &VariableSet,
    app_id: &str,
    request: AssemblyRequest,
    base_version: VersionRef,
) -> Result<FinalizeOutcome, AppError> {
    debug!(app_id, stage = %FinalizeStage::ReceivedRequest, %base_version, "Finalize");
    applications.get_application(app_id).await?;
    // The base version must exist; its content is not re-read, the caller sends the
    // (possibly edited) record.
    versions.get_version(app_id, base_version).await?;

    let assembled = assemble(applications, renderer, defaults, app_id, request).await?;

    let finalized = versions
        .set_finalized(app_id, &assembled.record, base_version, &assembled.document)
        .await?;
    info!(
        app_id,
        stage = %FinalizeStage::Persisted,
        %base_version,
        skill_categories = assembled.fit_report.kept_categories.len(),
        skills_trimmed = assembled.fit_report.skills_trimmed,
        "Finalized resume"
    );

    Ok(FinalizeOutcome {
        finalized,
        fit_report: assembled.fit_report,
    })
}

/// Same steps as [`finalize_resume`] up to rendering; nothing is persisted.
pub async fn preview_resume(
    applications: &dyn ApplicationStore,
    renderer: Arc<dyn DocumentRenderer>,
    defaults: &VariableSet,
    app_id: &str,
    request: AssemblyRequest,
) -> Result<Assembled, AppError> {
    applications.get_application(app_id).await?;
    assemble(applications, renderer, defaults, app_id, request).await
}

async fn assemble(
    applications: &dyn ApplicationStore,
    renderer: Arc<dyn DocumentRenderer>,
    defaults: &VariableSet,
    app_id: &str,
    request: AssemblyRequest,
) -> Result<Assembled, AppError> {
    let filtered = filter(&request.resume, &request.selections);
    debug!(app_id, stage = %FinalizeStage::Filtered, "Finalize");

    let app_variables = applications.get_custom_variables(app_id).await?;
    let vars = resolve(defaults, app_variables.as_ref(), request.variables.as_ref())?;

    // Fitting asks the renderer to lay out every candidate line, so it runs on the
    // blocking pool together with the render itself.
    let app = app_id.to_string();
    tokio::task::spawn_blocking(move || -> Result<Assembled, AppError> {
        let (fitted, fit_report) = fit_skills(renderer.as_ref(), &filtered, &vars);
        debug!(app_id = %app, stage = %FinalizeStage::Fitted, "Finalize");
        let document = renderer.render(&fitted, &vars)?;
        debug!(
            app_id = %app,
            stage = %FinalizeStage::Rendered,
            bytes = document.len(),
            "Finalize"
        );
        Ok(Assembled {
            record: fitted,
            document,
            fit_report,
        })
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("render task failed: {e}")))?
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use serde_json::json;
    use tempfile::TempDir;

    use crate::layout::markup::plain_text;
    use crate::models::application::NewApplication;
    use crate::store::FileStore;
    use crate::variables::TextStyle;

    /// Measures by visible character count and records what it was asked to render.
    #[derive(Default)]
    struct RecordingRenderer {
        fail: bool,
        rendered: Mutex<Vec<ResumeRecord>>,
        seen_skill_sizes: Mutex<Vec<f32>>,
    }

    impl DocumentRenderer for RecordingRenderer {
        fn measure(&self, fragment: &str, style: &TextStyle, _max_width: f32) -> bool {
            if let Ok(mut sizes) = self.seen_skill_sizes.lock() {
                sizes.push(style.size);
            }
            plain_text(fragment).chars().count() <= 30
        }

        fn usable_width(&self, _vars: &VariableSet) -> f32 {
            540.0
        }

        fn render(&self, record: &ResumeRecord, _vars: &VariableSet) -> Result<Vec<u8>, AppError> {
            if self.fail {
                return Err(AppError::RenderFailure("layout exploded".to_string()));
            }
            self.rendered.lock().unwrap().push(record.clone());
            Ok(format!("%PDF stub for {}", record.name).into_bytes())
        }
    }

    const APP: &str = "Acme--Engineer";

    async fn setup() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        store
            .create_application(&NewApplication {
                company_name: "Acme".to_string(),
                role_title: "Engineer".to_string(),
                job_id: None,
            })
            .await
            .unwrap();
        for _ in 0..3 {
            store.create_version(APP, &base_record()).await.unwrap();
        }
        (dir, store)
    }

    fn base_record() -> ResumeRecord {
        serde_json::from_value(json!({
            "name": "Ada Lovelace",
            "contact": {"email": "ada@example.com"},
            "summary": "Engineer",
            "skills": [{"Languages": ["Python", "Go", "Rust", "Java", "C++"]}],
            "projects": [
                {"title": "One", "bullets": ["a"]},
                {"title": "Two", "bullets": ["b"]},
                {"title": "Three", "bullets": ["c"]}
            ]
        }))
        .unwrap()
    }

    fn payload(selections: Value) -> AssemblyPayload {
        AssemblyPayload {
            resume: serde_json::to_value(base_record()).unwrap(),
            selections,
            variables: None,
            base_version_file: Some("resume_v2.json".to_string()),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_resume_and_selections() {
        let mut bad_resume = payload(json!({}));
        bad_resume.resume = json!({"name": 5});
        assert!(matches!(bad_resume.parse(), Err(AppError::InvalidInput(_))));

        let bad_selections = payload(json!({"select-projects": "nope"}));
        assert!(matches!(bad_selections.parse(), Err(AppError::InvalidInput(_))));

        let mut missing_base = payload(json!({}));
        missing_base.base_version_file = None;
        assert!(matches!(missing_base.base_version(), Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_finalize_records_base_version_and_keeps_drafts() {
        let (_tmp, store) = setup().await;
        let renderer = Arc::new(RecordingRenderer::default());
        let p = payload(json!({}));

        let outcome = finalize_resume(
            &store,
            &store,
            renderer.clone(),
            &VariableSet::default(),
            APP,
            p.parse().unwrap(),
            p.base_version().unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.finalized.base_version, VersionRef::Numbered(2));
        let stored = store.get_finalized(APP).await.unwrap().unwrap();
        assert_eq!(stored.base_version, VersionRef::Numbered(2));
        assert_eq!(
            store.list_versions(APP).await.unwrap(),
            vec![
                VersionRef::Numbered(3),
                VersionRef::Numbered(2),
                VersionRef::Numbered(1)
            ]
        );
    }

    #[tokio::test]
    async fn test_finalize_fits_skills_and_persists_rendered_record() {
        let (_tmp, store) = setup().await;
        let renderer = Arc::new(RecordingRenderer::default());
        let p = payload(json!({}));

        finalize_resume(
            &store,
            &store,
            renderer.clone(),
            &VariableSet::default(),
            APP,
            p.parse().unwrap(),
            p.base_version().unwrap(),
        )
        .await
        .unwrap();

        let stored = store.get_finalized(APP).await.unwrap().unwrap();
        let skills = stored.resume.skills.clone().unwrap();
        assert_eq!(skills[0].items, vec!["Python", "Go", "Rust"]);
        let rendered = renderer.rendered.lock().unwrap();
        assert_eq!(rendered.as_slice(), &[stored.resume]);
        let document = store.get_finalized_document(APP).await.unwrap().unwrap();
        assert_eq!(document, b"%PDF stub for Ada Lovelace");
    }

    #[tokio::test]
    async fn test_excluded_section_has_no_key_in_finalized_record() {
        let (_tmp, store) = setup().await;
        let p = payload(json!({"select-projects": false}));
        finalize_resume(
            &store,
            &store,
            Arc::new(RecordingRenderer::default()),
            &VariableSet::default(),
            APP,
            p.parse().unwrap(),
            p.base_version().unwrap(),
        )
        .await
        .unwrap();

        let stored = store.get_finalized(APP).await.unwrap().unwrap();
        let value = serde_json::to_value(&stored.resume).unwrap();
        assert!(value.get("projects").is_none());
        assert_eq!(value["name"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_render_failure_leaves_previous_finalized_slot() {
        let (_tmp, store) = setup().await;
        let p = payload(json!({}));
        finalize_resume(
            &store,
            &store,
            Arc::new(RecordingRenderer::default()),
            &VariableSet::default(),
            APP,
            p.parse().unwrap(),
            p.base_version().unwrap(),
        )
        .await
        .unwrap();
        let before = store.get_finalized(APP).await.unwrap().unwrap();

        let mut second = payload(json!({"select-summary": false}));
        second.base_version_file = Some("resume_v3.json".to_string());
        let failing = Arc::new(RecordingRenderer {
            fail: true,
            ..Default::default()
        });
        let err = finalize_resume(
            &store,
            &store,
            failing,
            &VariableSet::default(),
            APP,
            second.parse().unwrap(),
            second.base_version().unwrap(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::RenderFailure(_)));
        assert_eq!(store.get_finalized(APP).await.unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn test_missing_base_version_is_not_found() {
        let (_tmp, store) = setup().await;
        let mut p = payload(json!({}));
        p.base_version_file = Some("resume_v9.json".to_string());
        let err = finalize_resume(
            &store,
            &store,
            Arc::new(RecordingRenderer::default()),
            &VariableSet::default(),
            APP,
            p.parse().unwrap(),
            p.base_version().unwrap(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.get_finalized(APP).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_preview_persists_nothing() {
        let (_tmp, store) = setup().await;
        let p = payload(json!({"select-projects-0": false}));
        let assembled = preview_resume(
            &store,
            Arc::new(RecordingRenderer::default()),
            &VariableSet::default(),
            APP,
            p.parse().unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(assembled.record.projects.unwrap().len(), 2);
        assert!(!assembled.document.is_empty());
        assert!(store.get_finalized(APP).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_variable_layers_reach_the_renderer() {
        let (_tmp, store) = setup().await;
        store
            .set_custom_variables(APP, &json!({"styles": {"skills": {"size": 10.0}}}))
            .await
            .unwrap();
        let renderer = Arc::new(RecordingRenderer::default());
        let mut p = payload(json!({}));
        p.variables = Some(json!({"styles": {"skills": {"size": 8.0}}}));
        preview_resume(
            &store,
            renderer.clone(),
            &VariableSet::default(),
            APP,
            p.parse().unwrap(),
        )
        .await
        .unwrap();
        let sizes = renderer.seen_skill_sizes.lock().unwrap();
        assert!(!sizes.is_empty());
        assert!(sizes.iter().all(|size| *size == 8.0));
    }
}
