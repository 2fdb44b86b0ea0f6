//! Resume generation: tailors the base profile to an application's job description.
//!
//! Flow: load base profile + job description → build prompt → one generator call →
//!       validate into `GeneratedContent` → merge over the base → new draft version.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::assembly::merge::merge;
use crate::errors::AppError;
use crate::generation::job_description::html_to_text;
use crate::generation::prompts::build_tailor_prompt;
use crate::llm_client::{strip_code_fences, ContentGenerator, LlmError};
use crate::models::resume::{GeneratedContent, ResumeRecord};
use crate::models::version::VersionRef;
use crate::store::{ApplicationStore, VersionStore};

/// Longest slice of malformed output written to the log.
const RAW_LOG_PREVIEW: usize = 500;

/// A freshly created draft version.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedVersion {
    pub version: u32,
    pub version_file: String,
    pub resume: ResumeRecord,
}

// ────────────────────────────────────────────────────────────────────────────
// Generator output adapter
// ────────────────────────────────────────────────────────────────────────────

/// Validates raw generator text into `GeneratedContent`.
///
/// Blank output is an upstream failure (retryable). Output that is present but is not
/// a JSON object with at least one recognised field is malformed, and the raw text is
/// carried in the error.
pub fn parse_generated_content(raw: &str) -> Result<GeneratedContent, AppError> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(LlmError::EmptyContent.into());
    }

    let malformed = |message: String| {
        let preview: String = raw.chars().take(RAW_LOG_PREVIEW).collect();
        warn!("Malformed generator output ({message}): {preview}");
        AppError::UpstreamGeneratorMalformed {
            message,
            raw: raw.to_string(),
        }
    };

    let value: Value =
        serde_json::from_str(body).map_err(|e| malformed(format!("not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(malformed("expected a JSON object".to_string()));
    }
    let content: GeneratedContent = serde_json::from_value(value)
        .map_err(|e| malformed(format!("unexpected structure: {e}")))?;
    if content.is_empty() {
        return Err(malformed(
            "none of summary, skills_reordered, experience_bullets, projects_reordered present"
                .to_string(),
        ));
    }
    Ok(content)
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Reads the fixed base profile. Missing or unparsable is a server-side problem.
pub async fn load_base_resume(path: &Path) -> Result<ResumeRecord, AppError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read base resume at {}", path.display()))?;
    let record = serde_json::from_str(&raw)
        .with_context(|| format!("Base resume at {} is not a valid resume", path.display()))?;
    Ok(record)
}

/// Runs the generation pipeline for `app_id` and persists the result as a new draft.
///
/// Steps:
/// 1. application exists, job description stored
/// 2. base profile from `base_resume_path`
/// 3. single generator call (no retry; the error carries the retryable label)
/// 4. validate → merge over the base → `create_version`
pub async fn generate_resume(
    applications: &dyn ApplicationStore,
    versions: &dyn VersionStore,
    generator: &dyn ContentGenerator,
    base_resume_path: &Path,
    app_id: &str,
) -> Result<GeneratedVersion, AppError> {
    applications.get_application(app_id).await?;

    let html = applications
        .load_job_description(app_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No job description saved for {app_id}")))?;
    let job_description = html_to_text(&html);
    if job_description.is_empty() {
        return Err(AppError::InvalidInput(
            "Job description has no text content".to_string(),
        ));
    }

    let base = load_base_resume(base_resume_path).await?;
    let prompt = build_tailor_prompt(&job_description, &serde_json::to_string_pretty(&base)?);

    info!("Generating tailored resume for {app_id}");
    let raw = generator.generate(&prompt).await?;
    let generated = parse_generated_content(&raw)?;

    let merged = merge(&base, &generated);
    let version = versions.create_version(app_id, &merged).await?;
    info!(app_id, version, "Generated draft version");

    Ok(GeneratedVersion {
        version,
        version_file: VersionRef::Numbered(version).file_name(),
        resume: merged,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
