//! Combines the fixed base profile with generated content.

use crate::models::resume::{GeneratedContent, ResumeRecord};
use crate::models::selection::Section;

/// Returns `fixed` with the generated fields applied.
///
/// - `summary` replaces the base summary when present.
/// - `skills` replaces the whole skills list when present and non-empty.
/// - `experience_bullets[i]` replaces the bullets of base experience entry `i` only;
///   extra generated entries are ignored and trailing base entries keep their bullets.
/// - `projects` replaces the whole project list (including its order) when present and
///   non-empty.
///
/// Everything else (name, contact, education, certifications, company/title/dates of
/// each experience entry) is carried over from `fixed` untouched.
pub fn merge(fixed: &ResumeRecord, generated: &GeneratedContent) -> ResumeRecord {
    let mut merged = fixed.clone();

    if let Some(summary) = &generated.summary {
        merged.summary = Some(summary.clone());
    }

    if let Some(skills) = generated.skills.as_ref().filter(|s| !s.is_empty()) {
        merged.skills = Some(skills.clone());
        merged.source_indices.remove(&Section::Skills);
    }

    if let (Some(experience), Some(bullet_sets)) = (
        merged.experience.as_mut(),
        generated.experience_bullets.as_ref(),
    ) {
        for (entry, generated) in experience.iter_mut().zip(bullet_sets) {
            entry.bullets = generated.bullets.clone();
        }
    }

    if let Some(projects) = generated.projects.as_ref().filter(|p| !p.is_empty()) {
        merged.projects = Some(projects.clone());
        merged.source_indices.remove(&Section::Projects);
    }

    merged
}
