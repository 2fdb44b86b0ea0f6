//! Skill-line fitting.
//!
//! Every skills line is drawn as `<b>Category:</b> a, b, c` and must not wrap. When it
//! would, items are dropped from the tail until the renderer reports a single line. The
//! trim is greedy and keeps the earliest (highest-priority) items; it asks the renderer
//! at most `n + 1` times and does no width arithmetic of its own.

use serde::Serialize;
use tracing::debug;

use crate::layout::markup::escape_text;
use crate::layout::renderer::DocumentRenderer;
use crate::models::resume::{ResumeRecord, SkillBlock};
use crate::variables::{TextStyle, VariableSet};

/// What fitting did to the skills section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FitReport {
    pub kept_categories: Vec<String>,
    /// Categories whose label alone (or with any item) could not fit. Not rendered.
    pub omitted_categories: Vec<String>,
    pub skills_trimmed: usize,
}

/// The exact markup the renderer draws for one skills line.
pub fn skill_line_markup(category: &str, skills: &[String]) -> String {
    let items = skills
        .iter()
        .map(|s| escape_text(s))
        .collect::<Vec<_>>()
        .join(", ");
    if items.is_empty() {
        format!("<b>{}:</b>", escape_text(category))
    } else {
        format!("<b>{}:</b> {}", escape_text(category), items)
    }
}

/// Returns the longest prefix of `skills` whose skills line fits on one line.
///
/// Empty when not even the first item fits; the caller decides what to do with a
/// category that has nothing left.
pub fn fit_list(
    renderer: &dyn DocumentRenderer,
    category: &str,
    skills: &[String],
    style: &TextStyle,
    max_width: f32,
) -> Vec<String> {
    for len in (1..=skills.len()).rev() {
        let candidate = &skills[..len];
        if renderer.measure(&skill_line_markup(category, candidate), style, max_width) {
            return candidate.to_vec();
        }
    }
    Vec::new()
}

/// Fits every skill category of `record` to the skills style of `vars`.
///
/// Categories left with no items are omitted; when none survive the skills section is
/// removed. All other fields are returned unchanged.
pub fn fit_skills(
    renderer: &dyn DocumentRenderer,
    record: &ResumeRecord,
    vars: &VariableSet,
) -> (ResumeRecord, FitReport) {
    let mut fitted = record.clone();
    let mut report = FitReport::default();
    let Some(blocks) = record.skills.as_ref() else {
        return (fitted, report);
    };

    let style = &vars.styles.skills;
    let max_width = renderer.usable_width(vars) - style.left_indent;

    let mut kept = Vec::with_capacity(blocks.len());
    for block in blocks {
        let items = fit_list(renderer, &block.category, &block.items, style, max_width);
        report.skills_trimmed += block.items.len() - items.len();
        if items.is_empty() {
            debug!("Omitting skill category '{}': nothing fits", block.category);
            report.omitted_categories.push(block.category.clone());
            continue;
        }
        report.kept_categories.push(block.category.clone());
        kept.push(SkillBlock {
            category: block.category.clone(),
            items,
        });
    }

    fitted.skills = (!kept.is_empty()).then_some(kept);
    (fitted, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::layout::markup::plain_text;

    /// Fits while the visible text is at most `limit` characters.
    struct CharLimitRenderer {
        limit: usize,
    }

    impl DocumentRenderer for CharLimitRenderer {
        fn measure(&self, fragment: &str, _style: &TextStyle, _max_width: f32) -> bool {
            plain_text(fragment).chars().count() <= self.limit
        }

        fn usable_width(&self, _vars: &VariableSet) -> f32 {
            540.0
        }

        fn render(&self, _record: &ResumeRecord, _vars: &VariableSet) -> Result<Vec<u8>, AppError> {
            Ok(Vec::new())
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn style() -> TextStyle {
        VariableSet::default().styles.skills
    }

    #[test]
    fn test_markup_bolds_label_and_escapes() {
        assert_eq!(
            skill_line_markup("R&D", &strings(&["C++", "<Rust>"])),
            "<b>R&amp;D:</b> C++, &lt;Rust&gt;"
        );
        assert_eq!(skill_line_markup("Cloud", &[]), "<b>Cloud:</b>");
    }

    #[test]
    fn test_fit_list_drops_tail_until_line_fits() {
        // "Languages: Python, Go, Rust" is 27 characters; adding ", Java" makes 33.
        let renderer = CharLimitRenderer { limit: 30 };
        let skills = strings(&["Python", "Go", "Rust", "Java", "C++"]);
        let fitted = fit_list(&renderer, "Languages", &skills, &style(), 540.0);
        assert_eq!(fitted, strings(&["Python", "Go", "Rust"]));
    }

    #[test]
    fn test_fit_list_keeps_list_that_fits() {
        let renderer = CharLimitRenderer { limit: 200 };
        let skills = strings(&["Python", "Go"]);
        assert_eq!(fit_list(&renderer, "Languages", &skills, &style(), 540.0), skills);
    }

    #[test]
    fn test_fit_list_result_is_prefix_and_fits() {
        let skills = strings(&["Kubernetes", "Terraform", "AWS", "GCP", "Azure", "Docker"]);
        for limit in 0..80 {
            let renderer = CharLimitRenderer { limit };
            let fitted = fit_list(&renderer, "Cloud", &skills, &style(), 540.0);
            assert_eq!(&skills[..fitted.len()], fitted.as_slice());
            if !fitted.is_empty() {
                assert!(renderer.measure(&skill_line_markup("Cloud", &fitted), &style(), 540.0));
            }
        }
    }

    #[test]
    fn test_fit_list_is_idempotent() {
        let skills = strings(&["Python", "Go", "Rust", "Java", "C++"]);
        for limit in 0..60 {
            let renderer = CharLimitRenderer { limit };
            let once = fit_list(&renderer, "Languages", &skills, &style(), 540.0);
            let twice = fit_list(&renderer, "Languages", &once, &style(), 540.0);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_fit_list_empty_when_label_does_not_fit() {
        let renderer = CharLimitRenderer { limit: 5 };
        let skills = strings(&["Python"]);
        assert!(fit_list(&renderer, "Programming Languages", &skills, &style(), 540.0).is_empty());
    }

    #[test]
    fn test_fit_skills_omits_unfittable_categories() {
        let renderer = CharLimitRenderer { limit: 30 };
        let record = ResumeRecord {
            name: "Ada".to_string(),
            skills: Some(vec![
                SkillBlock {
                    category: "Languages".to_string(),
                    items: strings(&["Python", "Go", "Rust", "Java", "C++"]),
                },
                SkillBlock {
                    category: "An Extremely Long Category Label Here".to_string(),
                    items: strings(&["X"]),
                },
            ]),
            ..Default::default()
        };
        let (fitted, report) = fit_skills(&renderer, &record, &VariableSet::default());
        let skills = fitted.skills.unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].items, strings(&["Python", "Go", "Rust"]));
        assert_eq!(report.kept_categories, vec!["Languages"]);
        assert_eq!(
            report.omitted_categories,
            vec!["An Extremely Long Category Label Here"]
        );
        assert_eq!(report.skills_trimmed, 3);
    }

    #[test]
    fn test_fit_skills_removes_section_when_nothing_survives() {
        let renderer = CharLimitRenderer { limit: 0 };
        let record = ResumeRecord {
            name: "Ada".to_string(),
            skills: Some(vec![SkillBlock {
                category: "Languages".to_string(),
                items: strings(&["Python"]),
            }]),
            ..Default::default()
        };
        let (fitted, _) = fit_skills(&renderer, &record, &VariableSet::default());
        assert!(fitted.skills.is_none());
        assert_eq!(fitted.name, "Ada");
    }

    #[test]
    fn test_fit_skills_without_skills_is_identity() {
        let renderer = CharLimitRenderer { limit: 10 };
        let record = ResumeRecord {
            name: "Ada".to_string(),
            summary: Some("Engineer".to_string()),
            ..Default::default()
        };
        let (fitted, report) = fit_skills(&renderer, &record, &VariableSet::default());
        assert_eq!(fitted, record);
        assert_eq!(report, FitReport::default());
    }
}
