//! Formatting variables: a typed configuration tree resolved from three layers.
//!
//! `defaults` (process-wide, loaded once) ← per-application override ← per-request
//! override. Overrides are untyped JSON trees merged key by key onto the serialized
//! defaults; the merged tree is then deserialized back into [`VariableSet`], so unknown
//! keys and wrongly typed values are rejected instead of silently carried along.

pub mod handlers;

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::layout::font_metrics::FontFace;

// ────────────────────────────────────────────────────────────────────────────
// Typed tree
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableSet {
    pub page: PageSettings,
    pub styles: StyleSheet,
    pub section_rule: RuleSettings,
    pub spacing: Spacing,
}

/// Page geometry in points. Defaults to US letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSettings {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

/// One style per document element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleSheet {
    pub name: TextStyle,
    pub contact: TextStyle,
    pub section: TextStyle,
    pub body: TextStyle,
    pub bullet: TextStyle,
    pub skills: TextStyle,
    pub institution: TextStyle,
    pub job_title: TextStyle,
    pub job_details: TextStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextStyle {
    pub font: FontFace,
    pub size: f32,
    /// Baseline-to-baseline distance.
    pub leading: f32,
    pub alignment: Alignment,
    pub space_before: f32,
    pub space_after: f32,
    pub left_indent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Horizontal rule drawn under each section header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSettings {
    pub thickness: f32,
    pub space_after: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Spacing {
    /// Vertical gap between consecutive entries of one section.
    pub entry_gap: f32,
}

impl TextStyle {
    fn new(font: FontFace, size: f32, leading: f32) -> Self {
        Self {
            font,
            size,
            leading,
            alignment: Alignment::Left,
            space_before: 0.0,
            space_after: 0.0,
            left_indent: 0.0,
        }
    }
}

/// Embedded fallback: used when the defaults file is missing or unreadable.
impl Default for VariableSet {
    fn default() -> Self {
        let body = TextStyle::new(FontFace::Helvetica, 9.5, 12.0);
        Self {
            page: PageSettings {
                width: 612.0,
                height: 792.0,
                margin_left: 36.0,
                margin_right: 36.0,
                margin_top: 18.0,
                margin_bottom: 36.0,
            },
            styles: StyleSheet {
                name: TextStyle {
                    alignment: Alignment::Center,
                    space_after: 10.0,
                    ..TextStyle::new(FontFace::HelveticaBold, 15.0, 18.0)
                },
                contact: TextStyle {
                    alignment: Alignment::Center,
                    space_after: 2.0,
                    ..TextStyle::new(FontFace::Helvetica, 9.0, 11.0)
                },
                section: TextStyle {
                    space_before: 10.0,
                    space_after: 4.0,
                    ..TextStyle::new(FontFace::HelveticaBold, 11.0, 13.0)
                },
                body: body.clone(),
                bullet: TextStyle {
                    left_indent: 12.0,
                    space_after: 2.0,
                    ..body.clone()
                },
                skills: TextStyle {
                    space_after: 1.0,
                    ..body
                },
                institution: TextStyle::new(FontFace::HelveticaBold, 10.0, 12.0),
                job_title: TextStyle::new(FontFace::HelveticaBold, 10.0, 12.0),
                job_details: TextStyle {
                    space_after: 4.0,
                    ..TextStyle::new(FontFace::Helvetica, 9.0, 11.0)
                },
            },
            section_rule: RuleSettings {
                thickness: 0.5,
                space_after: 4.0,
            },
            spacing: Spacing { entry_gap: 4.0 },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Numeric checks
// ────────────────────────────────────────────────────────────────────────────

fn positive(field: &str, value: f32) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{field} must be greater than zero, got {value}"))
    }
}

fn non_negative(field: &str, value: f32) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{field} must not be negative, got {value}"))
    }
}

impl TextStyle {
    fn validate(&self, name: &str) -> Result<(), String> {
        positive(&format!("styles.{name}.size"), self.size)?;
        positive(&format!("styles.{name}.leading"), self.leading)?;
        non_negative(&format!("styles.{name}.space_before"), self.space_before)?;
        non_negative(&format!("styles.{name}.space_after"), self.space_after)?;
        non_negative(&format!("styles.{name}.left_indent"), self.left_indent)
    }
}

impl VariableSet {
    /// Rejects values the layout cannot work with. A zero or negative leading or
    /// font size would make every line measure as fitting.
    pub fn validate(&self) -> Result<(), String> {
        let page = &self.page;
        positive("page.width", page.width)?;
        positive("page.height", page.height)?;
        non_negative("page.margin_left", page.margin_left)?;
        non_negative("page.margin_right", page.margin_right)?;
        non_negative("page.margin_top", page.margin_top)?;
        non_negative("page.margin_bottom", page.margin_bottom)?;
        positive(
            "page width minus horizontal margins",
            page.width - page.margin_left - page.margin_right,
        )?;
        positive(
            "page height minus vertical margins",
            page.height - page.margin_top - page.margin_bottom,
        )?;

        let styles = &self.styles;
        for (name, style) in [
            ("name", &styles.name),
            ("contact", &styles.contact),
            ("section", &styles.section),
            ("body", &styles.body),
            ("bullet", &styles.bullet),
            ("skills", &styles.skills),
            ("institution", &styles.institution),
            ("job_title", &styles.job_title),
            ("job_details", &styles.job_details),
        ] {
            style.validate(name)?;
        }

        non_negative("section_rule.thickness", self.section_rule.thickness)?;
        non_negative("section_rule.space_after", self.section_rule.space_after)?;
        non_negative("spacing.entry_gap", self.spacing.entry_gap)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Merge + resolve
// ────────────────────────────────────────────────────────────────────────────

/// Recursively merges `overlay` into `base`.
///
/// When both sides hold an object at a key, the merge recurses; otherwise the overlay
/// value replaces the base value outright, whatever either type is.
pub fn merge_tree(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let both_objects =
                    value.is_object() && base_map.get(key).is_some_and(Value::is_object);
                if both_objects {
                    if let Some(existing) = base_map.get_mut(key) {
                        merge_tree(existing, value);
                    }
                } else {
                    base_map.insert(key.clone(), value.clone());
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Resolves the effective variables for one rendering operation.
///
/// Precedence: `request` over `application` over `defaults`. `None` and JSON `null`
/// overrides are no-ops. Neither input is modified; the result is a fresh value.
/// The merged set must pass [`VariableSet::validate`].
pub fn resolve(
    defaults: &VariableSet,
    application: Option<&Value>,
    request: Option<&Value>,
) -> Result<VariableSet, AppError> {
    let mut tree = serde_json::to_value(defaults)?;
    for layer in [application, request].into_iter().flatten() {
        if !layer.is_null() {
            merge_tree(&mut tree, layer);
        }
    }
    let vars: VariableSet = serde_json::from_value(tree)
        .map_err(|e| AppError::InvalidInput(format!("invalid formatting variables: {e}")))?;
    vars.validate()
        .map_err(|e| AppError::InvalidInput(format!("invalid formatting variables: {e}")))?;
    Ok(vars)
}

/// Loads the process-wide defaults.
///
/// The file may be partial: it is merged over the embedded defaults. A missing or
/// malformed file falls back to [`VariableSet::default`] with a warning.
pub fn load_defaults(path: &Path) -> VariableSet {
    let embedded = VariableSet::default();
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(
                "Formatting defaults not readable at {}: {e}; using embedded defaults",
                path.display()
            );
            return embedded;
        }
    };
    let parsed = serde_json::from_str::<Value>(&raw)
        .map_err(|e| AppError::InvalidInput(e.to_string()))
        .and_then(|file| resolve(&embedded, Some(&file), None));
    match parsed {
        Ok(vars) => {
            info!("Loaded formatting defaults from {}", path.display());
            vars
        }
        Err(e) => {
            warn!(
                "Formatting defaults at {} are malformed ({e}); using embedded defaults",
                path.display()
            );
            embedded
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_merge_recurses_into_objects() {
        let mut base = json!({"a": {"x": 1, "y": 2}, "b": 3});
        merge_tree(&mut base, &json!({"a": {"y": 20}}));
        assert_eq!(base, json!({"a": {"x": 1, "y": 20}, "b": 3}));
    }

    #[test]
    fn test_merge_replaces_across_types() {
        let mut base = json!({"a": {"x": 1}, "b": 3});
        merge_tree(&mut base, &json!({"a": 5, "b": {"z": 1}}));
        assert_eq!(base, json!({"a": 5, "b": {"z": 1}}));
    }

    #[test]
    fn test_request_layer_wins_over_application_and_defaults() {
        let defaults = VariableSet::default();
        let app = json!({"styles": {"skills": {"size": 10.0}}});
        let request = json!({"styles": {"skills": {"size": 8.0}}});
        let resolved = resolve(&defaults, Some(&app), Some(&request)).unwrap();
        assert_eq!(resolved.styles.skills.size, 8.0);
    }

    #[test]
    fn test_keys_only_in_defaults_fall_through() {
        let defaults = VariableSet::default();
        let app = json!({"styles": {"skills": {"size": 10.0}}});
        let resolved = resolve(&defaults, Some(&app), None).unwrap();
        assert_eq!(resolved.styles.skills.size, 10.0);
        assert_eq!(resolved.styles.skills.leading, defaults.styles.skills.leading);
        assert_eq!(resolved.page, defaults.page);
    }

    #[test]
    fn test_absent_and_null_layers_are_no_ops() {
        let defaults = VariableSet::default();
        assert_eq!(resolve(&defaults, None, None).unwrap(), defaults);
        assert_eq!(
            resolve(&defaults, Some(&Value::Null), Some(&json!({}))).unwrap(),
            defaults
        );
    }

    #[test]
    fn test_resolve_leaves_defaults_untouched() {
        let defaults = VariableSet::default();
        let snapshot = defaults.clone();
        let _ = resolve(&defaults, Some(&json!({"page": {"margin_left": 72.0}})), None).unwrap();
        assert_eq!(defaults, snapshot);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let defaults = VariableSet::default();
        let err = resolve(&defaults, None, Some(&json!({"styles": {"skils": {}}}))).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_scalar_replacing_section_is_rejected_by_schema() {
        let defaults = VariableSet::default();
        let err = resolve(&defaults, Some(&json!({"page": 12})), None).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_embedded_defaults_are_valid() {
        assert!(VariableSet::default().validate().is_ok());
    }

    #[test]
    fn test_zero_leading_is_rejected() {
        let defaults = VariableSet::default();
        let err = resolve(
            &defaults,
            None,
            Some(&json!({"styles": {"skills": {"leading": 0.0}}})),
        )
        .unwrap_err();
        match err {
            AppError::InvalidInput(msg) => assert!(msg.contains("styles.skills.leading")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_negative_font_size_is_rejected() {
        let defaults = VariableSet::default();
        let err = resolve(
            &defaults,
            Some(&json!({"styles": {"body": {"size": -9.5}}})),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_margins_must_leave_room_on_the_page() {
        let defaults = VariableSet::default();
        assert!(matches!(
            resolve(&defaults, None, Some(&json!({"page": {"margin_left": -1.0}}))),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            resolve(
                &defaults,
                None,
                Some(&json!({"page": {"margin_left": 306.0, "margin_right": 306.0}}))
            ),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            resolve(&defaults, None, Some(&json!({"page": {"width": 0.0}}))),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_load_defaults_with_bad_numbers_uses_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.json");
        std::fs::write(&path, r#"{"styles": {"skills": {"leading": 0}}}"#).unwrap();
        assert_eq!(load_defaults(&path), VariableSet::default());
    }

    #[test]
    fn test_font_names_use_postscript_names() {
        let defaults = VariableSet::default();
        let resolved = resolve(
            &defaults,
            None,
            Some(&json!({"styles": {"body": {"font": "Courier"}}})),
        )
        .unwrap();
        assert_eq!(resolved.styles.body.font, FontFace::Courier);
    }

    #[test]
    fn test_load_defaults_missing_file_uses_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let vars = load_defaults(&dir.path().join("missing.json"));
        assert_eq!(vars, VariableSet::default());
    }

    #[test]
    fn test_load_defaults_malformed_file_uses_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.json");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"{ not json")
            .unwrap();
        assert_eq!(load_defaults(&path), VariableSet::default());
    }

    #[test]
    fn test_load_defaults_partial_file_is_merged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.json");
        std::fs::write(&path, r#"{"page": {"margin_left": 54}}"#).unwrap();
        let vars = load_defaults(&path);
        assert_eq!(vars.page.margin_left, 54.0);
        assert_eq!(vars.page.margin_right, 36.0);
    }
}
