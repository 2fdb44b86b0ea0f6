//! Applies a user's selection map to a resume record.

use std::collections::BTreeMap;

use crate::models::resume::{Contact, ResumeRecord};
use crate::models::selection::{ContactField, Section, SelectionMap};

/// Returns a filtered copy of `record`.
///
/// Sections switched off are removed. Items are matched by their index in the
/// unfiltered record, so when `record` was itself produced by `filter` its recorded
/// `source_indices` are used to map positions back; re-applying the same map is then a
/// no-op. A list with no surviving items is removed rather than emitted empty. Contact
/// overrides apply regardless of section rules, and the name is always kept.
pub fn filter(record: &ResumeRecord, selections: &SelectionMap) -> ResumeRecord {
    let mut origins = BTreeMap::new();

    let summary = record
        .summary
        .clone()
        .filter(|_| selections.section_included(Section::Summary));

    let education = filter_list(
        record,
        selections,
        Section::Education,
        record.education.as_deref(),
        &mut origins,
    );
    let skills = filter_list(
        record,
        selections,
        Section::Skills,
        record.skills.as_deref(),
        &mut origins,
    );
    let experience = filter_list(
        record,
        selections,
        Section::Experience,
        record.experience.as_deref(),
        &mut origins,
    );
    let projects = filter_list(
        record,
        selections,
        Section::Projects,
        record.projects.as_deref(),
        &mut origins,
    );
    let certifications = filter_list(
        record,
        selections,
        Section::Certifications,
        record.certifications.as_deref(),
        &mut origins,
    );

    let mut contact = record.contact.clone();
    for (field, value) in selections.contact_overrides() {
        let value = value.trim();
        *contact_slot(&mut contact, field) = (!value.is_empty()).then(|| value.to_string());
    }

    ResumeRecord {
        name: record.name.clone(),
        contact,
        summary,
        education,
        skills,
        experience,
        projects,
        certifications,
        source_indices: origins,
    }
}

fn filter_list<T: Clone>(
    record: &ResumeRecord,
    selections: &SelectionMap,
    section: Section,
    items: Option<&[T]>,
    origins: &mut BTreeMap<Section, Vec<usize>>,
) -> Option<Vec<T>> {
    let items = items?;
    if !selections.section_included(section) {
        return None;
    }

    let provenance = record
        .source_indices
        .get(&section)
        .filter(|indices| indices.len() == items.len());

    let mut kept = Vec::with_capacity(items.len());
    let mut kept_origins = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let original = provenance.map_or(position, |indices| indices[position]);
        if selections.item_included(section, original) {
            kept.push(item.clone());
            kept_origins.push(original);
        }
    }

    if kept.is_empty() {
        return None;
    }
    let renumbered = kept_origins
        .iter()
        .enumerate()
        .any(|(position, original)| position != *original);
    if renumbered {
        origins.insert(section, kept_origins);
    }
    Some(kept)
}

fn contact_slot(contact: &mut Contact, field: ContactField) -> &mut Option<String> {
    match field {
        ContactField::Email => &mut contact.email,
        ContactField::Phone => &mut contact.phone,
        ContactField::Location => &mut contact.location,
        ContactField::Linkedin => &mut contact.linkedin,
        ContactField::Github => &mut contact.github,
        ContactField::Medium => &mut contact.medium,
        ContactField::Website => &mut contact.website,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{ExperienceEntry, ProjectEntry, SkillBlock};
    use serde_json::json;

    fn project(title: &str) -> ProjectEntry {
        ProjectEntry {
            title: title.to_string(),
            dates: None,
            bullets: vec![format!("{title} bullet")],
        }
    }

    fn experience(company: &str) -> ExperienceEntry {
        ExperienceEntry {
            company: company.to_string(),
            title: "Engineer".to_string(),
            location: None,
            dates: None,
            bullets: vec!["did things".to_string()],
        }
    }

    fn record() -> ResumeRecord {
        ResumeRecord {
            name: "Ada Lovelace".to_string(),
            contact: Contact {
                email: Some("ada@example.com".to_string()),
                location: Some("London".to_string()),
                ..Default::default()
            },
            summary: Some("Summary".to_string()),
            skills: Some(vec![
                SkillBlock {
                    category: "Languages".to_string(),
                    items: vec!["Rust".to_string()],
                },
                SkillBlock {
                    category: "Cloud".to_string(),
                    items: vec!["AWS".to_string()],
                },
            ]),
            experience: Some(vec![
                experience("Acme"),
                experience("Globex"),
                experience("Initech"),
            ]),
            projects: Some(vec![project("One"), project("Two"), project("Three")]),
            ..Default::default()
        }
    }

    fn selections(value: serde_json::Value) -> SelectionMap {
        SelectionMap::from_value(&value).unwrap()
    }

    #[test]
    fn test_empty_selection_keeps_everything() {
        let r = record();
        assert_eq!(filter(&r, &SelectionMap::default()), r);
    }

    #[test]
    fn test_section_exclusion_removes_key_entirely() {
        let filtered = filter(&record(), &selections(json!({"select-projects": false})));
        assert!(filtered.projects.is_none());
        let value = serde_json::to_value(&filtered).unwrap();
        assert!(value.get("projects").is_none());
    }

    #[test]
    fn test_item_exclusion_uses_original_indices() {
        let filtered = filter(
            &record(),
            &selections(json!({"select-experience-0": false, "select-experience-2": false})),
        );
        let companies: Vec<String> = filtered
            .experience
            .unwrap()
            .into_iter()
            .map(|e| e.company)
            .collect();
        assert_eq!(companies, vec!["Globex"]);
    }

    #[test]
    fn test_excluding_every_item_drops_section() {
        let filtered = filter(
            &record(),
            &selections(json!({
                "select-skills-0": false,
                "select-skills-1": false
            })),
        );
        assert!(filtered.skills.is_none());
    }

    #[test]
    fn test_summary_can_be_excluded() {
        let filtered = filter(&record(), &selections(json!({"select-summary": false})));
        assert!(filtered.summary.is_none());
        assert_eq!(filtered.name, "Ada Lovelace");
    }

    #[test]
    fn test_contact_overrides_apply_independently() {
        let filtered = filter(
            &record(),
            &selections(json!({
                "select-summary": false,
                "contact-email": "work@example.com",
                "contact-location": ""
            })),
        );
        assert_eq!(filtered.contact.email.as_deref(), Some("work@example.com"));
        assert!(filtered.contact.location.is_none());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let r = record();
        for s in [
            json!({}),
            json!({"select-projects": false}),
            json!({"select-projects-0": false}),
            json!({"select-projects-1": false, "select-experience-0": false}),
            json!({
                "select-experience-0": false,
                "select-experience-1": false,
                "select-experience-2": false
            }),
            json!({"select-skills-1": false, "contact-email": "x@y.z"}),
        ] {
            let s = selections(s);
            let once = filter(&r, &s);
            let twice = filter(&once, &s);
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn test_refiltering_keeps_items_matched_to_original_positions() {
        let s = selections(json!({"select-projects-0": false, "select-projects-2": false}));
        let once = filter(&record(), &s);
        assert_eq!(once.source_indices.get(&Section::Projects), Some(&vec![1]));
        let twice = filter(&once, &s);
        assert_eq!(twice.projects.unwrap()[0].title, "Two");
    }

    #[test]
    fn test_name_always_survives() {
        let r = record();
        for section in Section::ALL {
            let s = SelectionMap::default().exclude_section(section);
            assert_eq!(filter(&r, &s).name, r.name);
        }
    }

    #[test]
    fn test_filter_does_not_mutate_input() {
        let r = record();
        let snapshot = r.clone();
        let _ = filter(&r, &SelectionMap::default().exclude_item(Section::Projects, 1));
        assert_eq!(r, snapshot);
    }
}
