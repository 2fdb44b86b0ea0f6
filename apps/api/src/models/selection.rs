//! User selections: which sections and items to keep, plus contact overrides.
//!
//! Wire keys:
//! - `select-<section>`: `false` drops the whole section
//! - `select-<section>-<index>`: `false` drops one item; the index is its position in
//!   the unfiltered record
//! - `contact-<field>`: replaces one contact subfield
//!
//! Absent keys mean "included".

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// Selectable resume sections, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Summary,
    Education,
    Skills,
    Experience,
    Projects,
    Certifications,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Summary,
        Section::Education,
        Section::Skills,
        Section::Experience,
        Section::Projects,
        Section::Certifications,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Summary => "summary",
            Section::Education => "education",
            Section::Skills => "skills",
            Section::Experience => "experience",
            Section::Projects => "projects",
            Section::Certifications => "certifications",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| format!("unknown section '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContactField {
    Email,
    Phone,
    Location,
    Linkedin,
    Github,
    Medium,
    Website,
}

impl FromStr for ContactField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(ContactField::Email),
            "phone" => Ok(ContactField::Phone),
            "location" => Ok(ContactField::Location),
            "linkedin" => Ok(ContactField::Linkedin),
            "github" => Ok(ContactField::Github),
            "medium" => Ok(ContactField::Medium),
            "website" => Ok(ContactField::Website),
            _ => Err(format!("unknown contact field '{s}'")),
        }
    }
}

/// Parsed selection map. Build with [`SelectionMap::from_value`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionMap {
    sections: HashMap<Section, bool>,
    items: HashMap<(Section, usize), bool>,
    contact: BTreeMap<ContactField, String>,
}

impl SelectionMap {
    /// Parses the wire form. Unknown keys, unknown sections, non-numeric indices and
    /// wrongly typed values are `InvalidInput`; `null` values are treated as absent.
    pub fn from_value(value: &Value) -> Result<Self, AppError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(AppError::InvalidInput(format!(
                    "selections must be a JSON object, got {}",
                    json_type(other)
                )))
            }
        };

        let mut selections = Self::default();
        for (key, value) in map {
            if value.is_null() {
                continue;
            }
            if let Some(rest) = key.strip_prefix("select-") {
                let included = value.as_bool().ok_or_else(|| {
                    AppError::InvalidInput(format!("selection '{key}' must be a boolean"))
                })?;
                match rest.rsplit_once('-') {
                    Some((section, index)) if index.chars().all(|c| c.is_ascii_digit()) => {
                        let section = section.parse::<Section>().map_err(AppError::InvalidInput)?;
                        let index = index.parse::<usize>().map_err(|e| {
                            AppError::InvalidInput(format!("selection '{key}': {e}"))
                        })?;
                        selections.items.insert((section, index), included);
                    }
                    _ => {
                        let section = rest.parse::<Section>().map_err(AppError::InvalidInput)?;
                        selections.sections.insert(section, included);
                    }
                }
            } else if let Some(field) = key.strip_prefix("contact-") {
                let field = field.parse::<ContactField>().map_err(AppError::InvalidInput)?;
                let text = value.as_str().ok_or_else(|| {
                    AppError::InvalidInput(format!("contact override '{key}' must be a string"))
                })?;
                selections.contact.insert(field, text.to_string());
            } else {
                return Err(AppError::InvalidInput(format!(
                    "unrecognized selection key '{key}'"
                )));
            }
        }
        Ok(selections)
    }

    /// Builder used by callers that construct selections in code.
    pub fn exclude_section(mut self, section: Section) -> Self {
        self.sections.insert(section, false);
        self
    }

    pub fn exclude_item(mut self, section: Section, index: usize) -> Self {
        self.items.insert((section, index), false);
        self
    }

    pub fn override_contact(mut self, field: ContactField, value: impl Into<String>) -> Self {
        self.contact.insert(field, value.into());
        self
    }

    pub fn section_included(&self, section: Section) -> bool {
        self.sections.get(&section).copied().unwrap_or(true)
    }

    /// `original_index` is the item's position in the unfiltered record.
    pub fn item_included(&self, section: Section, original_index: usize) -> bool {
        self.items
            .get(&(section, original_index))
            .copied()
            .unwrap_or(true)
    }

    pub fn contact_overrides(&self) -> impl Iterator<Item = (ContactField, &str)> {
        self.contact.iter().map(|(field, value)| (*field, value.as_str()))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
