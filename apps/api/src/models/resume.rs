//! The resume schema shared by base, generated, merged, filtered, and finalized resumes.
//!
//! List order is meaningful everywhere: it is the priority order the candidate (or the
//! generator) chose, and every stage preserves it unless its contract says otherwise.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::selection::Section;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(alias = "school")]
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
    /// Coursework line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// One skills line: `Category: item, item, item`.
///
/// Accepts both `{"category": "...", "items": [...]}` and the generator's
/// single-key shorthand `{"Languages": ["Rust", "Go"]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SkillBlockRepr")]
pub struct SkillBlock {
    pub category: String,
    pub items: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SkillBlockRepr {
    Explicit { category: String, items: Vec<String> },
    Shorthand(BTreeMap<String, Vec<String>>),
}

impl TryFrom<SkillBlockRepr> for SkillBlock {
    type Error = String;

    fn try_from(repr: SkillBlockRepr) -> Result<Self, Self::Error> {
        match repr {
            SkillBlockRepr::Explicit { category, items } => Ok(SkillBlock { category, items }),
            SkillBlockRepr::Shorthand(map) => {
                let mut entries = map.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((category, items)), None) => Ok(SkillBlock { category, items }),
                    _ => Err("skill block shorthand must have exactly one category key".to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub company: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<String>,
    #[serde(default, alias = "description")]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<String>,
    #[serde(default, alias = "description")]
    pub bullets: Vec<String>,
}

/// A certification line, optionally with supporting bullets. A bare string is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CertificationRepr")]
pub struct Certification {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bullets: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CertificationRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default, alias = "description")]
        bullets: Vec<String>,
    },
}

impl From<CertificationRepr> for Certification {
    fn from(repr: CertificationRepr) -> Self {
        match repr {
            CertificationRepr::Name(name) => Certification {
                name,
                bullets: Vec::new(),
            },
            CertificationRepr::Full { name, bullets } => Certification { name, bullets },
        }
    }
}

/// A complete resume. Absent sections are `None` and are never rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub name: String,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<EducationEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<SkillBlock>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<Vec<ExperienceEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<ProjectEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Vec<Certification>>,
    /// For lists that went through selection: the position each surviving item had in
    /// the unfiltered record. Lets a selection map be re-applied to its own output.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub source_indices: BTreeMap<Section, Vec<usize>>,
}

/// Content returned by the generator, validated into a typed partial record.
///
/// Every field is optional; absent (or empty) fields leave the base resume untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, rename = "skills_reordered", alias = "skills")]
    pub skills: Option<Vec<SkillBlock>>,
    #[serde(default)]
    pub experience_bullets: Option<Vec<GeneratedBullets>>,
    #[serde(default, rename = "projects_reordered", alias = "projects")]
    pub projects: Option<Vec<ProjectEntry>>,
}

impl GeneratedContent {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.skills.is_none()
            && self.experience_bullets.is_none()
            && self.projects.is_none()
    }
}

/// Bullets for one experience entry, position-matched to the base resume.
/// Accepts `{"bullets": [...]}` or a bare list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "GeneratedBulletsRepr")]
pub struct GeneratedBullets {
    pub bullets: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GeneratedBulletsRepr {
    List(Vec<String>),
    Object {
        #[serde(alias = "description")]
        bullets: Vec<String>,
    },
}

impl From<GeneratedBulletsRepr> for GeneratedBullets {
    fn from(repr: GeneratedBulletsRepr) -> Self {
        match repr {
            GeneratedBulletsRepr::List(bullets) | GeneratedBulletsRepr::Object { bullets } => {
                GeneratedBullets { bullets }
            }
        }
    }
}
