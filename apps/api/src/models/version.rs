use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::resume::ResumeRecord;

pub const LEGACY_VERSION_FILE: &str = "resume.json";

/// Identifies one draft artifact of an application.
///
/// Numbered versions order by number; the single legacy unnumbered draft orders below
/// every numbered one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VersionRef {
    Legacy,
    Numbered(u32),
}

impl VersionRef {
    pub fn file_name(&self) -> String {
        match self {
            VersionRef::Legacy => LEGACY_VERSION_FILE.to_string(),
            VersionRef::Numbered(n) => format!("resume_v{n}.json"),
        }
    }

    pub fn number(&self) -> Option<u32> {
        match self {
            VersionRef::Legacy => None,
            VersionRef::Numbered(n) => Some(*n),
        }
    }
}

impl Ord for VersionRef {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (VersionRef::Legacy, VersionRef::Legacy) => Ordering::Equal,
            (VersionRef::Legacy, VersionRef::Numbered(_)) => Ordering::Less,
            (VersionRef::Numbered(_), VersionRef::Legacy) => Ordering::Greater,
            (VersionRef::Numbered(a), VersionRef::Numbered(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for VersionRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Accepts `resume_v2.json`, `v2`, `2`, `resume.json`, or `legacy`.
impl FromStr for VersionRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == LEGACY_VERSION_FILE || s.eq_ignore_ascii_case("legacy") {
            return Ok(VersionRef::Legacy);
        }
        let digits = s
            .strip_prefix("resume_v")
            .and_then(|rest| rest.strip_suffix(".json"))
            .or_else(|| s.strip_prefix('v'))
            .unwrap_or(s);
        match digits.parse::<u32>() {
            Ok(n) if n > 0 => Ok(VersionRef::Numbered(n)),
            _ => Err(format!("'{s}' is not a resume version reference")),
        }
    }
}

impl TryFrom<String> for VersionRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionRef> for String {
    fn from(version: VersionRef) -> Self {
        version.file_name()
    }
}

/// The single finalized slot of an application. Persisted as `finalized_resume.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedResume {
    pub base_version: VersionRef,
    pub finalized_at: DateTime<Utc>,
    pub resume: ResumeRecord,
}
