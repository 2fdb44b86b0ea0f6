use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// One job-application context. Persisted as `app_details.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub app_id: String,
    pub company_name: String,
    pub role_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating an application.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub company_name: String,
    pub role_title: String,
    #[serde(default)]
    pub job_id: Option<String>,
}

/// Joins the sanitized parts of an application id. `sanitize` never emits `-`, so
/// the parts can always be told apart.
const ID_PART_SEPARATOR: &str = "--";

impl NewApplication {
    /// Derives the stable directory-safe identifier `<company>--<role>[--<job_id>]`.
    ///
    /// Inside each part every non-alphanumeric character becomes `_`, so the id is
    /// deterministic and safe as a path segment. Company and role must be non-blank.
    pub fn app_id(&self) -> Result<String, AppError> {
        let company = self.company_name.trim();
        let role = self.role_title.trim();
        if company.is_empty() || role.is_empty() {
            return Err(AppError::InvalidInput(
                "companyName and roleTitle must not be empty".to_string(),
            ));
        }
        let mut parts = vec![sanitize(company), sanitize(role)];
        if let Some(job_id) = self.job_id.as_deref().map(str::trim).filter(|j| !j.is_empty()) {
            parts.push(sanitize(job_id));
        }
        Ok(parts.join(ID_PART_SEPARATOR))
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// True if `app_id` is safe to use as a directory name under the applications root.
/// Accepts every id [`NewApplication::app_id`] produces, including ones from the
/// older `_`-joined scheme.
pub fn is_valid_app_id(app_id: &str) -> bool {
    !app_id.is_empty()
        && app_id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}
