//! File-backed store.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<app_id>/app_details.json
//!                 job_description.html
//!                 resume_v<N>.json        draft versions
//!                 resume.json             legacy unnumbered draft
//!                 finalized_resume.json
//!                 finalized_resume.pdf
//!                 custom_variables.json
//! ```
//!
//! Every write goes to a hidden temp file in the same directory and is published with a
//! rename, so readers see either the old or the new file, never a partial one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{is_valid_app_id, Application, NewApplication};
use crate::models::resume::ResumeRecord;
use crate::models::version::{FinalizedResume, VersionRef, LEGACY_VERSION_FILE};
use crate::store::{ApplicationStore, VersionStore};

const APP_DETAILS_FILE: &str = "app_details.json";
const JOB_DESCRIPTION_FILE: &str = "job_description.html";
const FINALIZED_RECORD_FILE: &str = "finalized_resume.json";
const FINALIZED_DOCUMENT_FILE: &str = "finalized_resume.pdf";
const CUSTOM_VARIABLES_FILE: &str = "custom_variables.json";
const VERSION_FILE_PATTERN: &str = r"^resume_v([0-9]+)\.json$";

pub struct FileStore {
    root: PathBuf,
    version_pattern: Regex,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let version_pattern = Regex::new(VERSION_FILE_PATTERN)
            .context("version file pattern failed to compile")?;
        Ok(Self {
            root: root.into(),
            version_pattern,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn app_dir(&self, app_id: &str) -> Result<PathBuf, AppError> {
        if !is_valid_app_id(app_id) {
            return Err(AppError::InvalidInput(format!(
                "'{app_id}' is not a valid application id"
            )));
        }
        Ok(self.root.join(app_id))
    }

    /// Directory of an existing application, or `NotFound`.
    async fn existing_app_dir(&self, app_id: &str) -> Result<PathBuf, AppError> {
        let dir = self.app_dir(app_id)?;
        if fs::try_exists(dir.join(APP_DETAILS_FILE)).await? {
            Ok(dir)
        } else {
            Err(AppError::NotFound(format!("Application {app_id} not found")))
        }
    }

    async fn read_details(&self, dir: &Path, app_id: &str) -> Result<Application, AppError> {
        read_json(&dir.join(APP_DETAILS_FILE))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {app_id} not found")))
    }

    /// Bumps `updated_at` after a write to the application.
    async fn touch(&self, dir: &Path, app_id: &str) -> Result<(), AppError> {
        let mut details = self.read_details(dir, app_id).await?;
        details.updated_at = Utc::now();
        write_json_atomic(dir, APP_DETAILS_FILE, &details).await
    }

    /// All draft versions on disk, newest first.
    async fn scan_versions(&self, dir: &Path) -> Result<Vec<VersionRef>, AppError> {
        let mut versions = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name == LEGACY_VERSION_FILE {
                versions.push(VersionRef::Legacy);
            } else if let Some(captures) = self.version_pattern.captures(name) {
                match captures[1].parse::<u32>() {
                    Ok(n) if n > 0 => versions.push(VersionRef::Numbered(n)),
                    _ => warn!("Ignoring version file with unusable number: {name}"),
                }
            }
        }
        versions.sort_by(|a, b| b.cmp(a));
        Ok(versions)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// VersionStore
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl VersionStore for FileStore {
    async fn list_versions(&self, app_id: &str) -> Result<Vec<VersionRef>, AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        self.scan_versions(&dir).await
    }

    async fn create_version(&self, app_id: &str, record: &ResumeRecord) -> Result<u32, AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        let latest = self
            .scan_versions(&dir)
            .await?
            .iter()
            .filter_map(VersionRef::number)
            .max()
            .unwrap_or(0);
        let next = latest
            .checked_add(1)
            .ok_or_else(|| AppError::Conflict(format!("Application {app_id} has no version numbers left")))?;

        write_json_atomic(&dir, &VersionRef::Numbered(next).file_name(), record).await?;
        self.touch(&dir, app_id).await?;
        info!(app_id, version = next, "Created resume version");
        Ok(next)
    }

    async fn get_version(&self, app_id: &str, version: VersionRef) -> Result<ResumeRecord, AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        read_json(&dir.join(version.file_name()))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Version {version} of application {app_id} not found")))
    }

    async fn delete_version(&self, app_id: &str, version: VersionRef) -> Result<(), AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        match fs::remove_file(dir.join(version.file_name())).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!(
                    "Version {version} of application {app_id} not found"
                )))
            }
            Err(e) => return Err(e.into()),
        }
        self.touch(&dir, app_id).await?;
        info!(app_id, %version, "Deleted resume version");
        Ok(())
    }

    async fn set_finalized(
        &self,
        app_id: &str,
        record: &ResumeRecord,
        base_version: VersionRef,
        document: &[u8],
    ) -> Result<FinalizedResume, AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        let finalized = FinalizedResume {
            base_version,
            finalized_at: Utc::now(),
            resume: record.clone(),
        };
        let json = serde_json::to_vec_pretty(&finalized)?;

        // Stage both files first; the record is published last and is the commit point.
        let staged_document = StagedFile::stage(&dir, FINALIZED_DOCUMENT_FILE, document).await?;
        let staged_record = match StagedFile::stage(&dir, FINALIZED_RECORD_FILE, &json).await {
            Ok(staged) => staged,
            Err(e) => {
                staged_document.discard().await;
                return Err(e);
            }
        };
        if let Err(e) = staged_document.publish().await {
            staged_record.discard().await;
            return Err(e);
        }
        staged_record.publish().await?;

        // Committed above; a failed metadata bump is only logged.
        if let Err(e) = self.touch(&dir, app_id).await {
            warn!("Finalized {app_id} but could not bump updated_at: {e}");
        }
        Ok(finalized)
    }

    async fn get_finalized(&self, app_id: &str) -> Result<Option<FinalizedResume>, AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        read_json(&dir.join(FINALIZED_RECORD_FILE)).await
    }

    async fn get_finalized_document(&self, app_id: &str) -> Result<Option<Vec<u8>>, AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        read_optional(&dir.join(FINALIZED_DOCUMENT_FILE)).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ApplicationStore
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ApplicationStore for FileStore {
    async fn create_application(&self, new: &NewApplication) -> Result<Application, AppError> {
        let app_id = new.app_id()?;
        let dir = self.app_dir(&app_id)?;
        fs::create_dir_all(&self.root).await?;
        match fs::create_dir(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(AppError::Conflict(format!(
                    "Application {app_id} already exists"
                )))
            }
            Err(e) => return Err(e.into()),
        }

        let now = Utc::now();
        let application = Application {
            app_id: app_id.clone(),
            company_name: new.company_name.trim().to_string(),
            role_title: new.role_title.trim().to_string(),
            job_id: new
                .job_id
                .as_deref()
                .map(str::trim)
                .filter(|j| !j.is_empty())
                .map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        write_json_atomic(&dir, APP_DETAILS_FILE, &application).await?;
        info!(app_id, "Created application");
        Ok(application)
    }

    async fn list_applications(&self) -> Result<Vec<Application>, AppError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut applications = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let details = entry.path().join(APP_DETAILS_FILE);
            match read_json::<Application>(&details).await {
                Ok(Some(application)) => applications.push(application),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable application at {}: {e}", entry.path().display()),
            }
        }
        applications.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(applications)
    }

    async fn get_application(&self, app_id: &str) -> Result<Application, AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        self.read_details(&dir, app_id).await
    }

    async fn delete_application(&self, app_id: &str) -> Result<(), AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        fs::remove_dir_all(&dir).await?;
        info!(app_id, "Deleted application");
        Ok(())
    }

    async fn save_job_description(&self, app_id: &str, html: &str) -> Result<(), AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        write_atomic(&dir, JOB_DESCRIPTION_FILE, html.as_bytes()).await?;
        self.touch(&dir, app_id).await
    }

    async fn load_job_description(&self, app_id: &str) -> Result<Option<String>, AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        let Some(bytes) = read_optional(&dir.join(JOB_DESCRIPTION_FILE)).await? else {
            return Ok(None);
        };
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    async fn get_custom_variables(&self, app_id: &str) -> Result<Option<Value>, AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        read_json(&dir.join(CUSTOM_VARIABLES_FILE)).await
    }

    async fn set_custom_variables(&self, app_id: &str, overrides: &Value) -> Result<(), AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        write_json_atomic(&dir, CUSTOM_VARIABLES_FILE, overrides).await?;
        self.touch(&dir, app_id).await
    }

    async fn clear_custom_variables(&self, app_id: &str) -> Result<(), AppError> {
        let dir = self.existing_app_dir(app_id).await?;
        match fs::remove_file(dir.join(CUSTOM_VARIABLES_FILE)).await {
            Ok(()) => self.touch(&dir, app_id).await,
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// File helpers
// ────────────────────────────────────────────────────────────────────────────

/// A fully written temp file waiting to be renamed over its target.
struct StagedFile {
    temp: PathBuf,
    target: PathBuf,
}

impl StagedFile {
    async fn stage(dir: &Path, name: &str, bytes: &[u8]) -> Result<Self, AppError> {
        let temp = dir.join(format!(".{name}.{}.tmp", Uuid::new_v4()));
        if let Err(e) = fs::write(&temp, bytes).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(Self {
            temp,
            target: dir.join(name),
        })
    }

    async fn publish(self) -> Result<(), AppError> {
        if let Err(e) = fs::rename(&self.temp, &self.target).await {
            let _ = fs::remove_file(&self.temp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn discard(self) {
        if let Err(e) = fs::remove_file(&self.temp).await {
            warn!("Could not remove temp file {}: {e}", self.temp.display());
        }
    }
}

async fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<(), AppError> {
    StagedFile::stage(dir, name, bytes).await?.publish().await
}

async fn write_json_atomic<T: Serialize + ?Sized>(
    dir: &Path,
    name: &str,
    value: &T,
) -> Result<(), AppError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(dir, name, &bytes).await
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, AppError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, AppError> {
    let Some(bytes) = read_optional(path).await? else {
        return Ok(None);
    };
    let value = serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a valid artifact", path.display()))?;
    Ok(Some(value))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
