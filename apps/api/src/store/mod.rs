// Persistence: one directory per application, one file per artifact.
// Consumers depend on the traits, so a different backing store can be swapped in
// without touching the assembly pipeline.

pub mod file;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::application::{Application, NewApplication};
use crate::models::resume::ResumeRecord;
use crate::models::version::{FinalizedResume, VersionRef};

pub use file::FileStore;

/// Draft versions and the finalized slot of each application.
///
/// Single writer per application is assumed: two concurrent `create_version` calls on
/// the same application may allocate the same number. Readers never observe a partially
/// written artifact.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Newest first. The legacy unnumbered draft, if present, is last.
    async fn list_versions(&self, app_id: &str) -> Result<Vec<VersionRef>, AppError>;

    /// Persists `record` as `max(existing) + 1` (or 1) and returns the number.
    async fn create_version(&self, app_id: &str, record: &ResumeRecord) -> Result<u32, AppError>;

    async fn get_version(&self, app_id: &str, version: VersionRef) -> Result<ResumeRecord, AppError>;

    async fn delete_version(&self, app_id: &str, version: VersionRef) -> Result<(), AppError>;

    /// Overwrites the finalized slot with `record` and its rendered `document`.
    /// Either both are replaced or, on error, the previous slot stays readable.
    async fn set_finalized(
        &self,
        app_id: &str,
        record: &ResumeRecord,
        base_version: VersionRef,
        document: &[u8],
    ) -> Result<FinalizedResume, AppError>;

    async fn get_finalized(&self, app_id: &str) -> Result<Option<FinalizedResume>, AppError>;

    async fn get_finalized_document(&self, app_id: &str) -> Result<Option<Vec<u8>>, AppError>;
}

/// Application lifecycle and the per-application inputs (job description, variables).
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// `Conflict` if an application with the derived id already exists.
    async fn create_application(&self, new: &NewApplication) -> Result<Application, AppError>;

    /// Most recently updated first.
    async fn list_applications(&self) -> Result<Vec<Application>, AppError>;

    async fn get_application(&self, app_id: &str) -> Result<Application, AppError>;

    /// Removes the application and everything it owns.
    async fn delete_application(&self, app_id: &str) -> Result<(), AppError>;

    async fn save_job_description(&self, app_id: &str, html: &str) -> Result<(), AppError>;

    async fn load_job_description(&self, app_id: &str) -> Result<Option<String>, AppError>;

    async fn get_custom_variables(&self, app_id: &str) -> Result<Option<Value>, AppError>;

    /// Stores the override as given; callers validate it against the defaults first.
    async fn set_custom_variables(&self, app_id: &str, overrides: &Value) -> Result<(), AppError>;

    async fn clear_custom_variables(&self, app_id: &str) -> Result<(), AppError>;
}
