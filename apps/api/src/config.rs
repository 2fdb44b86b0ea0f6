use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; only a malformed `PORT` fails startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// One subdirectory per application lives here.
    pub applications_dir: PathBuf,
    /// Fixed candidate profile that generation tailors.
    pub base_resume_path: PathBuf,
    /// Process-wide formatting defaults.
    pub variables_path: PathBuf,
    /// Absent is allowed; generation then fails with a non-retryable error.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            applications_dir: env_or("APPLICATIONS_DIR", "./applications").into(),
            base_resume_path: env_or("BASE_RESUME_PATH", "./base_resume.json").into(),
            variables_path: env_or("VARIABLES_PATH", "./resume_variables.json").into(),
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            gemini_model: env_or("GEMINI_MODEL", "gemini-2.5-pro"),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
