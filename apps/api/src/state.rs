use std::sync::Arc;

use crate::config::Config;
use crate::layout::DocumentRenderer;
use crate::llm_client::ContentGenerator;
use crate::store::{ApplicationStore, VersionStore};
use crate::variables::VariableSet;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub applications: Arc<dyn ApplicationStore>,
    pub versions: Arc<dyn VersionStore>,
    /// Pluggable content generator. Default: GeminiClient; tests swap in a stub.
    pub generator: Arc<dyn ContentGenerator>,
    pub renderer: Arc<dyn DocumentRenderer>,
    /// Loaded once at startup from `VARIABLES_PATH`, never mutated.
    pub default_variables: Arc<VariableSet>,
}
