mod assembly;
mod config;
mod errors;
mod generation;
mod layout;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;
mod variables;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::layout::PdfRenderer;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::FileStore;
use crate::variables::load_defaults;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a malformed PORT)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ApplySmart API v{}", env!("CARGO_PKG_VERSION"));

    // Application storage
    tokio::fs::create_dir_all(&config.applications_dir).await?;
    let store = Arc::new(FileStore::new(config.applications_dir.clone())?);
    info!("Application store at {}", config.applications_dir.display());

    // Formatting defaults (falls back to the embedded set)
    let default_variables = Arc::new(load_defaults(&config.variables_path));

    // Content generator
    let generator = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())?;
    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; resume generation will fail until it is");
    }
    info!("Content generator initialized (model: {})", generator.model());

    // Build app state
    let state = AppState {
        config: config.clone(),
        applications: store.clone(),
        versions: store,
        generator: Arc::new(generator),
        renderer: Arc::new(PdfRenderer),
        default_variables,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
