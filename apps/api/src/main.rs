mod analysis;
mod config;
mod errors;
mod llm_client;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::adapter::SkinAnalyzer;
use crate::analysis::orchestrator::SubmissionOrchestrator;
use crate::analysis::view::PollingView;
use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::build_store;

#[tokio::main]
async fn main() -> Result<()> {
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

    info!("Starting DermaGlow API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize model client
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; analysis submissions will fail until it is configured");
    }
    let llm = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        Duration::from_secs(config.model_timeout_secs),
    )?;
    info!(
        "LLM client initialized (model: {}, timeout: {}s)",
        llm.model(),
        config.model_timeout_secs
    );

    // Initialize persisted result slot
    let store = build_store(config.result_store_url.as_deref())?;

    let view = Arc::new(PollingView::new());
    let orchestrator = SubmissionOrchestrator::new(
        SkinAnalyzer::new(Arc::new(llm)),
        store.clone(),
        view.clone(),
    );

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        store,
        view,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
