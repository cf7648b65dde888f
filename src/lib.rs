pub mod analysis;
pub mod api;
pub mod config;
pub mod export;
pub mod ingest;
pub mod insight;
pub mod models;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::insight::{InsightCache, InsightService, LlmClient, OllamaClient};

/// Boot the dashboard backend: tracing, patient export, insight service,
/// API server. Blocks until the server exits.
pub async fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Oncolens starting v{}", config::APP_VERSION);

    let data_file = config::data_file();
    let registry = match ingest::load_patients(&data_file) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            tracing::error!(path = %data_file.display(), error = %e, "Cannot load patient export");
            std::process::exit(1);
        }
    };

    // The Ollama client is blocking; probe it off the async runtime,
    // the same way the insight service runs its calls.
    let model = config::insight_model();
    let client = {
        let model = model.clone();
        tokio::task::spawn_blocking(move || {
            let client = OllamaClient::default_local();
            match client.is_model_available(&model) {
                Ok(true) => tracing::info!(model = %model, "Insight model available"),
                Ok(false) => {
                    tracing::warn!(model = %model, "Insight model not installed; serving deterministic insights")
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ollama unreachable; serving deterministic insights")
                }
            }
            client
        })
        .await
        .expect("model availability probe panicked")
    };

    let insights = Arc::new(InsightService::new(
        Arc::new(client),
        model,
        config::insight_timeout(),
        InsightCache::new(),
    ));

    let ctx = api::ApiContext::new(registry, insights);
    let router = api::dashboard_router(ctx);

    let addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Cannot bind {addr}: {e}"));
    tracing::info!(%addr, "Dashboard API listening");

    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!(error = %e, "Server exited with error");
    }
}
