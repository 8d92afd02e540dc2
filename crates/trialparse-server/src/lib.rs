//! trialparse Server
//!
//! HTTP front end for the eligibility pipeline. Accepts a batch of trial rows
//! as JSON, runs it through the configured extraction engine and answers with
//! the extracted relations.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::ServerConfig;
use handlers::{create_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trialparse_engine::{Dictionaries, EngineError};
use trialparse_pipeline::{PipelineAggregator, PipelineError};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Dictionaries or engine could not be set up
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Pipeline could not be set up
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Load dictionaries, build the engine and wrap it in a pipeline
///
/// Every configuration problem surfaces here, before the server binds.
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let dictionaries = Arc::new(Dictionaries::load(&config.resources)?);
    let engine = config.engine.build(Arc::clone(&dictionaries))?;
    let aggregator = PipelineAggregator::new(engine, config.pipeline.clone())?;

    Ok(AppState {
        aggregator: Arc::new(aggregator),
        dictionaries,
    })
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // a subscriber may already be installed, e.g. by a test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Start the HTTP server
///
/// Loads dictionaries, builds the engine and pipeline, and serves until
/// Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    init_tracing(&config.log_level);

    info!("Starting trialparse server");
    info!("Bind address: {}", config.bind_addr());
    info!("Engine: {:?}", config.engine.kind);
    info!(
        "Pipeline: policy {:?}, concurrency {}",
        config.pipeline.error_policy, config.pipeline.max_concurrency
    );

    let state = build_state(&config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received, stopping server");
}
