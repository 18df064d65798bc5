//! docqueue - Main Entry Point
//!
//! HTTP front end for the document chunking pipeline.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docqueue::api::{self, AppState};
use docqueue::progress::LoggingObserver;
use docqueue::types::PipelineConfig;
use docqueue::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "docqueue=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = PipelineConfig::from_env();

    info!("Starting docqueue v{}", env!("CARGO_PKG_VERSION"));
    info!(
        chunk_size = config.chunk_size,
        max_tokens = config.max_tokens,
        token_counter = ?config.token_counter,
        overlap_policy = ?config.overlap_policy,
        "Pipeline configuration"
    );

    // Initialize components
    let pipeline = Pipeline::new(config)?;
    pipeline.add_observer(Arc::new(LoggingObserver));

    let app = api::router(Arc::new(AppState { pipeline }));

    // Start server
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3017);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
