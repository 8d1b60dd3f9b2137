//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qclip_api::{create_router, ApiConfig, AppState};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("qclip=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting qclip-api");

    // Load configuration
    let config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    // Create application state
    let state = match AppState::new(config.clone()).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create application state: {}", e);
            std::process::exit(1);
        }
    };

    // Make sure the video bucket exists before accepting work
    if let Err(e) = state.pipeline.store().ensure_bucket().await {
        error!("Failed to ensure storage bucket: {}", e);
        std::process::exit(1);
    }

    // Bring up the audio staging server before any job can render
    if let Err(e) = state.pipeline.staging().start().await {
        error!("Failed to start staging server: {}", e);
        std::process::exit(1);
    }

    // Start the stale directory sweeper background task
    let sweep_interval = state.pipeline_config.sweep_interval;
    let sweep_max_age = state.pipeline_config.sweep_max_age;
    let workdir = Arc::clone(state.pipeline.workdir());
    tokio::spawn(async move {
        workdir.run_sweeper(sweep_interval, sweep_max_age).await;
    });

    // Create router
    let app = create_router(state.clone());

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid bind address");

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    // Stop staging before deleting the directories it serves
    state.pipeline.staging().shutdown().await;
    if let Err(e) = state.pipeline.workdir().cleanup_all().await {
        error!("Cleanup at shutdown failed: {}", e);
    }

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
