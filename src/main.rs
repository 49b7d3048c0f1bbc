//! MultiSearch-RS: concurrent multi-query search over a vector database
//!
//! This is the main entry point for the application.

use anyhow::Result;
use clap::Parser;
use multisearch_rs::{
    backend::{SearchBackend, Weaviate},
    config::Settings,
    network::HttpClient,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"ENDPOINTS:
    POST /search           {"queries": [...], "limit": N} -> combined JSON result
    GET  /search?q=..      Single query
    POST /search/stream    Same body, newline-delimited JSON records

ENVIRONMENT VARIABLES:
    MULTISEARCH_SETTINGS_PATH     Path to settings.yml
    MULTISEARCH_PORT              Server port
    MULTISEARCH_BIND_ADDRESS      Bind address
    MULTISEARCH_BACKEND_URL       Vector database base URL
    MULTISEARCH_BACKEND_API_KEY   Bearer token for the vector database
    MULTISEARCH_MAX_CONCURRENCY   Backend calls in flight per request ("unbounded" allowed)
    MULTISEARCH_QUERY_TIMEOUT     Per-query deadline in seconds
    RUST_LOG                      Log filter (default: info)"#;

/// Concurrent multi-query search over a vector database
#[derive(Parser, Debug)]
#[command(name = "multisearch-rs", version, about, after_help = AFTER_HELP)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting MultiSearch-RS v{}", multisearch_rs::VERSION);

    // Load configuration
    let settings = load_settings(cli.config)?;
    settings.validate()?;
    info!(
        "Using backend {} (class {}, concurrency {})",
        settings.backend.url,
        settings.backend.class_name,
        settings
            .search
            .max_concurrency
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unbounded".to_string())
    );

    // Backend client lives for the whole process
    let client = HttpClient::with_settings(&settings.backend)?;
    let backend: Arc<dyn SearchBackend> = Arc::new(Weaviate::new(client, &settings.backend)?);
    info!("Backend client initialized");

    // Bind address
    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );

    let state = AppState::new(settings, backend);
    let app = create_router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, backend client closed");
    Ok(())
}

/// Load settings from file or use defaults
fn load_settings(explicit: Option<PathBuf>) -> Result<Settings> {
    if let Some(path) = explicit {
        info!("Loading settings from: {}", path.display());
        let mut settings = Settings::from_file(&path)?;
        settings.merge_env();
        return Ok(settings);
    }

    // Check environment variable first
    if let Ok(path) = std::env::var("MULTISEARCH_SETTINGS_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("multisearch-rs/settings.yml"));
    }

    // Try each default path
    for path in paths.iter() {
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    // Use defaults
    info!("No settings file found, using defaults");
    let mut settings = Settings::default();
    settings.merge_env();
    Ok(settings)
}

/// Resolve on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
