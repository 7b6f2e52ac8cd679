// Cloud Dependency Explorer - Web Server
// REST API + dashboard page with Axum

use anyhow::{Context, Result};
use clap::Parser;
use cloud_dependency_explorer::api::{router, AppState};
use cloud_dependency_explorer::{Catalog, Config, HttpClassifier};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "explorer-server")]
#[command(about = "Web dashboard: which cloud runs the internet", long_about = None)]
#[command(version)]
struct Args {
    /// Config file (default: ./cloud-explorer.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,

    /// Provider detection endpoint
    #[arg(long)]
    classifier_url: Option<String>,

    /// CSV replacing the built-in catalog
    #[arg(long)]
    catalog: Option<PathBuf>,
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(url) = args.classifier_url {
        config.classifier.endpoint = url;
    }
    if let Some(path) = args.catalog {
        config.dashboard.catalog_path = Some(path);
    }

    info!("Cloud Dependency Explorer v{} - Web Server", env!("CARGO_PKG_VERSION"));

    let catalog = match &config.dashboard.catalog_path {
        Some(path) => Catalog::from_csv_path(path)
            .with_context(|| format!("Failed to load catalog {:?}", path))?,
        None => Catalog::builtin(),
    };
    info!("Catalog ready: {} companies", catalog.len());

    let classifier = HttpClassifier::new(&config.classifier.endpoint, config.classifier.timeout())?;
    info!("Classifier endpoint: {}", classifier.endpoint());

    let state = AppState::new(catalog, config.dashboard.big_three.clone(), Arc::new(classifier))
        .with_session_ttl(config.server.session_ttl());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind))?;

    info!("Server running on http://{}", config.server.bind);
    info!("API: http://{}/api/health", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down gracefully");
        })
        .await
        .context("Server error")?;

    Ok(())
}
