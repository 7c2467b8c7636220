use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use prometheus::Registry;
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use restock_core::{
    create_session_provider, load_config, metrics, validate_config, CheckoutSettings,
    HttpTransport, PursuitOrchestrator, SanitizedConfig, Target, Transport,
};

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "RESTOCK_CONFIG";

/// Configuration file read when `RESTOCK_CONFIG` is unset, if present.
const DEFAULT_CONFIG_PATH: &str = "restock.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = resolve_config_path(
        std::env::var(CONFIG_ENV).ok(),
        Path::new(DEFAULT_CONFIG_PATH).exists(),
    );
    match &config_path {
        Some(path) => info!("Loading configuration from {:?}", path),
        None => info!("No configuration file, reading environment only"),
    }

    let config = load_config(config_path.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!(
        "Effective configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    let registry = Registry::new();
    metrics::register_all(&registry).context("Failed to register metrics")?;

    // Authenticate once, before any pursuit starts
    let provider =
        create_session_provider(&config.account).context("Failed to create session provider")?;
    info!("Using session provider: {}", provider.method_name());
    let session = provider.authenticate().await.context("Authentication failed")?;

    let transport: Arc<dyn Transport> = Arc::new(
        HttpTransport::new(&config.retailer, &session)
            .context("Failed to create HTTP transport")?,
    );
    info!(
        "Using {} transport against {}",
        transport.name(),
        config.retailer.base_url
    );

    let settings = CheckoutSettings::from_config(&config).context("Invalid checkout settings")?;
    let targets: Vec<Target> = config
        .pursuit
        .targets
        .iter()
        .map(|sku| Target::from(sku.as_str()))
        .collect();

    let orchestrator = PursuitOrchestrator::new(config.pursuit.clone(), transport, settings);

    let shutdown = orchestrator.shutdown_handle();
    let signal_task = tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        shutdown.trigger();
    });

    let summaries = orchestrator
        .run(targets)
        .await
        .context("Failed to run pursuits")?;
    signal_task.abort();

    for summary in &summaries {
        info!(
            "Item {}: {} in {}s",
            summary.target,
            summary.result,
            (summary.finished_at - summary.started_at).num_seconds()
        );
    }
    let completed = summaries.iter().filter(|s| s.result.is_completed()).count();
    info!("{}/{} pursuit(s) completed", completed, summaries.len());

    debug!("Final metrics:\n{}", metrics::render(&registry));
    Ok(())
}

/// An explicitly named file must exist; the default file is optional.
fn resolve_config_path(explicit: Option<String>, default_exists: bool) -> Option<PathBuf> {
    match explicit.filter(|p| !p.trim().is_empty()) {
        Some(path) => Some(PathBuf::from(path)),
        None if default_exists => Some(PathBuf::from(DEFAULT_CONFIG_PATH)),
        None => None,
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
}
