use anyhow::Context;
use clap::Parser;
use dbq_adapter_pg::PostgresAdapter;
use dbq_catalog::Catalog;
use dbq_core::GatewayConfig;
use dbq_server::{AppState, create_router};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dbq-server", version, about = "Read-only SQL gateway over registered databases")]
struct Cli {
    /// Path to a TOML config file (falls back to DBQ_CONFIG, then ./dbq.toml)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the config file
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = GatewayConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .context("invalid logging.filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Arc::new(config);
    let catalog = Catalog::open(&config.catalog.sqlite_path)
        .await
        .with_context(|| format!("opening catalog at {}", config.catalog.sqlite_path))?;
    let upstream = Arc::new(PostgresAdapter::new(config.upstream));

    let state = AppState::new(config.clone(), Arc::new(catalog), upstream);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    tracing::info!(addr = %config.server.bind, "dbq-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("dbq-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
