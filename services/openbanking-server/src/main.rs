//! Open Banking Server
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings
//! openbanking-server
//!
//! # In-memory store, no database needed
//! openbanking-server --store memory
//!
//! # Environment overrides
//! OPENBANKING__OPEN_BANKING__PROFILE=disabled openbanking-server
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use openbanking_client::{HttpGateway, RemoteBankingGateway};
use openbanking_core::{build_service, ServiceProfile};
use openbanking_db::{CredentialStore, Database, InMemoryCredentialStore};
use openbanking_server::config::{LoggingConfig, ServerConfig, StoreKind};
use openbanking_server::{create_router, AppState};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Open banking linkage and transfer server
#[derive(Parser, Debug)]
#[command(name = "openbanking-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, env = "OPENBANKING_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "OPENBANKING_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "OPENBANKING_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "OPENBANKING_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "OPENBANKING_LOG_FORMAT")]
    log_format: Option<String>,

    /// Credential store (postgres, memory)
    #[arg(long, value_parser = parse_store)]
    store: Option<StoreKind>,

    /// Service profile (external, disabled)
    #[arg(long, value_parser = parse_profile)]
    profile: Option<ServiceProfile>,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Remote open banking API base URL
    #[arg(long, env = "OPENBANKING_API_URL")]
    api_url: Option<String>,
}

fn parse_store(s: &str) -> Result<StoreKind, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "postgres" => Ok(StoreKind::Postgres),
        "memory" => Ok(StoreKind::Memory),
        other => Err(format!("unknown store: {}", other)),
    }
}

fn parse_profile(s: &str) -> Result<ServiceProfile, String> {
    s.parse().map_err(|e: openbanking_core::OpenBankingError| e.to_string())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    apply_overrides(&mut server_config, args);

    init_logging(&server_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        profile = %server_config.open_banking.profile,
        "Starting open banking server"
    );

    let (store, db) = init_store(&server_config).await?;
    let gateway: Arc<dyn RemoteBankingGateway> =
        Arc::new(HttpGateway::new(server_config.gateway.clone())?);
    let service = build_service(&server_config.open_banking, store, gateway)?;

    let state = Arc::new(AppState::new(service, db));
    let app = create_router(state, &server_config.api);

    let addr = server_config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        host = %server_config.server.host,
        port = %server_config.server.port,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server_config.server.shutdown_timeout()))
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn apply_overrides(config: &mut ServerConfig, args: Args) {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }
    if let Some(store) = args.store {
        config.store = store;
    }
    if let Some(profile) = args.profile {
        config.open_banking.profile = profile;
    }
    if let Some(db_url) = args.database_url {
        config.database.postgres_url = db_url;
    }
    if let Some(api_url) = args.api_url {
        config.gateway.base_url = api_url;
    }
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .try_init()?;
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .try_init()?;
        }
    }

    Ok(())
}

/// Connect the configured credential store
async fn init_store(
    config: &ServerConfig,
) -> anyhow::Result<(Arc<dyn CredentialStore>, Option<Arc<Database>>)> {
    match config.store {
        StoreKind::Memory => {
            tracing::warn!("Using in-memory credential store; linkages are lost on restart");
            let store: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());
            Ok((store, None))
        }
        StoreKind::Postgres => {
            let db = Database::connect(&config.database).await?;
            db.migrate().await?;

            if !db.health_check().await {
                anyhow::bail!("Database health check failed");
            }
            tracing::info!("Database health check passed");

            let store: Arc<dyn CredentialStore> = Arc::new(db.linkage_repo());
            Ok((store, Some(Arc::new(db))))
        }
    }
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    tracing::info!(
        timeout_secs = timeout.as_secs(),
        "Waiting for in-flight requests to complete..."
    );

    tokio::time::sleep(timeout).await;
}

// =============================================================================
// Tests
// =============================================================================
