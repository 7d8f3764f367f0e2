//! Memehub - identity and credential service for the Meme Project API

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, ConfigSource, LoggingConfig, StoreBackend};
use memehub_api::{AppState, create_router};
use memehub_auth::{JwtManager, cookie_key};
use memehub_db::{Database, MemoryStore, UserStore};

/// Memehub - identity and credential service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "MEMEHUB_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "MEMEHUB_PORT")]
    port: Option<u16>,

    /// Secret used to sign session tokens
    #[arg(long, env = "MEMEHUB_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Secret used to sign the session cookie
    #[arg(long, env = "MEMEHUB_COOKIE_SECRET", hide_env_values = true)]
    cookie_secret: Option<String>,

    /// SQLite database file
    #[arg(long, env = "MEMEHUB_DATABASE_PATH")]
    database_path: Option<String>,
}

impl Args {
    /// Command line and environment values win over the file
    fn apply(self, config: &mut Config) {
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(secret) = self.jwt_secret {
            config.auth.jwt_secret = secret;
        }
        if let Some(secret) = self.cookie_secret {
            config.auth.cookie_secret = secret;
        }
        if let Some(path) = self.database_path {
            config.database.path = path;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone();
    let (mut config, source) = Config::load(&config_path)?;
    args.apply(&mut config);

    init_logging(&config.logging);

    info!("Starting Memehub v{}", env!("CARGO_PKG_VERSION"));
    match source {
        ConfigSource::File => info!("Loaded configuration from {}", config_path),
        ConfigSource::Defaults => info!("Config file not found at {}, using defaults", config_path),
    }
    config.validate().context("Invalid configuration")?;

    let metrics_handle = if config.metrics.enabled {
        let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(Arc::new(handle))
    } else {
        None
    };

    let store: Arc<dyn UserStore> = match config.store_backend()? {
        StoreBackend::Sqlite => {
            if let Some(parent) = Path::new(&config.database.path).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let db = Database::new(&config.database_url(), config.database.max_connections)
                .await
                .context("Failed to open the user database")?;
            info!("Using SQLite user store at {}", config.database.path);
            Arc::new(db)
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory user store; accounts are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let jwt = Arc::new(JwtManager::new(
        &config.auth.jwt_secret,
        config.auth.token_expiry_hours,
    ));

    let state = AppState::new(
        store,
        jwt,
        cookie_key(&config.auth.cookie_secret),
        chrono::Duration::minutes(config.auth.reset_token_ttl_minutes),
    );

    let app = create_router(state, metrics_handle).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::very_permissive()),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for the shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
