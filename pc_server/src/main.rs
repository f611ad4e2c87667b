//! Pickle Cup HTTP server.
//!
//! Serves the JSON API from PostgreSQL, or from the in-memory store with
//! `--memory` for local development.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use pico_args::Arguments;
use pickle_cup::auth::LogMailer;
use pickle_cup::db::{Database, MemoryStore};

use pc_server::api::{self, AppState};
use pc_server::config::ServerConfig;
use pc_server::{logging, metrics};

const HELP: &str = "\
Run the Pickle Cup tournament server

USAGE:
  pc_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  --memory                 Use the in-memory store (data is lost on exit)
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               JWT signing secret (required, at least 32 characters)
  MAGIC_LINK_REDIRECT_URL  Page the emailed sign-in link points to
  METRICS_BIND             Prometheus listener address (disabled when unset)
  (See .env.example for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        memory: pargs.contains("--memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.memory)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        tracing::info!("Prometheus metrics listening on http://{}/metrics", addr);
    }

    let mailer = Arc::new(LogMailer);
    let (state, database) = if config.use_memory_store {
        tracing::warn!("Using the in-memory store; nothing will be persisted");
        let state = AppState::from_store(Arc::new(MemoryStore::new()), mailer, &config);
        (state, None)
    } else {
        tracing::info!("Connecting to database");
        let db = Database::new(&config.database)
            .await
            .context("Failed to connect to database")?;
        tracing::info!("Database connected successfully");
        let state = AppState::from_store(Arc::new(db.store()), mailer, &config);
        (state, Some(db))
    };

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
