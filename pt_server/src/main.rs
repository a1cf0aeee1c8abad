//! Party trivia server using the async actor model.
//!
//! Each session runs in its own SessionActor managed by SessionManager;
//! finished games are recorded to PostgreSQL when a history database is
//! configured.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Error};
use pico_args::Arguments;
use tracing::{info, warn};

use party_trivia::{
    audio::TimedAudio,
    catalog::InMemoryCatalog,
    history::{Database, MemoryStandingsRecorder, PgStandingsRecorder, StandingsRecorder},
    session::{Collaborators, SessionManager},
};
use pt_server::{
    api::{self, AppState},
    config::ServerConfig,
    logging, metrics,
};

const HELP: &str = "\
Run a party trivia session server

USAGE:
  pt_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:7878]
  --db-url     URL         Standings history database  [default: env HISTORY_DATABASE_URL or in-memory]
  --catalog    PATH        JSON question catalog       [default: env TRIVIA_CATALOG or built-in sample]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  HISTORY_DATABASE_URL     PostgreSQL connection string
  MAX_SESSIONS             Concurrently open sessions  [default: 32]
  METRICS_ENABLED          Serve /metrics              [default: true]
  RUST_LOG                 Log filter                  [default: info,sqlx=warn,hyper=warn]
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    catalog: Option<PathBuf>,
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
        catalog: pargs.opt_value_from_str("--catalog")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.catalog)?;
    config.validate()?;
    info!("Starting party trivia server at {}", config.bind);

    let catalog = match &config.catalog_path {
        Some(path) => {
            let catalog = InMemoryCatalog::from_json_file(path)
                .await
                .with_context(|| format!("Failed to load catalog {}", path.display()))?;
            info!("Loaded {} questions from {}", catalog.len(), path.display());
            catalog
        }
        None => {
            warn!("No catalog configured, using the built-in sample");
            InMemoryCatalog::sample()
        }
    };

    let recorder: Arc<dyn StandingsRecorder> = match &config.history {
        Some(db_config) => {
            info!("Connecting to history database");
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to history database")?;
            db.migrate()
                .await
                .context("Failed to apply history migrations")?;
            info!("History database ready");
            Arc::new(PgStandingsRecorder::new(db.pool().clone()))
        }
        None => {
            warn!("No history database configured, standings are kept in memory");
            Arc::new(MemoryStandingsRecorder::new())
        }
    };

    let metrics_handle = if config.metrics_enabled {
        Some(metrics::init_metrics().map_err(anyhow::Error::msg)?)
    } else {
        None
    };

    let manager = SessionManager::new(Collaborators {
        catalog: Arc::new(catalog),
        audio: Arc::new(TimedAudio),
        recorder: Some(recorder.clone()),
    });

    let api_state = AppState {
        manager: manager.clone(),
        recorder: Some(recorder),
        defaults: Arc::new(config.sessions.clone()),
        metrics: metrics_handle,
    };

    let app = api::create_router(api_state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down, closing {} session(s)", manager.active_count().await);
    manager.close_all().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
