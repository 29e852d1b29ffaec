//! Esports event server.
//!
//! Serves the event and bracket API over HTTP. Each event's mutations run
//! through a dedicated actor task owned by the `EventManager`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use arena::{
    EventManager,
    db::{Database, EventRepository, InMemoryEventRepository, PgEventRepository},
    team::{InMemoryTeamDirectory, PgTeamDirectory, TeamDirectory},
    wallet::{InMemoryWallet, WalletLedger, WalletManager},
};
use arena_server::{
    api,
    config::ServerConfig,
    logging, metrics,
};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the esports event and bracket server

USAGE:
  arena_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/arena_db]

FLAGS:
  --in-memory              Keep events, wallets and teams in memory (no database)
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  ADMIN_TOKEN              Bearer token for admin routes (at least 16 characters)
  STRICT_WINNER_VALIDATION Reject match results naming neither participant [default: false]
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  RUST_LOG                 Log filter [default: info,sqlx=warn,hyper=warn]
  (See .env file for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let args = Args {
        bind: pargs
            .opt_value_from_str("--bind")
            .context("Invalid --bind address")?,
        database_url: pargs
            .opt_value_from_str("--db-url")
            .context("Invalid --db-url")?,
        in_memory: pargs.contains("--in-memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.in_memory)?;
    config.validate()?;

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(Error::msg)?;
        info!("Prometheus metrics exposed at http://{}/metrics", metrics_bind);
    }

    let (repository, wallet, teams, database): (
        Arc<dyn EventRepository>,
        Arc<dyn WalletLedger>,
        Arc<dyn TeamDirectory>,
        Option<Database>,
    ) = if config.in_memory {
        info!("Using in-memory event store, wallet and team directory");
        (
            Arc::new(InMemoryEventRepository::new()),
            Arc::new(InMemoryWallet::new()),
            Arc::new(InMemoryTeamDirectory::new()),
            None,
        )
    } else {
        info!("Connecting to database");
        let db = Database::new(&config.database)
            .await
            .context("Failed to connect to database")?;
        db.migrate().await.context("Failed to run migrations")?;
        info!("Database connected and migrated");

        let pool = db.pool().clone();
        (
            Arc::new(PgEventRepository::new(pool.clone())),
            Arc::new(WalletManager::new(Arc::new(pool.clone()))),
            Arc::new(PgTeamDirectory::new(pool)),
            Some(db),
        )
    };

    let validation = config.events.winner_validation();
    info!("Winner validation: {:?}", validation);
    let event_manager = EventManager::new(repository, wallet, teams, validation);

    match event_manager.list_events().await {
        Ok(events) => info!("Loaded {} event(s)", events.len()),
        Err(e) => tracing::error!("Failed to list events: {}", e),
    }

    let app = api::create_router(api::AppState::new(
        event_manager,
        &config.security.admin_token,
    ));

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

    info!("Shutting down server...");
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
