//! relaypage - Relay cursor pagination over a document catalog.
//!
//! # Usage
//!
//! ```bash
//! # In-memory catalog seeded from the bundled fixture
//! relaypage
//!
//! # In-memory catalog seeded from a custom fixture
//! SEED_FILE=./catalog.json relaypage
//!
//! # PostgreSQL-backed catalog, seeded once
//! DATABASE_URL=postgres://localhost/relaypage relaypage --seed
//! ```

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, fmt};

use relaypage_core::metrics::init_metrics;
use relaypage_core::models::Document;
use relaypage_core::ports::DataSource;
use relaypage_graphql::{
    Catalog, PEOPLE, STORIES, STORY_AUTHOR, ServerConfig, build_schema, serve_with_shutdown,
};
use relaypage_storage::{Database, DatabaseConfig, MemoryStore, PgStore};

/// Fixture bundled with the binary.
const BUNDLED_CATALOG: &str = include_str!("../fixtures/catalog.json");

/// Collection name -> documents.
type Fixture = BTreeMap<String, Vec<Document>>;

/// relaypage CLI - Relay pagination demo server.
#[derive(Parser, Debug)]
#[command(name = "relaypage")]
#[command(about = "Relay cursor pagination over a document catalog")]
#[command(version)]
struct Cli {
    /// PostgreSQL database URL. Without it the catalog is kept in memory.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// JSON fixture (`{"collection": [documents...]}`) replacing the bundled one.
    #[arg(long, env = "SEED_FILE")]
    seed_file: Option<PathBuf>,

    /// Load the fixture into PostgreSQL before serving.
    ///
    /// The in-memory catalog is always seeded.
    #[arg(long)]
    seed: bool,

    /// GraphQL server port.
    #[arg(long, env = "GRAPHQL_PORT", default_value = "4000")]
    graphql_port: u16,

    /// Prometheus metrics port.
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Run database migrations and exit.
    #[arg(long)]
    migrate_only: bool,

    /// Purge all stored documents from the database and exit.
    ///
    /// Schema/migrations are preserved.
    #[arg(long)]
    purge: bool,

    /// Restrict --purge to a single collection.
    #[arg(long, requires = "purge")]
    collection: Option<String>,

    /// Skip confirmation prompt for destructive operations (like --purge).
    #[arg(long, short = 'y')]
    yes: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Where the catalog lives.
enum Backend {
    Memory(MemoryStore),
    Postgres { db: Database, store: PgStore },
}

impl Backend {
    /// Insert every fixture collection, returning the number of documents.
    async fn seed(&self, fixture: Fixture) -> Result<u64> {
        let mut total = 0;
        for (name, documents) in fixture {
            let inserted = match self {
                Backend::Memory(store) => store.collection(name.as_str()).insert(documents).await,
                Backend::Postgres { store, .. } => {
                    store.collection(name.as_str()).insert_documents(&documents).await
                }
            }
            .with_context(|| format!("Failed to seed collection {}", name))?;
            debug!(collection = %name, inserted, "Collection seeded");
            total += inserted;
        }
        Ok(total)
    }

    fn catalog(&self) -> Catalog {
        Catalog::from_collections(|name| match self {
            Backend::Memory(store) => catalog_source(name, store.collection(name), |c| {
                c.with_reference(STORY_AUTHOR, PEOPLE)
            }),
            Backend::Postgres { store, .. } => catalog_source(name, store.collection(name), |c| {
                c.with_reference(STORY_AUTHOR, PEOPLE)
            }),
        })
    }

    async fn close(&self) {
        if let Backend::Postgres { db, .. } = self {
            db.close().await;
        }
    }
}

/// Expose `collection` to the catalog; stories get their author reference.
fn catalog_source<C>(
    name: &str,
    collection: C,
    reference_author: impl FnOnce(C) -> C,
) -> Arc<dyn DataSource>
where
    C: DataSource + 'static,
{
    if name == STORIES {
        Arc::new(reference_author(collection))
    } else {
        Arc::new(collection)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // Prometheus metrics exporter (optional - failures don't crash the app)
    let metrics_enabled = match format!("0.0.0.0:{}", cli.metrics_port).parse::<std::net::SocketAddr>() {
        Ok(metrics_addr) => {
            match PrometheusBuilder::new()
                .with_http_listener(metrics_addr)
                .install()
            {
                Ok(()) => {
                    init_metrics();
                    true
                }
                Err(e) => {
                    warn!("Failed to start metrics exporter: {}. Continuing without metrics.", e);
                    false
                }
            }
        }
        Err(e) => {
            warn!("Invalid metrics address: {}. Continuing without metrics.", e);
            false
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("Starting relaypage");

    let backend = match &cli.database_url {
        Some(database_url) => {
            debug!(database_url = %mask_password(database_url), "Database endpoint");

            info!("Connecting to database...");
            let db = Database::connect(&DatabaseConfig::for_graphql(database_url))
                .await
                .context("Failed to connect to database")?;

            db.ping().await.context("Database is not reachable")?;
            db.migrate().await.context("Failed to run migrations")?;
            info!("Database ready (migrations applied)");

            if cli.migrate_only {
                info!("--migrate-only flag set, exiting");
                return Ok(());
            }

            if cli.purge {
                return handle_purge(&db, cli.collection.as_deref(), cli.yes).await;
            }

            let store = PgStore::new(&db);
            Backend::Postgres { db, store }
        }
        None => {
            if cli.migrate_only || cli.purge {
                bail!("--migrate-only and --purge require a database (--database-url or DATABASE_URL)");
            }
            Backend::Memory(MemoryStore::new())
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // SEED
    // ─────────────────────────────────────────────────────────────────────────
    if matches!(backend, Backend::Memory(_)) || cli.seed {
        let fixture = load_fixture(cli.seed_file.as_deref())?;
        let inserted = backend.seed(fixture).await?;
        info!(documents = inserted, "Catalog seeded");

        if let Backend::Postgres { db, .. } = &backend {
            for size in db.collection_sizes().await.context("Failed to count documents")? {
                info!(collection = %size.collection, documents = size.documents, "Stored collection");
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // SERVICES START
    // ─────────────────────────────────────────────────────────────────────────
    let (shutdown_tx, mut graphql_shutdown_rx) = watch::channel(false);

    let graphql_config = ServerConfig {
        port: cli.graphql_port,
        ..ServerConfig::default()
    };

    let schema = build_schema(backend.catalog());
    let graphql_handle = tokio::spawn(
        async move {
            let shutdown_signal = async move {
                while !*graphql_shutdown_rx.borrow() {
                    if graphql_shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            };

            if let Err(e) = serve_with_shutdown(schema, graphql_config, shutdown_signal).await {
                error!(error = %e, "Server error");
            }
        }
        .instrument(info_span!("graphql")),
    );

    // ─────────────────────────────────────────────────────────────────────────
    // READY
    // ─────────────────────────────────────────────────────────────────────────
    info!("relaypage ready");
    info!("   GraphQL:  http://localhost:{}/graphql", cli.graphql_port);
    if metrics_enabled {
        info!("   Metrics:  http://localhost:{}/metrics", cli.metrics_port);
    } else {
        info!("   Metrics:  disabled");
    }
    info!("   Press Ctrl+C to stop");

    shutdown_signal().await;

    // ─────────────────────────────────────────────────────────────────────────
    // SHUTDOWN
    // ─────────────────────────────────────────────────────────────────────────
    info!("Shutting down...");
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(std::time::Duration::from_secs(10), graphql_handle).await {
        Ok(_) => debug!("GraphQL stopped"),
        Err(_) => warn!("GraphQL shutdown timed out"),
    }

    backend.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Parse the user fixture, or the bundled one.
fn load_fixture(path: Option<&Path>) -> Result<Fixture> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read seed file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid seed file {}", path.display()))
        }
        None => serde_json::from_str(BUNDLED_CATALOG).context("Invalid bundled catalog"),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask password in database URL for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Handle the --purge command.
async fn handle_purge(db: &Database, collection: Option<&str>, skip_confirmation: bool) -> Result<()> {
    let target = match collection {
        Some(name) => format!("every document of collection '{}'", name),
        None => "ALL stored documents".to_string(),
    };
    warn!("PURGE MODE: This will delete {}!", target);
    warn!("   - Schema and migrations will be preserved");

    if !skip_confirmation {
        print!("\nAre you sure you want to delete {}? [y/N] ", target);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            info!("Purge cancelled");
            return Ok(());
        }
    }

    info!("Purging database...");
    let stats = db.purge(collection).await.context("Failed to purge database")?;

    info!("Database purged successfully");
    info!("   Documents removed: {}", stats.documents_removed);
    info!("   Collections removed: {}", stats.collections_removed);

    Ok(())
}
