//! sbe-enricher - Steam badge enrichment service
//!
//! Serves cached badge views immediately, refreshes stale ones through a
//! single rate-limited fetch worker, and streams presenter notifications
//! over SSE.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sbe_common::config::{self, TomlConfig};
use sbe_common::events::EventBus;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sbe_enricher::db::open_cache_store;
use sbe_enricher::models::ItemId;
use sbe_enricher::presenter::{EventPresenter, Presenter};
use sbe_enricher::services::{
    BadgeSource, CachePolicy, DataFetcher, FetchDelays, FetchQueue, HttpBadgeSource, Orchestrator,
};
use sbe_enricher::AppState;

/// Command-line arguments for sbe-enricher
#[derive(Parser, Debug)]
#[command(name = "sbe-enricher")]
#[command(about = "Steam badge enrichment service")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder holding the cache database
    #[arg(short, long, env = "SBE_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Port to listen on (overrides [server] port)
    #[arg(short, long, env = "SBE_PORT")]
    port: Option<u16>,

    /// Process the given items, wait for the queue to drain and exit
    #[arg(long, requires = "item_ids")]
    once: bool,

    /// Item ids discovered for this session
    #[arg(value_name = "ITEM_IDS")]
    item_ids: Vec<ItemId>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = config::resolve_config(args.config.as_deref())
        .context("Failed to load configuration")?;

    init_tracing(&toml_config);

    info!("Starting sbe-enricher v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    std::fs::create_dir_all(&root_folder)
        .with_context(|| format!("Failed to create root folder {}", root_folder.display()))?;
    info!("Root folder: {}", root_folder.display());

    let db_path = config::database_path(&root_folder);
    info!("Database: {}", db_path.display());
    let store = open_cache_store(&db_path).await;

    let settings = &toml_config.enricher;
    let source: Arc<dyn BadgeSource> = Arc::new(
        HttpBadgeSource::from_settings(
            &toml_config.remote,
            toml_config.remote.resolve_api_key(),
            settings.request_timeout(),
        )
        .context("Failed to build HTTP client")?,
    );

    let event_bus = EventBus::new(100);
    let presenter: Arc<dyn Presenter> = Arc::new(EventPresenter::new(
        event_bus.clone(),
        toml_config.remote.image_cdn_url.clone(),
    ));

    let scheduler = FetchQueue::new(
        DataFetcher::new(source),
        store.clone(),
        Arc::clone(&presenter),
        FetchDelays::from_settings(settings),
    );
    let orchestrator = Orchestrator::new(
        scheduler.clone(),
        store,
        CachePolicy::from_settings(settings),
        presenter,
    );

    if toml_config.enabled {
        if !args.item_ids.is_empty() {
            orchestrator.discover(&args.item_ids).await;
        }
    } else {
        warn!("Badge enhancement is disabled in configuration; discovered items are ignored");
    }

    if args.once {
        scheduler.wait_idle().await;
        info!(
            cycles = scheduler.completed_cycles(),
            "All queued items processed, exiting"
        );
        return Ok(());
    }

    let state = AppState::new(
        scheduler,
        orchestrator,
        event_bus,
        toml_config.remote.image_cdn_url.clone(),
        toml_config.enabled,
    );
    let app = sbe_enricher::build_router(state);

    let port = args.port.unwrap_or(toml_config.server.port);
    let addr: SocketAddr = format!("{}:{}", toml_config.server.host, port)
        .parse()
        .context("Invalid listen address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins; otherwise `[logging] level` applies to this workspace's crates
fn init_tracing(toml_config: &TomlConfig) {
    let level = &toml_config.logging.level;
    let default_filter = format!(
        "sbe_enricher={level},sbe_common={level},tower_http={level}",
        level = level
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
