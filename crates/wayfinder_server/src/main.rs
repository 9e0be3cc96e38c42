use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wayfinder_core::constants::defaults;
use wayfinder_core::prelude::*;
use wayfinder_fs::FileSystemStorage;
use wayfinder_server::prelude::*;
use wayfinder_sled::SledStorage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Lost on restart.
    Memory,
    /// Embedded sled database in `--data-dir`.
    Sled,
    /// One JSON file per shell in `--data-dir`.
    Fs,
}

/// Asset-link discovery server.
#[derive(Parser, Debug)]
#[command(name = "wayfinder", version, about)]
struct Args {
    #[arg(long, env = "WAYFINDER_BIND", default_value = "0.0.0.0:8081")]
    bind: SocketAddr,

    #[arg(long, env = "WAYFINDER_BACKEND", value_enum, default_value_t = Backend::Memory)]
    backend: Backend,

    #[arg(long, env = "WAYFINDER_DATA_DIR", default_value = "./wayfinder_data")]
    data_dir: PathBuf,

    /// Name reported by `/description`.
    #[arg(long, env = "WAYFINDER_NAME", default_value = defaults::SERVICE_NAME)]
    name: String,

    /// `any` or `all` of the requested asset links must match.
    #[arg(long, env = "WAYFINDER_MATCH_MODE", default_value_t = MatchMode::Any)]
    match_mode: MatchMode,

    /// Page size when a request carries no `limit`.
    #[arg(long, env = "WAYFINDER_PAGE_LIMIT", default_value = "100")]
    page_limit: NonZeroUsize,

    #[arg(long, env = "WAYFINDER_EVENT_CAPACITY", default_value_t = 256)]
    event_capacity: usize,
}

impl Args {
    fn configs(&self) -> (DiscoveryConfig, ServerConfig) {
        let discovery = DiscoveryConfig {
            name: self.name.clone(),
            match_mode: self.match_mode,
        };
        let server = ServerConfig {
            bind: self.bind,
            default_limit: self.page_limit,
            event_capacity: self.event_capacity,
        };
        (discovery, server)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let (discovery, server) = args.configs();
    info!(backend = ?args.backend, match_mode = %args.match_mode, "starting wayfinder");

    match args.backend {
        Backend::Memory => serve(InMemoryStorage::new(), discovery, server).await,
        Backend::Sled => serve(SledStorage::open(&args.data_dir)?, discovery, server).await,
        Backend::Fs => serve(FileSystemStorage::new(&args.data_dir), discovery, server).await,
    }
}

async fn serve<S: StorageBackend>(
    storage: S,
    discovery: DiscoveryConfig,
    server: ServerConfig,
) -> anyhow::Result<()> {
    let events = BroadcastObserver::new(server.event_capacity);
    let service =
        DiscoveryService::with_observer(storage, (TracingObserver, events.clone()), discovery);

    let bind = server.bind;
    let app = WayfinderServer::new(server).build(service, events);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(%bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
