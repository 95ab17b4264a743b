//! Server binary: configuration, wiring, and the axum listener.

mod api;
mod assets;
mod error;
mod routes;
mod state;
mod ws;

use crate::error::{SetupErrorKind, SetupResult};
use crate::state::AppState;
use clap::Parser;
use exn::ResultExt;
use packrat_bus::Bus;
use packrat_cache::DiskCache;
use packrat_config::Config;
use packrat_merge::Merger;
use packrat_registry::{Database, Repository};
use packrat_remote::{GithubHost, HostHandle, VersionNames};
use packrat_resolver::Resolver;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Game-asset metadata resolver and resource-pack merge service.
#[derive(Debug, Parser)]
#[command(name = "packrat", version)]
struct Cli {
    /// Address to bind the HTTP listener to.
    #[arg(long)]
    listen: Option<IpAddr>,

    /// Port to listen on.
    #[arg(long)]
    port: Option<u16>,

    /// Configuration file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "startup failed");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> SetupResult<()> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| SetupErrorKind::Config)?;
    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let cache = DiskCache::new(&config.cache.dir).or_raise(|| SetupErrorKind::Cache)?;
    let host: HostHandle = Arc::new(
        GithubHost::new(cache.clone(), &config.upstream.api_base, &config.upstream.repo, config.cache.ttl())
            .or_raise(|| SetupErrorKind::Upstream)?,
    );
    let names = VersionNames::new(cache.clone(), &config.upstream.wiki_url, config.cache.ttl())
        .or_raise(|| SetupErrorKind::Upstream)?;
    let db = Database::connect(&config.registry.db).await.or_raise(|| SetupErrorKind::Database)?;
    let registry = Repository::from(&db);
    let bus = Bus::new();
    let merger = Merger::new(host.clone(), cache.clone(), registry.clone(), bus.clone(), config.cache.ttl());
    let resolver = Arc::new(Resolver::new(host.clone(), cache, config.resolver.refresh(), config.cache.ttl()));

    // Serving without a manifest would 404 every metadata request, so a
    // failed first build refuses to start instead.
    let manifest = resolver.manifest().await.or_raise(|| SetupErrorKind::Manifest)?;
    info!(versions = manifest.labels().count(), "initial manifest ready");

    let state = AppState { resolver, names, host, merger, registry, bus };
    let addr = SocketAddr::new(config.server.listen, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await.or_raise(|| SetupErrorKind::Bind(addr))?;
    info!(%addr, "listening");
    axum::serve(listener, routes::router(state))
        .await
        .or_raise(|| SetupErrorKind::Bind(addr))?;
    Ok(())
}
