//! Skin server binary
//!
//! Serves Minecraft skins and capes over HTTP with local overrides, a
//! periodically wiped cache and Mojang as the upstream.

use mojang_profile::MojangClient;
use skin_server::{start_server, Config, Resolver, Result, ServerState, SharedState, WipeScheduler};
use std::sync::Arc;
use texture_store::{AssetStore, OverrideStore};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("skin_server=info".parse()?)
        .add_directive("texture_store=info".parse()?)
        .add_directive("mojang_profile=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting skin server...");

    let config = Config::from_env();
    config.validate()?;
    info!("Port: {}", config.port);
    info!("Skin cache dir: {:?}", config.cache_dirs.skin);
    info!("Cape cache dir: {:?}", config.cache_dirs.cape);
    info!(
        "Cache wipe intervals: skins {}h, capes {}h",
        config.wipe_intervals.skin.as_secs() / 3600,
        config.wipe_intervals.cape.as_secs() / 3600
    );
    info!("Mojang API: {}", config.mojang_api_url);

    let overrides = OverrideStore::new(config.override_dirs.clone());
    overrides.init().await?;

    let cache = AssetStore::new(config.cache_dirs.clone());
    cache.init().await?;

    let upstream = MojangClient::with_urls(
        &config.mojang_api_url,
        &config.mojang_session_url,
        config.upstream_timeout,
    )?;

    let scheduler = WipeScheduler::start(cache.clone(), config.wipe_intervals.clone()).await;
    let resolver = Resolver::new(
        overrides,
        cache,
        Arc::new(upstream),
        config.default_files.clone(),
        config.upstream_timeout,
    );

    let state: SharedState = Arc::new(ServerState::new(resolver, scheduler));

    start_server(state.clone(), config.port, shutdown_signal()).await?;

    state.scheduler.shutdown();
    info!("Skin server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
