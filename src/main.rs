//! hashcache - Expiring hash caches and an advisory lock over a key-value store
//!
//! Process wiring: connects to the store, registers the configured cache and
//! runs the periodic active sweep until shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hashcache::store::RedisStore;
use hashcache::{spawn_sweep_task, CacheRegistry, Config, HashStore, SharedStore};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect to the store and verify it answers
/// 4. Register the configured cache (starting its lazy sweep workers)
/// 5. Start the periodic active sweep
/// 6. Wait for SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hashcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hashcache");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: store={}, cache={}, data_ttl={}s, rate_limit={}, sweep_interval={}s",
        config.store_addr, config.cache_key, config.data_ttl, config.rate_limit, config.sweep_interval
    );

    let store = RedisStore::connect(&config.store_url())
        .await
        .context("failed to connect to store")?;
    store.ping().await.context("store did not answer PING")?;
    let store: SharedStore = Arc::new(store);

    let registry = Arc::new(CacheRegistry::new(store, config.cache_options()));
    registry.register(&config.cache_key, None).await;

    let sweep_handle = spawn_sweep_task(
        registry.clone(),
        Duration::from_secs(config.sweep_interval.max(1)),
    );
    info!("Active sweep task started");

    shutdown_signal().await;

    sweep_handle.abort();
    warn!("Active sweep task aborted");
    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
