//! Active Sweep Task
//!
//! Background task that periodically runs the full-scan expiry of every
//! registered cache, catching entries the lazy sweep missed (for instance
//! tokens lost on restart).

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheRegistry;

/// Spawns a background task that runs the active sweep every `interval`.
///
/// The task runs in an infinite loop, sleeping for the interval before each
/// sweep. Store failures are logged by the caches and never stop the loop.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let registry = Arc::new(CacheRegistry::new(store, CacheOptions::default()));
/// let sweep_handle = spawn_sweep_task(registry.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(registry: Arc<CacheRegistry>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting active sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let report = registry.cron_clear_expired().await;

            if report.total_removed() > 0 {
                info!(
                    "Active sweep: removed {} entries and {} rate counters across {} caches",
                    report.data_removed, report.times_removed, report.caches
                );
            } else {
                debug!("Active sweep: nothing expired in {} caches", report.caches);
            }
        }
    })
}
