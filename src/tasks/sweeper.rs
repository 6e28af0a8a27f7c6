//! Expiry Sweep Task
//!
//! Background task that periodically removes expired records. Reads already
//! purge lazily; the sweep only bounds memory held by records nobody reads.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::TtlStore;
use crate::config::SweeperConfig;

/// Spawns a task that calls [`TtlStore::cleanup_expired`] every
/// `config.interval_secs` seconds.
///
/// Must be called from within a tokio runtime. Abort the returned handle to
/// stop sweeping.
///
/// # Example
/// ```ignore
/// let store = Arc::new(TtlStore::new());
/// let handle = spawn_sweep_task(Arc::clone(&store), &SweeperConfig::default());
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task(store: Arc<TtlStore>, config: &SweeperConfig) -> JoinHandle<()> {
    let interval_secs = config.interval_secs.max(1);
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!("Starting expiry sweep with interval of {} seconds", interval_secs);

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.cleanup_expired();

            if removed > 0 {
                info!("Expiry sweep: removed {} expired records", removed);
            } else {
                debug!("Expiry sweep: no expired records found");
            }
        }
    })
}
