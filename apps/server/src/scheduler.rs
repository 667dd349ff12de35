//! Background housekeeping for the in-memory revocation store.

use std::sync::Arc;

use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use coinhub_storage_memory::MemoryRevocationStore;

/// Expired denylist entries are dropped on this interval.
const PURGE_INTERVAL_SECS: u64 = 10 * 60;

/// Starts the periodic purge of expired revocation entries.
pub fn start_revocation_purge(store: Arc<MemoryRevocationStore>) {
    tokio::spawn(async move {
        info!("Revocation purge scheduler started ({PURGE_INTERVAL_SECS}s interval)");
        let mut ticker = interval(Duration::from_secs(PURGE_INTERVAL_SECS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            run_purge(&store);
        }
    });
}

fn run_purge(store: &MemoryRevocationStore) {
    match store.purge_expired() {
        Ok(0) => debug!("Revocation purge: nothing expired"),
        Ok(purged) => info!(
            "Revocation purge dropped {} entries, {} remain",
            purged,
            store.len()
        ),
        Err(e) => warn!("Revocation purge failed: {}", e),
    }
}
