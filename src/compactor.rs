use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::durable::WalStore;

const CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Background task that rewrites the booking log once it has grown by
/// `threshold` appends since the last compaction.
pub async fn run_compactor(store: Arc<WalStore>, threshold: u64) {
    let mut interval = tokio::time::interval(CHECK_INTERVAL);
    loop {
        interval.tick().await;
        compact_if_needed(&store, threshold).await;
    }
}

/// One compactor pass. Returns true if the log was rewritten.
pub async fn compact_if_needed(store: &WalStore, threshold: u64) -> bool {
    let appends = store.appends_since_compact().await;
    if appends < threshold {
        return false;
    }
    match store.compact().await {
        Ok(Some(events)) => {
            metrics::counter!(crate::observability::WAL_COMPACTIONS_TOTAL).increment(1);
            info!("compacted booking log: {appends} appends folded into {events} events");
            true
        }
        Ok(None) => {
            tracing::debug!("compaction raced with a write, retrying next tick");
            false
        }
        Err(e) => {
            warn!("compaction failed: {e}");
            false
        }
    }
}
