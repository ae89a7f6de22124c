use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::store::CacheStore;

/// Background task that periodically re-applies the cache budget
///
/// Aborted when the handle is dropped; also stops on its own once the store
/// it watches is gone.
#[derive(Debug)]
pub struct SweeperHandle {
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start the periodic eviction sweep; must be called inside a Tokio runtime
pub fn spawn_sweeper(store: &Arc<CacheStore>, interval: Duration) -> SweeperHandle {
    let store: Weak<CacheStore> = Arc::downgrade(store);
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(store) = store.upgrade() else {
                break;
            };
            let removed = store.evict();
            debug!("Periodic cache sweep removed {} entries", removed);
        }
    });
    SweeperHandle { handle }
}
