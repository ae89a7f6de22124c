// Gateway module for the translation cache - follows the Train Station Pattern
// All external access must go through this gateway

mod storage;
mod store;
mod sweeper;
mod types;

pub use storage::{CacheStorage, FileStorage, MemoryStorage};
pub use store::{CacheStatistics, CacheStore};
pub use sweeper::{spawn_sweeper, SweeperHandle};
pub use types::{CacheEntry, CacheKey, CachedTranslation};
