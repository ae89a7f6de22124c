use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::storage::{CacheStorage, FileStorage, MemoryStorage};
use crate::app::CacheConfig;
use super::types::{CacheEntry, CacheKey, CachedTranslation};
use crate::constants::{
    BYTES_PER_MB, COMPRESSION_THRESHOLD_CHARS, EVICTION_TARGET_RATIO, HIT_RATE_FREQUENCY_SCALE,
};

/// Byte-budgeted translation cache with LRU eviction
///
/// All state sits behind one short-lived lock that is never held across an
/// await point. Concurrent writers to the same key race and the last write
/// wins; the map itself stays consistent.
#[derive(Debug)]
pub struct CacheStore {
    inner: Mutex<StoreInner>,
    storage: Arc<dyn CacheStorage>,
    /// Generation of the newest document handed to storage
    persisted_generation: Mutex<u64>,
    compression_threshold: usize,
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: HashMap<CacheKey, CacheEntry>,
    max_size_bytes: u64,
    generation: u64,
    hits: u64,
    misses: u64,
}

/// Serialized state waiting to be written
struct Snapshot {
    generation: u64,
    bytes: Option<Vec<u8>>,
}

impl CacheStore {
    /// Open the store, loading whatever `storage` holds
    ///
    /// An undecodable document is treated as an empty cache.
    pub fn open(
        storage: Arc<dyn CacheStorage>,
        max_size_bytes: u64,
        compression_threshold: usize,
    ) -> Self {
        let entries = match storage.load() {
            Ok(Some(bytes)) => decode_entries(&bytes),
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!("Failed to read persisted cache, starting empty: {:#}", e);
                HashMap::new()
            }
        };
        info!("Translation cache loaded with {} entries", entries.len());

        let store = Self {
            inner: Mutex::new(StoreInner {
                entries,
                max_size_bytes,
                ..StoreInner::default()
            }),
            storage,
            persisted_generation: Mutex::new(0),
            compression_threshold,
        };

        // A smaller budget than the one the document was written under
        if store.estimated_size_bytes() > max_size_bytes {
            store.evict();
        }
        store
    }

    /// Open the store described by `config`, file-backed unless persistence is off
    pub fn from_config(config: &CacheConfig) -> anyhow::Result<Self> {
        let storage: Arc<dyn CacheStorage> = if config.persist {
            Arc::new(FileStorage::new(config.resolve_directory()?)?)
        } else {
            Arc::new(MemoryStorage::new())
        };
        Ok(Self::open(
            storage,
            config.max_size_bytes(),
            config.compression_threshold,
        ))
    }

    /// Non-persistent store, handy for tests and one-shot runs
    pub fn in_memory(max_size_bytes: u64) -> Self {
        Self::open(
            Arc::new(MemoryStorage::new()),
            max_size_bytes,
            COMPRESSION_THRESHOLD_CHARS,
        )
    }

    /// Look up a translation, recording the hit on the entry
    ///
    /// The returned payload is the state before the hit was recorded. Hits
    /// are persisted so frequency and recency survive a restart.
    pub fn get(&self, key: &CacheKey) -> Option<CachedTranslation> {
        let (payload, snapshot) = {
            let mut inner = self.inner.lock();
            match inner.entries.get_mut(key) {
                Some(entry) => {
                    let payload = entry.payload();
                    entry.touch(Utc::now());
                    inner.hits += 1;
                    (payload, inner.snapshot())
                }
                None => {
                    inner.misses += 1;
                    return None;
                }
            }
        };
        self.persist(snapshot);
        Some(payload)
    }

    /// Inspect an entry without counting it as a hit
    pub fn peek(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.inner.lock().entries.get(key).cloned()
    }

    /// Build an entry for a fresh translation using this store's threshold
    pub fn new_entry(
        &self,
        key: CacheKey,
        translation: String,
        alternatives: Vec<String>,
        corrections: Vec<String>,
    ) -> CacheEntry {
        CacheEntry::new(
            key,
            translation,
            alternatives,
            corrections,
            self.compression_threshold,
        )
    }

    /// Insert or overwrite an entry, evicting if the budget is exceeded
    pub fn put(&self, entry: CacheEntry) {
        let snapshot = {
            let mut inner = self.inner.lock();
            debug!("Caching {}", entry.key);
            inner.entries.insert(entry.key.clone(), entry);
            if inner.estimated_size() > inner.max_size_bytes {
                inner.evict();
            }
            inner.snapshot()
        };
        self.persist(snapshot);
    }

    /// Drop least recently used entries until the store is at or below
    /// 80% of its budget; returns how many entries were removed
    pub fn evict(&self) -> usize {
        let (removed, snapshot) = {
            let mut inner = self.inner.lock();
            let removed = inner.evict();
            let snapshot = (removed > 0).then(|| inner.snapshot());
            (removed, snapshot)
        };
        if let Some(snapshot) = snapshot {
            self.persist(snapshot);
        }
        removed
    }

    /// Remove every entry and reset the session counters
    pub fn clear(&self) {
        let snapshot = {
            let mut inner = self.inner.lock();
            inner.entries.clear();
            inner.hits = 0;
            inner.misses = 0;
            inner.snapshot()
        };
        info!("Translation cache cleared");
        self.persist(snapshot);
    }

    /// Change the byte budget, applying it immediately
    pub fn set_max_size_bytes(&self, max_size_bytes: u64) {
        let snapshot = {
            let mut inner = self.inner.lock();
            inner.max_size_bytes = max_size_bytes;
            if inner.estimated_size() > max_size_bytes {
                inner.evict();
                Some(inner.snapshot())
            } else {
                None
            }
        };
        if let Some(snapshot) = snapshot {
            self.persist(snapshot);
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.inner.lock().max_size_bytes
    }

    pub fn estimated_size_bytes(&self) -> u64 {
        self.inner.lock().estimated_size()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn compression_threshold(&self) -> usize {
        self.compression_threshold
    }

    /// Get cache statistics
    pub fn statistics(&self) -> CacheStatistics {
        let inner = self.inner.lock();
        let item_count = inner.entries.len();
        let size_bytes = inner.estimated_size();

        // Average reuse per entry, saturating at ten uses
        let total_frequency: u64 = inner.entries.values().map(|e| u64::from(e.frequency)).sum();
        let hit_rate_estimate = if item_count > 0 {
            let average = total_frequency as f64 / item_count as f64;
            (average / HIT_RATE_FREQUENCY_SCALE).min(1.0)
        } else {
            0.0
        };

        CacheStatistics {
            item_count,
            size_bytes,
            size_in_mb: size_bytes as f64 / BYTES_PER_MB as f64,
            max_size_mb: inner.max_size_bytes as f64 / BYTES_PER_MB as f64,
            hit_rate_estimate,
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    /// Insert bypassing the budget check, simulating size drift
    #[cfg(test)]
    pub(crate) fn insert_unchecked(&self, entry: CacheEntry) {
        self.inner.lock().entries.insert(entry.key.clone(), entry);
    }

    /// Hand a snapshot to storage unless a newer one was already written
    fn persist(&self, snapshot: Snapshot) {
        let Some(bytes) = snapshot.bytes else {
            return;
        };
        let mut persisted = self.persisted_generation.lock();
        if snapshot.generation <= *persisted {
            return;
        }
        match self.storage.save(&bytes) {
            Ok(()) => *persisted = snapshot.generation,
            Err(e) => warn!("Failed to persist translation cache: {:#}", e),
        }
    }
}

impl StoreInner {
    fn estimated_size(&self) -> u64 {
        self.entries
            .values()
            .map(|e| e.estimated_size() as u64)
            .sum()
    }

    fn evict(&mut self) -> usize {
        let target = (self.max_size_bytes as f64 * EVICTION_TARGET_RATIO) as u64;
        let mut current = self.estimated_size();
        if current <= target {
            return 0;
        }

        let mut by_age: Vec<(CacheKey, chrono::DateTime<Utc>, u64)> = self
            .entries
            .values()
            .map(|e| (e.key.clone(), e.last_accessed, e.estimated_size() as u64))
            .collect();
        by_age.sort_by(|a, b| a.1.cmp(&b.1));

        let mut removed = 0;
        for (key, _, size) in by_age {
            if current <= target {
                break;
            }
            // Already gone means nothing to account for
            if self.entries.remove(&key).is_none() {
                continue;
            }
            current = current.saturating_sub(size);
            removed += 1;
        }

        info!(
            "Evicted {} cache entries, estimated size now {} bytes (target {})",
            removed, current, target
        );
        removed
    }

    fn snapshot(&mut self) -> Snapshot {
        self.generation += 1;
        let bytes = match serde_json::to_vec(&self.entries) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Failed to serialize translation cache: {}", e);
                None
            }
        };
        Snapshot {
            generation: self.generation,
            bytes,
        }
    }
}

/// Decode a persisted document, skipping entries that no longer parse
fn decode_entries(bytes: &[u8]) -> HashMap<CacheKey, CacheEntry> {
    let raw: HashMap<String, serde_json::Value> = match serde_json::from_slice(bytes) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Persisted translation cache is corrupted, starting empty: {}", e);
            return HashMap::new();
        }
    };

    let mut entries = HashMap::with_capacity(raw.len());
    let mut skipped = 0;
    for (stored_key, value) in raw {
        match serde_json::from_value::<CacheEntry>(value) {
            Ok(mut entry) if entry.key.as_str() == stored_key => {
                entry.frequency = entry.frequency.max(1);
                entries.insert(entry.key.clone(), entry);
            }
            Ok(_) => skipped += 1,
            Err(e) => {
                debug!("Skipping unreadable cache entry {}: {}", stored_key, e);
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warn!("Skipped {} unreadable cache entries", skipped);
    }
    entries
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStatistics {
    pub item_count: usize,
    pub size_bytes: u64,
    pub size_in_mb: f64,
    pub max_size_mb: f64,
    /// Average reuse per entry normalized to 0..=1
    pub hit_rate_estimate: f64,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStatistics {
    /// Format cache stats for display
    pub fn format(&self) -> String {
        format!(
            "Cache Statistics:\n\
            Entries: {}\n\
            Estimated size: {:.2} MB of {:.0} MB\n\
            Reuse estimate: {:.0}%\n\
            This session: {} hits, {} misses",
            self.item_count,
            self.size_in_mb,
            self.max_size_mb,
            self.hit_rate_estimate * 100.0,
            self.hits,
            self.misses
        )
    }
}
