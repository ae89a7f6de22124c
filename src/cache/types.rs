use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::ASSUMED_COMPRESSION_RATIO;

/// Key for cache entries: `{source}-{target}-{normalized text}`
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build the key for a request; case and surrounding whitespace of the
    /// text do not matter
    pub fn new(text: &str, source_language: &str, target_language: &str) -> Self {
        let normalized = text.trim().to_lowercase();
        Self(format!("{}-{}-{}", source_language, target_language, normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cached translation plus its usage metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: CacheKey,
    pub translation: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub corrections: Vec<String>,
    pub frequency: u32,
    pub last_accessed: DateTime<Utc>,
    /// Size-estimation hint only; the payload is always stored as plain text
    #[serde(default)]
    pub compressed_hint: bool,
}

impl CacheEntry {
    /// Fresh entry for a just-resolved translation
    pub fn new(
        key: CacheKey,
        translation: String,
        alternatives: Vec<String>,
        corrections: Vec<String>,
        compression_threshold: usize,
    ) -> Self {
        let compressed_hint = translation.chars().count() > compression_threshold;
        Self {
            key,
            translation,
            alternatives,
            corrections,
            frequency: 1,
            last_accessed: Utc::now(),
            compressed_hint,
        }
    }

    /// Estimated footprint in bytes used for budget enforcement
    pub fn estimated_size(&self) -> usize {
        let raw = self.translation.len()
            + self.alternatives.iter().map(String::len).sum::<usize>()
            + self.corrections.iter().map(String::len).sum::<usize>();
        if self.compressed_hint {
            raw / ASSUMED_COMPRESSION_RATIO
        } else {
            raw
        }
    }

    /// Record a cache hit
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.frequency = self.frequency.saturating_add(1);
        self.last_accessed = now;
    }

    pub(crate) fn payload(&self) -> CachedTranslation {
        CachedTranslation {
            translation: self.translation.clone(),
            alternatives: self.alternatives.clone(),
            corrections: self.corrections.clone(),
        }
    }
}

/// What a cache hit hands back to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTranslation {
    pub translation: String,
    pub alternatives: Vec<String>,
    pub corrections: Vec<String>,
}
