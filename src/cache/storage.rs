use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::CACHE_STORAGE_KEY;

/// Local key-value persistence for the serialized cache document
///
/// The whole cache lives under one fixed identifier; implementations only
/// move opaque bytes.
pub trait CacheStorage: Send + Sync + Debug {
    /// Read the stored document, `None` when nothing was saved yet
    fn load(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the stored document
    fn save(&self, bytes: &[u8]) -> Result<()>;
}

/// Stores the cache document as a single file inside a cache directory
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `cache_dir`
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref();
        fs::create_dir_all(cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self {
            path: cache_dir.join(format!("{}.json", CACHE_STORAGE_KEY)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStorage for FileStorage {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read cache file {}", self.path.display()))?;
        Ok(Some(bytes))
    }

    fn save(&self, bytes: &[u8]) -> Result<()> {
        // Write next to the target and rename so a crash never leaves half a document
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes)
            .with_context(|| format!("Failed to write cache file {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace cache file {}", self.path.display()))?;
        Ok(())
    }
}

/// Process-local storage, used when persistence is disabled and in tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: Mutex<Option<Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document
    pub fn with_document(bytes: Vec<u8>) -> Self {
        Self {
            document: Mutex::new(Some(bytes)),
        }
    }

    /// Current stored bytes
    pub fn snapshot(&self) -> Option<Vec<u8>> {
        self.document.lock().clone()
    }
}

impl CacheStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.document.lock().clone())
    }

    fn save(&self, bytes: &[u8]) -> Result<()> {
        *self.document.lock() = Some(bytes.to_vec());
        Ok(())
    }
}
