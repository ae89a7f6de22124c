use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backends::BackendSelection;
use crate::constants::{
    AUTO_DETECT_LANGUAGE, BYTES_PER_MB, COMPRESSION_THRESHOLD_CHARS, DEFAULT_MAX_CACHE_SIZE_MB,
    DEFAULT_REMOTE_BASE_URL, DEFAULT_TARGET_LANGUAGE, DEFAULT_USER_AGENT,
    EVICTION_SWEEP_INTERVAL_SECS, HARD_DEADLINE_SECS, INTER_CHUNK_DELAY_MS, MAX_CHUNK_CHARS,
    PER_REQUEST_TIMEOUT_SECS,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Request pipeline settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Remote dictionary service
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Local translation cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Offline lexicon
    #[serde(default)]
    pub lexicon: LexiconConfig,
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Which backend answers first (auto, remote, on_device)
    pub backend: BackendSelection,
    /// Source language when none is given; "auto" lets the backend detect it
    pub default_source: String,
    /// Target language when none is given
    pub default_target: String,
    /// Texts longer than this are split before translation
    pub max_chunk_chars: usize,
    /// Pause between consecutive chunk requests
    pub inter_chunk_delay_ms: u64,
    /// Wall-clock cap for a single chunk call
    pub hard_deadline_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backend: BackendSelection::Auto,
            default_source: AUTO_DETECT_LANGUAGE.to_string(),
            default_target: DEFAULT_TARGET_LANGUAGE.to_string(),
            max_chunk_chars: MAX_CHUNK_CHARS,
            inter_chunk_delay_ms: INTER_CHUNK_DELAY_MS,
            hard_deadline_secs: HARD_DEADLINE_SECS,
        }
    }
}

impl TranslationConfig {
    pub fn inter_chunk_delay(&self) -> Duration {
        Duration::from_millis(self.inter_chunk_delay_ms)
    }

    pub fn hard_deadline(&self) -> Duration {
        Duration::from_secs(self.hard_deadline_secs)
    }
}

/// Remote dictionary configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Endpoint queried for every chunk
    pub base_url: String,
    /// HTTP-level timeout for one request
    pub per_request_timeout_secs: u64,
    /// User-Agent header sent with requests
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REMOTE_BASE_URL.to_string(),
            per_request_timeout_secs: PER_REQUEST_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl RemoteConfig {
    pub fn per_request_timeout(&self) -> Duration {
        Duration::from_secs(self.per_request_timeout_secs)
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Byte budget in megabytes
    pub max_size_mb: u64,
    /// Translations longer than this (in chars) are counted at a quarter size
    pub compression_threshold: usize,
    /// How often the background sweep re-applies the budget
    pub sweep_interval_secs: u64,
    /// Directory for the persisted cache (defaults to the platform cache dir)
    pub directory: Option<PathBuf>,
    /// Keep the cache in memory only
    pub persist: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_MAX_CACHE_SIZE_MB,
            compression_threshold: COMPRESSION_THRESHOLD_CHARS,
            sweep_interval_secs: EVICTION_SWEEP_INTERVAL_SECS,
            directory: None,
            persist: true,
        }
    }
}

impl CacheConfig {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Where the cache document lives
    pub fn resolve_directory(&self) -> Result<PathBuf> {
        match &self.directory {
            Some(dir) => Ok(dir.clone()),
            None => get_cache_dir(),
        }
    }
}

/// Offline lexicon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Extra TOML table merged over the builtin phrases
    pub path: Option<PathBuf>,
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    // Get config directories
    let config_dir = get_config_dir()?;
    let global_config = config_dir.join("config.toml");
    let local_config = PathBuf::from(".translite/config.toml");

    // Build figment configuration
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    // Add global config if it exists
    if global_config.exists() {
        figment = figment.merge(Toml::file(&global_config));
    }

    // Add local config if it exists
    if local_config.exists() {
        figment = figment.merge(Toml::file(&local_config));
    }

    // Environment variables, e.g. TRANSLITE_CACHE__MAX_SIZE_MB=100
    figment = figment.merge(Env::prefixed("TRANSLITE_").split("__"));

    figment
        .extract()
        .context("Failed to load configuration")
}

/// Load configuration from one explicit file, still honoring env overrides
pub fn load_config_from(path: &Path) -> Result<Config> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TRANSLITE_").split("__"))
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "translite")
}

fn home_dir() -> Result<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .context("Could not determine home directory")
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = match project_dirs() {
        Some(dirs) => dirs.config_dir().to_path_buf(),
        None => home_dir()?.join(".config").join("translite"),
    };
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}

/// Get the cache directory (~/.cache/translite on Linux)
pub fn get_cache_dir() -> Result<PathBuf> {
    match project_dirs() {
        Some(dirs) => Ok(dirs.cache_dir().to_path_buf()),
        None => Ok(home_dir()?.join(".cache").join("translite")),
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<PathBuf> {
    let config_file = get_config_dir()?.join("config.toml");

    if !config_file.exists() {
        save_config(&Config::default(), Some(config_file.clone()))?;
    }

    Ok(config_file)
}
