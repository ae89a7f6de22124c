/// Constants module to avoid magic numbers in the codebase

// Remote dictionary endpoint
pub const DEFAULT_REMOTE_BASE_URL: &str = "https://translate.googleapis.com/translate_a/single";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1";
pub const REMOTE_CLIENT_ID: &str = "gtx";

// Timeouts
pub const PER_REQUEST_TIMEOUT_SECS: u64 = 8;
pub const HARD_DEADLINE_SECS: u64 = 10;
pub const INTER_CHUNK_DELAY_MS: u64 = 100;
pub const EVICTION_SWEEP_INTERVAL_SECS: u64 = 3600;

// Chunking
pub const MAX_CHUNK_CHARS: usize = 4500; // Remote endpoint rejects ~5000 chars
pub const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?'];

// Cache budget
pub const DEFAULT_MAX_CACHE_SIZE_MB: u64 = 50;
pub const BYTES_PER_MB: u64 = 1024 * 1024;
pub const COMPRESSION_THRESHOLD_CHARS: usize = 1000;
pub const ASSUMED_COMPRESSION_RATIO: usize = 4;
pub const EVICTION_TARGET_RATIO: f64 = 0.8;
pub const HIT_RATE_FREQUENCY_SCALE: f64 = 10.0;

// Persistence
pub const CACHE_STORAGE_KEY: &str = "translation_cache";

// Languages
pub const AUTO_DETECT_LANGUAGE: &str = "auto";
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";
pub const ON_DEVICE_LANGUAGES: &[&str] = &[
    "en", "uk", "ru", "es", "fr", "de", "it", "pt", "zh", "ja", "ko", "ar",
];

// Option confidence
pub const PRIMARY_OPTION_CONFIDENCE: f64 = 0.95;
pub const SINGLE_OPTION_CONFIDENCE: f64 = 1.0;
pub const CAPITALIZED_VARIATION_CONFIDENCE: f64 = 0.85;
pub const LOWERCASE_VARIATION_CONFIDENCE: f64 = 0.8;
pub const FORMALITY_VARIATION_CONFIDENCE: f64 = 0.75;
pub const ARTICLE_VARIATION_CONFIDENCE: f64 = 0.7;
