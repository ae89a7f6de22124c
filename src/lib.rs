pub mod app;
pub mod backends;
pub mod cache;
pub mod chunking;
pub mod cli;
pub mod constants;
pub mod runtime;
pub mod utils;

pub use app::{load_config, Config};
pub use backends::{Backend, BackendKind, BackendSelection, TranslationOption, TranslationRequest};
pub use cache::{CacheStatistics, CacheStore};
pub use runtime::{CancelToken, Coordinator};
pub use utils::TranslationError;
