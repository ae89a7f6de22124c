// Gateway module for translation backends - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod deadline;
mod factory;
mod lexicon;
mod on_device;
mod remote;
mod traits;
mod types;
mod variations;

// Public re-exports - the ONLY way to access backend functionality
pub use deadline::race_deadline;
pub use factory::{BackendFactory, BackendSet};
pub use lexicon::{LanguagePair, LocalLexicon};
pub use on_device::{OnDeviceEngine, OnDeviceService};
pub use remote::{parse_options, parse_translation, RemoteDictionaryService};
pub use traits::Backend;
#[cfg(test)]
pub use traits::MockBackend;
pub use types::{
    rank_options, BackendKind, BackendSelection, TranslationCategory, TranslationOption,
    TranslationRequest,
};
pub use variations::contextual_variations;
