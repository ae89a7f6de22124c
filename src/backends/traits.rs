use async_trait::async_trait;
use tokio::time::Instant;

use super::types::{BackendKind, TranslationCategory, TranslationOption};
use crate::constants::SINGLE_OPTION_CONFIDENCE;
use crate::utils::TranslationError;

/// Core trait that all translation backends must implement
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Translate one chunk that already fits the backend's size limit
    ///
    /// Implementations must give up with `TranslationError::Timeout` once
    /// `deadline` passes.
    async fn translate_chunk(
        &self,
        text: &str,
        source: &str,
        target: &str,
        deadline: Instant,
    ) -> Result<String, TranslationError>;

    /// Candidate translations; a backend without alternatives wraps its
    /// single result
    async fn translate_with_options(
        &self,
        text: &str,
        source: &str,
        target: &str,
        deadline: Instant,
    ) -> Result<Vec<TranslationOption>, TranslationError> {
        let translation = self.translate_chunk(text, source, target, deadline).await?;
        Ok(vec![TranslationOption::new(
            translation,
            SINGLE_OPTION_CONFIDENCE,
            TranslationCategory::Primary,
        )])
    }

    /// Which variant this is
    fn kind(&self) -> BackendKind;

    /// Whether the host can use this backend at all
    fn is_available(&self) -> bool {
        true
    }

    /// Whether the backend claims support for a language pair
    fn supports(&self, _source: &str, _target: &str) -> bool {
        true
    }
}
