use std::time::Duration;
use thiserror::Error;

/// Failure taxonomy for every translation path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    /// Lost a deadline race; never retried by the attempt that hit it
    #[error("Translation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to parse translation: {0}")]
    ParsingError(String),

    #[error("No translation found")]
    NoTranslationFound,

    #[error("No translation method is currently available")]
    NoTranslationAvailable,

    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("Translation cancelled")]
    Cancelled,
}

impl TranslationError {
    /// Transient failures another attempt (or another backend) may get past
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError(_) | Self::Timeout(_))
    }

    /// Failures that no amount of retrying will fix for this request
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedLanguage(_) | Self::NoTranslationAvailable | Self::InvalidUrl(_)
        )
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::ParsingError(err.to_string())
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else {
            Self::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParsingError(err.to_string())
    }
}
