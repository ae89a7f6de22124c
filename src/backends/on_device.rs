use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::time::Instant;

use super::deadline::race_deadline;
use super::traits::Backend;
use super::types::BackendKind;
use crate::constants::{AUTO_DETECT_LANGUAGE, ON_DEVICE_LANGUAGES};
use crate::utils::TranslationError;

/// A translation engine provided by the host platform
#[async_trait]
pub trait OnDeviceEngine: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslationError>;
}

/// Host-provided on-device translation
///
/// Without an engine the service reports itself unavailable and every call
/// fails with `NoTranslationAvailable`.
pub struct OnDeviceService {
    engine: Option<Arc<dyn OnDeviceEngine>>,
    languages: BTreeSet<String>,
}

impl OnDeviceService {
    /// A host without an on-device engine
    pub fn unavailable() -> Self {
        Self {
            engine: None,
            languages: default_languages(),
        }
    }

    pub fn with_engine(engine: Arc<dyn OnDeviceEngine>) -> Self {
        Self {
            engine: Some(engine),
            languages: default_languages(),
        }
    }

    /// Replace the advertised language set
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(String::as_str)
    }

    fn check_language(&self, code: &str) -> Result<(), TranslationError> {
        if code == AUTO_DETECT_LANGUAGE || self.languages.contains(code) {
            Ok(())
        } else {
            Err(TranslationError::UnsupportedLanguage(code.to_string()))
        }
    }
}

fn default_languages() -> BTreeSet<String> {
    ON_DEVICE_LANGUAGES.iter().map(|code| code.to_string()).collect()
}

#[async_trait]
impl Backend for OnDeviceService {
    async fn translate_chunk(
        &self,
        text: &str,
        source: &str,
        target: &str,
        deadline: Instant,
    ) -> Result<String, TranslationError> {
        let engine = self
            .engine
            .as_ref()
            .ok_or(TranslationError::NoTranslationAvailable)?;

        self.check_language(source)?;
        if target == AUTO_DETECT_LANGUAGE {
            return Err(TranslationError::UnsupportedLanguage(target.to_string()));
        }
        self.check_language(target)?;

        let translation = race_deadline(deadline, engine.translate(text, source, target)).await?;
        if translation.trim().is_empty() {
            return Err(TranslationError::NoTranslationFound);
        }
        Ok(translation)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::OnDevice
    }

    fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        self.is_available()
            && target != AUTO_DETECT_LANGUAGE
            && self.check_language(source).is_ok()
            && self.check_language(target).is_ok()
    }
}
