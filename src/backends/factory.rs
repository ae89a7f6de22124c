use anyhow::{Context, Result};
use std::sync::Arc;

use super::lexicon::LocalLexicon;
use super::on_device::{OnDeviceEngine, OnDeviceService};
use super::remote::RemoteDictionaryService;
use super::traits::Backend;
use super::types::BackendKind;
use crate::app::Config;

/// One instance of every backend variant, shared by the coordinator
#[derive(Clone)]
pub struct BackendSet {
    pub remote: Arc<dyn Backend>,
    pub on_device: Arc<dyn Backend>,
    pub lexicon: Arc<dyn Backend>,
}

impl BackendSet {
    pub fn new(remote: Arc<dyn Backend>, on_device: Arc<dyn Backend>, lexicon: Arc<dyn Backend>) -> Self {
        Self {
            remote,
            on_device,
            lexicon,
        }
    }

    pub fn get(&self, kind: BackendKind) -> &Arc<dyn Backend> {
        match kind {
            BackendKind::Remote => &self.remote,
            BackendKind::OnDevice => &self.on_device,
            BackendKind::Lexicon => &self.lexicon,
        }
    }
}

/// Builds backends from configuration
pub struct BackendFactory;

impl BackendFactory {
    /// Create every backend; `engine` is the host's on-device translator, if any
    pub fn from_config(config: &Config, engine: Option<Arc<dyn OnDeviceEngine>>) -> Result<BackendSet> {
        let remote = RemoteDictionaryService::new(&config.remote)
            .context("Failed to create remote dictionary client")?;

        let on_device = match engine {
            Some(engine) => OnDeviceService::with_engine(engine),
            None => OnDeviceService::unavailable(),
        };

        let lexicon = LocalLexicon::from_config(&config.lexicon)?;

        Ok(BackendSet::new(Arc::new(remote), Arc::new(on_device), Arc::new(lexicon)))
    }
}
