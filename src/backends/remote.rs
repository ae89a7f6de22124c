use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use super::deadline::race_deadline;
use super::traits::Backend;
use super::types::{rank_options, BackendKind, TranslationCategory, TranslationOption};
use super::variations::contextual_variations;
use crate::app::RemoteConfig;
use crate::constants::{PRIMARY_OPTION_CONFIDENCE, REMOTE_CLIENT_ID};
use crate::utils::TranslationError;

/// Response sections requested from the dictionary endpoint
const TRANSLATION_SECTIONS: &[&str] = &["t"];
const DETAILED_SECTIONS: &[&str] = &["t", "bd", "rm", "qca", "ss"];

/// Public web dictionary reached over HTTP, one request per chunk
pub struct RemoteDictionaryService {
    client: Client,
    base_url: String,
}

impl RemoteDictionaryService {
    /// Create a service whose HTTP client enforces the per-request timeout
    pub fn new(config: &RemoteConfig) -> Result<Self, TranslationError> {
        let client = Client::builder()
            .timeout(config.per_request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;
        Self::with_client(client, config.base_url.clone())
    }

    /// Use a preconfigured client, e.g. one with custom proxies
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Result<Self, TranslationError> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|e| TranslationError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self { client, base_url })
    }

    fn build_url(
        &self,
        text: &str,
        source: &str,
        target: &str,
        sections: &[&str],
    ) -> Result<Url, TranslationError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TranslationError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client", REMOTE_CLIENT_ID)
                .append_pair("sl", source)
                .append_pair("tl", target);
            for section in sections {
                query.append_pair("dt", section);
            }
            query.append_pair("q", text);
        }
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<Value, TranslationError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::NetworkError(format!(
                "dictionary endpoint answered HTTP {}",
                status
            )));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Backend for RemoteDictionaryService {
    async fn translate_chunk(
        &self,
        text: &str,
        source: &str,
        target: &str,
        deadline: Instant,
    ) -> Result<String, TranslationError> {
        let url = self.build_url(text, source, target, TRANSLATION_SECTIONS)?;
        debug!("Remote translation {}->{} ({} chars)", source, target, text.chars().count());

        race_deadline(deadline, async {
            let body = self.fetch(url).await?;
            parse_translation(&body)
        })
        .await
    }

    async fn translate_with_options(
        &self,
        text: &str,
        source: &str,
        target: &str,
        deadline: Instant,
    ) -> Result<Vec<TranslationOption>, TranslationError> {
        let url = self.build_url(text, source, target, DETAILED_SECTIONS)?;

        let mut options = race_deadline(deadline, async {
            let body = self.fetch(url).await?;
            parse_options(&body)
        })
        .await?;

        let primary = options
            .iter()
            .find(|option| option.category == TranslationCategory::Primary)
            .map(|option| option.text.clone());
        if let Some(primary) = primary {
            options.extend(contextual_variations(&primary, target));
        }
        Ok(rank_options(options))
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }
}

/// Concatenate the translated segments of a dictionary response
///
/// The body is `[[["segment", "source", ...], ...], ...]`.
pub fn parse_translation(body: &Value) -> Result<String, TranslationError> {
    let segments = body
        .as_array()
        .and_then(|top| top.first())
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::ParsingError("missing translation segments".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(Value::as_array)
        .filter(|segment| segment.len() >= 2)
        .filter_map(|segment| segment[0].as_str())
        .collect();

    if translated.is_empty() {
        return Err(TranslationError::NoTranslationFound);
    }
    Ok(translated)
}

/// Primary translation plus dictionary candidates, ranked
///
/// Dictionary entries sit at index 1 as
/// `[part_of_speech, [terms], [[term, [back_translations], _, score], ...]]`.
pub fn parse_options(body: &Value) -> Result<Vec<TranslationOption>, TranslationError> {
    let top = body
        .as_array()
        .ok_or_else(|| TranslationError::ParsingError("response is not an array".to_string()))?;

    let mut options = Vec::new();

    match parse_translation(body) {
        Ok(primary) => options.push(TranslationOption::new(
            primary,
            PRIMARY_OPTION_CONFIDENCE,
            TranslationCategory::Primary,
        )),
        Err(TranslationError::NoTranslationFound) => {}
        Err(e) => return Err(e),
    }

    let entries = top.get(1).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
    for entry in entries.iter().filter_map(Value::as_array) {
        if entry.len() <= 2 {
            continue;
        }
        let Some(part_of_speech) = entry[0].as_str() else {
            continue;
        };
        let Some(candidates) = entry[2].as_array() else {
            continue;
        };

        for (index, candidate) in candidates.iter().enumerate() {
            let Some(fields) = candidate.as_array() else {
                continue;
            };
            let Some(term) = fields.first().and_then(Value::as_str) else {
                continue;
            };
            let score = fields.get(3).and_then(Value::as_f64);

            options.push(TranslationOption {
                text: term.to_string(),
                confidence: score.unwrap_or(0.0),
                category: TranslationCategory::from_dictionary(score, index),
                part_of_speech: Some(part_of_speech.to_string()),
            });
        }
    }

    if options.is_empty() {
        return Err(TranslationError::NoTranslationFound);
    }
    Ok(rank_options(options))
}
