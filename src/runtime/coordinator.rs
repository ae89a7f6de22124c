use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::cancel::CancelToken;
use super::status::InFlightStatus;
use crate::app::{Config, TranslationConfig};
use crate::backends::{
    Backend, BackendFactory, BackendKind, BackendSelection, BackendSet,
    OnDeviceEngine, TranslationCategory, TranslationOption, TranslationRequest,
};
use crate::cache::{spawn_sweeper, CacheKey, CacheStatistics, CacheStore, SweeperHandle};
use crate::chunking;
use crate::constants::{HARD_DEADLINE_SECS, INTER_CHUNK_DELAY_MS, MAX_CHUNK_CHARS, SINGLE_OPTION_CONFIDENCE};
use crate::utils::TranslationError;

/// Pipeline knobs
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub selection: BackendSelection,
    pub max_chunk_chars: usize,
    pub inter_chunk_delay: Duration,
    pub hard_deadline: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            selection: BackendSelection::Auto,
            max_chunk_chars: MAX_CHUNK_CHARS,
            inter_chunk_delay: Duration::from_millis(INTER_CHUNK_DELAY_MS),
            hard_deadline: Duration::from_secs(HARD_DEADLINE_SECS),
        }
    }
}

impl CoordinatorSettings {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            selection: config.backend,
            max_chunk_chars: config.max_chunk_chars.max(1),
            inter_chunk_delay: config.inter_chunk_delay(),
            hard_deadline: config.hard_deadline(),
        }
    }
}

/// Single entry point for translation: cache, chunking, backends, fallback
///
/// Concurrent calls are allowed and run independently; the in-flight flag
/// reports whether any of them is still running.
pub struct Coordinator {
    backends: BackendSet,
    cache: Arc<CacheStore>,
    settings: CoordinatorSettings,
    selection: Mutex<BackendSelection>,
    status: InFlightStatus,
    sweeper: Option<SweeperHandle>,
}

impl Coordinator {
    /// A zero chunk limit is raised to one
    pub fn new(backends: BackendSet, cache: Arc<CacheStore>, mut settings: CoordinatorSettings) -> Self {
        settings.max_chunk_chars = settings.max_chunk_chars.max(1);
        let selection = Mutex::new(settings.selection);
        Self {
            backends,
            cache,
            settings,
            selection,
            status: InFlightStatus::new(),
            sweeper: None,
        }
    }

    /// Wire up backends, the cache and its sweep from configuration
    ///
    /// Must be called inside a Tokio runtime because the sweep is spawned.
    pub fn from_config(config: &Config, engine: Option<Arc<dyn OnDeviceEngine>>) -> Result<Self> {
        let backends = BackendFactory::from_config(config, engine)?;

        let cache = Arc::new(CacheStore::from_config(&config.cache)?);

        Ok(Self::new(backends, cache, CoordinatorSettings::from_config(&config.translation))
            .with_sweeper(config.cache.sweep_interval()))
    }

    /// Run the periodic eviction sweep for as long as this coordinator lives
    pub fn with_sweeper(mut self, interval: Duration) -> Self {
        self.sweeper = Some(spawn_sweeper(&self.cache, interval));
        self
    }

    /// Translate `text`, consulting the cache first
    ///
    /// Blank input yields an empty string without touching any backend.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let _in_flight = self.status.enter();

        let key = CacheKey::new(text, source, target);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(cached.translation);
        }

        let primary = self.active_backend();
        let chunks = if chunking::char_len(text) > self.settings.max_chunk_chars {
            chunking::split(text, self.settings.max_chunk_chars)
        } else {
            vec![text.to_string()]
        };
        debug!("Translating {} chunk(s) via {}", chunks.len(), primary);

        let mut translated = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.inter_chunk_delay).await;
            }
            let result = self
                .translate_chunk_with_fallback(primary, chunk, source, target)
                .await
                .map_err(|e| {
                    warn!("Chunk {}/{} failed: {}", index + 1, chunks.len(), e);
                    e
                })?;
            translated.push(result);
        }

        let translation = chunking::join_chunks(&translated);
        self.cache
            .put(self.cache.new_entry(key, translation.clone(), Vec::new(), Vec::new()));
        Ok(translation)
    }

    pub async fn translate_request(&self, request: &TranslationRequest) -> Result<String, TranslationError> {
        self.translate(&request.text, &request.source_language, &request.target_language)
            .await
    }

    /// Like `translate`, but gives up with `Cancelled` once `cancel` fires
    ///
    /// The in-flight backend call is dropped on cancellation.
    pub async fn translate_with_cancel(
        &self,
        text: &str,
        source: &str,
        target: &str,
        cancel: &CancelToken,
    ) -> Result<String, TranslationError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Translation cancelled by caller");
                Err(TranslationError::Cancelled)
            }
            result = self.translate(text, source, target) => result,
        }
    }

    /// Candidate translations; only the remote dictionary returns more than one
    pub async fn translate_with_options(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Vec<TranslationOption>, TranslationError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        if self.active_backend() == BackendKind::Remote {
            let _in_flight = self.status.enter();
            return self
                .backends
                .remote
                .translate_with_options(text, source, target, self.deadline())
                .await;
        }

        let translation = self.translate(text, source, target).await?;
        Ok(vec![TranslationOption::new(
            translation,
            SINGLE_OPTION_CONFIDENCE,
            TranslationCategory::Primary,
        )])
    }

    async fn translate_chunk_with_fallback(
        &self,
        primary: BackendKind,
        chunk: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        let error = match self.call(self.backends.get(primary), chunk, source, target).await {
            Ok(translation) => return Ok(translation),
            Err(e) => e,
        };

        match primary {
            BackendKind::OnDevice => {
                info!("On-device translation failed ({}), falling back to remote", error);
                self.call(&self.backends.remote, chunk, source, target).await
            }
            BackendKind::Remote => {
                info!("Remote translation failed ({}), trying offline lexicon", error);
                match self.call(&self.backends.lexicon, chunk, source, target).await {
                    Ok(translation) if !translation.trim().is_empty() => Ok(translation),
                    Ok(_) => Err(error),
                    Err(lexicon_error) => {
                        debug!("Offline lexicon failed too: {}", lexicon_error);
                        Err(error)
                    }
                }
            }
            BackendKind::Lexicon => Err(error),
        }
    }

    async fn call(
        &self,
        backend: &Arc<dyn Backend>,
        chunk: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        backend
            .translate_chunk(chunk, source, target, self.deadline())
            .await
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.settings.hard_deadline
    }

    /// The backend a new call starts with
    pub fn active_backend(&self) -> BackendKind {
        match *self.selection.lock() {
            BackendSelection::Auto | BackendSelection::OnDevice
                if self.backends.on_device.is_available() =>
            {
                BackendKind::OnDevice
            }
            _ => BackendKind::Remote,
        }
    }

    pub fn selection(&self) -> BackendSelection {
        *self.selection.lock()
    }

    /// Change the preferred backend for subsequent calls
    pub fn set_selection(&self, selection: BackendSelection) {
        *self.selection.lock() = selection;
    }

    /// Whether the starting backend claims support for this pair
    pub fn can_translate(&self, source: &str, target: &str) -> bool {
        self.backends
            .get(self.active_backend())
            .supports(source, target)
    }

    pub fn is_translating(&self) -> bool {
        self.status.is_active()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<bool> {
        self.status.subscribe()
    }

    pub fn backends(&self) -> &BackendSet {
        &self.backends
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }

    pub fn set_max_cache_size_bytes(&self, max_size_bytes: u64) {
        self.cache.set_max_size_bytes(max_size_bytes);
    }

    pub fn has_sweeper(&self) -> bool {
        self.sweeper.as_ref().is_some_and(|s| !s.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{race_deadline, LocalLexicon, MockBackend};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;

    fn settings() -> CoordinatorSettings {
        CoordinatorSettings {
            selection: BackendSelection::Auto,
            max_chunk_chars: MAX_CHUNK_CHARS,
            inter_chunk_delay: Duration::from_millis(1),
            hard_deadline: Duration::from_secs(2),
        }
    }

    fn no_on_device() -> MockBackend {
        let mut backend = MockBackend::new();
        backend.expect_is_available().return_const(false);
        backend.expect_kind().return_const(BackendKind::OnDevice);
        backend.expect_translate_chunk().never();
        backend
    }

    fn unused(kind: BackendKind) -> MockBackend {
        let mut backend = MockBackend::new();
        backend.expect_kind().return_const(kind);
        backend.expect_translate_chunk().never();
        backend
    }

    fn failing(kind: BackendKind, error: TranslationError) -> MockBackend {
        let mut backend = MockBackend::new();
        backend.expect_kind().return_const(kind);
        backend
            .expect_translate_chunk()
            .returning(move |_, _, _, _| Err(error.clone()));
        backend
    }

    fn coordinator(remote: MockBackend, on_device: MockBackend, lexicon: impl Backend + 'static) -> Coordinator {
        coordinator_with(remote, on_device, lexicon, settings())
    }

    fn coordinator_with(
        remote: impl Backend + 'static,
        on_device: impl Backend + 'static,
        lexicon: impl Backend + 'static,
        settings: CoordinatorSettings,
    ) -> Coordinator {
        Coordinator::new(
            BackendSet::new(Arc::new(remote), Arc::new(on_device), Arc::new(lexicon)),
            Arc::new(CacheStore::in_memory(1024 * 1024)),
            settings,
        )
    }

    /// Blocks every call until released or the deadline passes
    struct GatedBackend {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl Backend for GatedBackend {
        async fn translate_chunk(
            &self,
            text: &str,
            _source: &str,
            _target: &str,
            deadline: Instant,
        ) -> Result<String, TranslationError> {
            race_deadline(deadline, async {
                self.gate.notified().await;
                Ok(text.to_uppercase())
            })
            .await
        }

        fn kind(&self) -> BackendKind {
            BackendKind::Remote
        }
    }

    #[tokio::test]
    async fn test_repeat_calls_hit_cache_and_bump_frequency() {
        let mut remote = MockBackend::new();
        remote
            .expect_translate_chunk()
            .times(1)
            .returning(|_, _, _, _| Ok("привіт світ".to_string()));

        let coordinator = coordinator(remote, no_on_device(), unused(BackendKind::Lexicon));

        for _ in 0..3 {
            assert_eq!(
                coordinator.translate("Hello world", "en", "uk").await.unwrap(),
                "привіт світ"
            );
        }
        // Differently cased and padded text maps to the same entry
        assert_eq!(
            coordinator.translate("  HELLO WORLD ", "en", "uk").await.unwrap(),
            "привіт світ"
        );

        let entry = coordinator
            .cache()
            .peek(&CacheKey::new("hello world", "en", "uk"))
            .unwrap();
        assert_eq!(entry.frequency, 4);

        let stats = coordinator.cache_statistics();
        assert_eq!(stats.item_count, 1);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_lexicon() {
        let coordinator = coordinator(
            failing(BackendKind::Remote, TranslationError::NetworkError("offline".into())),
            no_on_device(),
            LocalLexicon::builtin(),
        );

        assert_eq!(coordinator.translate("hello", "en", "uk").await.unwrap(), "привіт");
    }

    #[tokio::test]
    async fn test_lexicon_miss_propagates_remote_error() {
        let remote_error = TranslationError::Timeout(Duration::from_secs(10));
        let coordinator = coordinator(
            failing(BackendKind::Remote, remote_error.clone()),
            no_on_device(),
            LocalLexicon::builtin(),
        );

        let err = coordinator
            .translate("quantum chromodynamics", "en", "uk")
            .await
            .unwrap_err();
        assert_eq!(err, remote_error);
        assert!(coordinator.cache().is_empty());
    }

    #[tokio::test]
    async fn test_on_device_failure_hops_to_remote_once() {
        let mut on_device = failing(
            BackendKind::OnDevice,
            TranslationError::UnsupportedLanguage("uk".into()),
        );
        on_device.expect_is_available().return_const(true);

        let mut remote = MockBackend::new();
        remote
            .expect_translate_chunk()
            .times(1)
            .returning(|_, _, _, _| Ok("привіт".to_string()));

        let coordinator = coordinator(remote, on_device, unused(BackendKind::Lexicon));
        assert_eq!(coordinator.active_backend(), BackendKind::OnDevice);
        assert_eq!(coordinator.translate("hello", "en", "uk").await.unwrap(), "привіт");
    }

    #[tokio::test]
    async fn test_on_device_then_remote_failure_returns_remote_error() {
        let mut on_device = failing(BackendKind::OnDevice, TranslationError::NoTranslationFound);
        on_device.expect_is_available().return_const(true);
        let remote_error = TranslationError::NetworkError("dns".into());

        let coordinator = coordinator(
            failing(BackendKind::Remote, remote_error.clone()),
            on_device,
            unused(BackendKind::Lexicon),
        );

        assert_eq!(
            coordinator.translate("hello", "en", "uk").await.unwrap_err(),
            remote_error
        );
    }

    #[tokio::test]
    async fn test_failing_middle_chunk_aborts_whole_call() {
        let mut remote = MockBackend::new();
        remote.expect_translate_chunk().returning(|text, _, _, _| {
            if text.starts_with("bbbb") {
                Err(TranslationError::NetworkError("reset".into()))
            } else {
                Ok(text.to_uppercase())
            }
        });

        let coordinator = coordinator_with(
            remote,
            no_on_device(),
            failing(BackendKind::Lexicon, TranslationError::NoTranslationFound),
            CoordinatorSettings {
                max_chunk_chars: 20,
                ..settings()
            },
        );

        let err = coordinator
            .translate("aaaa aaaa. bbbb bbbb. cccc cccc.", "en", "uk")
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::NetworkError(_)));
        assert!(coordinator.cache().is_empty());
    }

    #[tokio::test]
    async fn test_chunks_are_joined_in_order() {
        let mut remote = MockBackend::new();
        remote
            .expect_translate_chunk()
            .times(3)
            .returning(|text, _, _, _| Ok(text.to_uppercase()));

        let coordinator = coordinator_with(
            remote,
            no_on_device(),
            unused(BackendKind::Lexicon),
            CoordinatorSettings {
                max_chunk_chars: 20,
                ..settings()
            },
        );

        let text = "aaaa aaaa. bbbb bbbb! cccc cccc?";
        assert_eq!(
            coordinator.translate(text, "en", "uk").await.unwrap(),
            "AAAA AAAA. BBBB BBBB. CCCC CCCC."
        );
        assert_eq!(coordinator.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_chunks_are_dispatched_sequentially_with_spacing() {
        let calls: Arc<Mutex<Vec<(String, std::time::Instant)>>> = Arc::default();
        let recorded = calls.clone();
        let mut remote = MockBackend::new();
        remote
            .expect_translate_chunk()
            .times(3)
            .returning(move |text, _, _, _| {
                recorded.lock().push((text.to_string(), std::time::Instant::now()));
                Ok(text.to_uppercase())
            });

        let delay = Duration::from_millis(100);
        let coordinator = coordinator_with(
            remote,
            no_on_device(),
            unused(BackendKind::Lexicon),
            CoordinatorSettings {
                max_chunk_chars: 20,
                inter_chunk_delay: delay,
                ..settings()
            },
        );

        let started = std::time::Instant::now();
        coordinator
            .translate("aaaa aaaa. bbbb bbbb. cccc cccc.", "en", "uk")
            .await
            .unwrap();

        let calls = calls.lock();
        let order: Vec<char> = calls
            .iter()
            .filter_map(|(text, _)| text.trim().chars().next())
            .collect();
        assert_eq!(order, vec!['a', 'b', 'c']);

        // No pause before the first chunk
        assert!(calls[0].1.duration_since(started) < delay);
        for pair in calls.windows(2) {
            assert!(pair[1].1.duration_since(pair[0].1) >= delay);
        }
    }

    #[tokio::test]
    async fn test_zero_chunk_limit_does_not_panic() {
        let mut remote = MockBackend::new();
        remote
            .expect_translate_chunk()
            .returning(|text, _, _, _| Ok(text.to_uppercase()));

        let coordinator = coordinator_with(
            remote,
            no_on_device(),
            unused(BackendKind::Lexicon),
            CoordinatorSettings {
                max_chunk_chars: 0,
                ..settings()
            },
        );

        assert_eq!(
            coordinator.translate("one two", "en", "uk").await.unwrap(),
            "ONE TWO."
        );
    }

    #[tokio::test]
    async fn test_blank_text_skips_backends() {
        let coordinator = coordinator(
            unused(BackendKind::Remote),
            no_on_device(),
            unused(BackendKind::Lexicon),
        );
        assert_eq!(coordinator.translate("   \n", "en", "uk").await.unwrap(), "");
        assert!(coordinator.cache().is_empty());
    }

    #[tokio::test]
    async fn test_in_flight_flag_follows_call() {
        let gate = Arc::new(Notify::new());
        let coordinator = Arc::new(coordinator_with(
            GatedBackend { gate: gate.clone() },
            no_on_device(),
            unused(BackendKind::Lexicon),
            settings(),
        ));
        let mut status = coordinator.subscribe_status();
        assert!(!coordinator.is_translating());

        let task = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.translate("hello", "en", "uk").await })
        };

        status.wait_for(|active| *active).await.unwrap();
        assert!(coordinator.is_translating());

        gate.notify_one();
        assert_eq!(task.await.unwrap().unwrap(), "HELLO");
        assert!(!coordinator.is_translating());
    }

    #[tokio::test]
    async fn test_cancel_drops_in_flight_call() {
        let coordinator = Arc::new(coordinator_with(
            GatedBackend {
                gate: Arc::new(Notify::new()),
            },
            no_on_device(),
            unused(BackendKind::Lexicon),
            settings(),
        ));
        let token = CancelToken::new();
        let mut status = coordinator.subscribe_status();

        let task = {
            let coordinator = coordinator.clone();
            let token = token.clone();
            tokio::spawn(async move {
                coordinator
                    .translate_with_cancel("hello", "en", "uk", &token)
                    .await
            })
        };

        status.wait_for(|active| *active).await.unwrap();
        token.cancel();

        assert_eq!(task.await.unwrap().unwrap_err(), TranslationError::Cancelled);
        assert!(!coordinator.is_translating());
        assert!(coordinator.cache().is_empty());
    }

    #[tokio::test]
    async fn test_hung_backend_hits_hard_deadline() {
        let coordinator = coordinator_with(
            GatedBackend {
                gate: Arc::new(Notify::new()),
            },
            no_on_device(),
            failing(BackendKind::Lexicon, TranslationError::NoTranslationFound),
            CoordinatorSettings {
                hard_deadline: Duration::from_millis(50),
                ..settings()
            },
        );

        let err = coordinator.translate("hello", "en", "uk").await.unwrap_err();
        assert!(matches!(err, TranslationError::Timeout(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_not_serialized() {
        let mut remote = MockBackend::new();
        remote
            .expect_translate_chunk()
            .returning(|text, _, target, _| Ok(format!("{}:{}", target, text)));

        let coordinator = coordinator(remote, no_on_device(), unused(BackendKind::Lexicon));

        let (a, b, c) = tokio::join!(
            coordinator.translate("one", "en", "uk"),
            coordinator.translate("two", "en", "uk"),
            coordinator.translate("one", "en", "es"),
        );
        assert_eq!(a.unwrap(), "uk:one");
        assert_eq!(b.unwrap(), "uk:two");
        assert_eq!(c.unwrap(), "es:one");
        assert_eq!(coordinator.cache().len(), 3);
        assert!(!coordinator.is_translating());
    }

    #[tokio::test]
    async fn test_selection_and_capabilities() {
        let mut on_device = MockBackend::new();
        on_device.expect_is_available().return_const(true);
        on_device
            .expect_supports()
            .returning(|source, target| source == "en" && target == "uk");

        let mut remote = MockBackend::new();
        remote.expect_supports().return_const(true);

        let coordinator = coordinator(remote, on_device, unused(BackendKind::Lexicon));
        assert_eq!(coordinator.active_backend(), BackendKind::OnDevice);
        assert!(coordinator.can_translate("en", "uk"));
        assert!(!coordinator.can_translate("en", "xx"));

        coordinator.set_selection(BackendSelection::Remote);
        assert_eq!(coordinator.selection(), BackendSelection::Remote);
        assert_eq!(coordinator.active_backend(), BackendKind::Remote);
        assert!(coordinator.can_translate("en", "xx"));
    }

    #[tokio::test]
    async fn test_unavailable_on_device_selection_uses_remote() {
        let coordinator = coordinator_with(
            unused(BackendKind::Remote),
            no_on_device(),
            unused(BackendKind::Lexicon),
            CoordinatorSettings {
                selection: BackendSelection::OnDevice,
                ..settings()
            },
        );
        assert_eq!(coordinator.active_backend(), BackendKind::Remote);
    }

    #[tokio::test]
    async fn test_remote_options_pass_through() {
        let mut remote = MockBackend::new();
        remote.expect_translate_with_options().times(1).returning(|_, _, _, _| {
            Ok(vec![
                TranslationOption::new("привіт", 0.95, TranslationCategory::Primary),
                TranslationOption::new("вітаю", 0.8, TranslationCategory::Synonym),
            ])
        });

        let coordinator = coordinator(remote, no_on_device(), unused(BackendKind::Lexicon));
        let options = coordinator
            .translate_with_options("hello", "en", "uk")
            .await
            .unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].text, "вітаю");
    }

    #[tokio::test]
    async fn test_single_result_wrapped_as_option() {
        let mut on_device = MockBackend::new();
        on_device.expect_is_available().return_const(true);
        on_device
            .expect_translate_chunk()
            .returning(|_, _, _, _| Ok("hola".to_string()));

        let coordinator = coordinator(
            unused(BackendKind::Remote),
            on_device,
            unused(BackendKind::Lexicon),
        );
        let options = coordinator
            .translate_with_options("hello", "en", "es")
            .await
            .unwrap();
        assert_eq!(
            options,
            vec![TranslationOption::new("hola", 1.0, TranslationCategory::Primary)]
        );
    }

    #[tokio::test]
    async fn test_from_config_without_persistence() {
        let mut config = Config::default();
        config.cache.persist = false;

        let coordinator = Coordinator::from_config(&config, None).unwrap();
        assert!(coordinator.has_sweeper());
        assert_eq!(coordinator.active_backend(), BackendKind::Remote);
        assert_eq!(coordinator.cache_statistics().item_count, 0);

        coordinator.set_max_cache_size_bytes(1024);
        assert_eq!(coordinator.cache().max_size_bytes(), 1024);
    }
}
