use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use tokio::time::Instant;
use tracing::{debug, info};

use super::traits::Backend;
use super::types::BackendKind;
use crate::app::LexiconConfig;
use crate::constants::AUTO_DETECT_LANGUAGE;
use crate::utils::TranslationError;

static EDGE_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{P}+|\p{P}+$").expect("punctuation pattern is valid"));

/// Ordered (source, target) language codes
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Parse the `source-target` form used as a table name
    pub fn parse(name: &str) -> Option<Self> {
        let (source, target) = name.split_once('-')?;
        if source.is_empty() || target.is_empty() || target.contains('-') {
            return None;
        }
        Some(Self::new(source.to_lowercase(), target.to_lowercase()))
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

type Table = HashMap<String, String>;

/// How well a table covered the input
struct Lookup {
    translation: String,
    /// Tokens matched, or `usize::MAX` for a whole-phrase hit
    score: usize,
}

/// Offline phrase tables, loaded once and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct LocalLexicon {
    tables: BTreeMap<LanguagePair, Table>,
}

impl LocalLexicon {
    /// No tables at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// The phrase tables that ship with the binary
    pub fn builtin() -> Self {
        let mut lexicon = Self::empty();
        for (name, phrases) in BUILTIN_TABLES {
            if let Some(pair) = LanguagePair::parse(name) {
                lexicon.insert_phrases(
                    pair,
                    phrases.iter().map(|(from, to)| (from.to_string(), to.to_string())),
                );
            }
        }
        lexicon
    }

    /// Builtin tables plus the configured user file, if any
    pub fn from_config(config: &LexiconConfig) -> Result<Self> {
        let mut lexicon = Self::builtin();
        if let Some(path) = &config.path {
            let added = lexicon.merge_file(path)?;
            info!("Loaded {} lexicon phrases from {}", added, path.display());
        }
        Ok(lexicon)
    }

    /// Merge a TOML file of `[source-target]` tables over the current ones
    pub fn merge_file(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon file {}", path.display()))?;
        self.merge_toml(&content)
            .with_context(|| format!("Invalid lexicon file {}", path.display()))
    }

    /// Merge TOML such as `[en-de]\nhello = "hallo"`; returns phrases added
    pub fn merge_toml(&mut self, content: &str) -> Result<usize> {
        let parsed: BTreeMap<String, HashMap<String, String>> =
            toml::from_str(content).context("Failed to parse lexicon TOML")?;

        let mut added = 0;
        for (name, phrases) in parsed {
            let pair = LanguagePair::parse(&name).with_context(|| {
                format!("Table name '{}' is not of the form source-target", name)
            })?;
            added += phrases.len();
            self.insert_phrases(pair, phrases);
        }
        Ok(added)
    }

    fn insert_phrases(&mut self, pair: LanguagePair, phrases: impl IntoIterator<Item = (String, String)>) {
        let table = self.tables.entry(pair).or_default();
        for (from, to) in phrases {
            table.insert(normalize(&from), to);
        }
    }

    pub fn is_pair_supported(&self, source: &str, target: &str) -> bool {
        self.tables.contains_key(&LanguagePair::new(source, target))
    }

    /// Pairs with a table, in stable order
    pub fn supported_pairs(&self) -> Vec<LanguagePair> {
        self.tables.keys().cloned().collect()
    }

    /// Total phrases across every table
    pub fn dictionary_size(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }

    /// Phrases in one table
    pub fn table_size(&self, pair: &LanguagePair) -> usize {
        self.tables.get(pair).map_or(0, HashMap::len)
    }

    /// Look `text` up, translating matched tokens and passing the rest through
    pub fn lookup(&self, text: &str, source: &str, target: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::NoTranslationFound);
        }

        if source == AUTO_DETECT_LANGUAGE {
            return self.lookup_any_source(text, target);
        }

        let pair = LanguagePair::new(source, target);
        let table = self
            .tables
            .get(&pair)
            .ok_or_else(|| TranslationError::UnsupportedLanguage(pair.to_string()))?;

        lookup_in(table, text)
            .map(|found| found.translation)
            .ok_or(TranslationError::NoTranslationFound)
    }

    fn lookup_any_source(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        let mut candidates = self
            .tables
            .iter()
            .filter(|(pair, _)| pair.target == target)
            .peekable();

        if candidates.peek().is_none() {
            return Err(TranslationError::UnsupportedLanguage(format!(
                "{}-{}",
                AUTO_DETECT_LANGUAGE, target
            )));
        }

        let mut best: Option<(&LanguagePair, Lookup)> = None;
        for (pair, table) in candidates {
            if let Some(found) = lookup_in(table, text) {
                if best.as_ref().map_or(true, |(_, b)| found.score > b.score) {
                    best = Some((pair, found));
                }
            }
        }

        match best {
            Some((pair, found)) => {
                debug!("Lexicon guessed source {} for auto-detected text", pair.source);
                Ok(found.translation)
            }
            None => Err(TranslationError::NoTranslationFound),
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn lookup_in(table: &Table, text: &str) -> Option<Lookup> {
    if let Some(phrase) = table.get(&normalize(text)) {
        return Some(Lookup {
            translation: phrase.clone(),
            score: usize::MAX,
        });
    }

    let mut matched = 0;
    let words: Vec<String> = text
        .split_whitespace()
        .map(|token| {
            let bare = EDGE_PUNCTUATION.replace_all(token, "").to_lowercase();
            match table.get(&bare) {
                Some(phrase) => {
                    matched += 1;
                    phrase.clone()
                }
                None => token.to_string(),
            }
        })
        .collect();

    (matched > 0).then(|| Lookup {
        translation: words.join(" "),
        score: matched,
    })
}

#[async_trait]
impl Backend for LocalLexicon {
    async fn translate_chunk(
        &self,
        text: &str,
        source: &str,
        target: &str,
        _deadline: Instant,
    ) -> Result<String, TranslationError> {
        self.lookup(text, source, target)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Lexicon
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        if source == AUTO_DETECT_LANGUAGE {
            return self.tables.keys().any(|pair| pair.target == target);
        }
        self.is_pair_supported(source, target)
    }
}

const BUILTIN_TABLES: &[(&str, &[(&str, &str)])] = &[
    (
        "en-uk",
        &[
            ("hello", "привіт"),
            ("goodbye", "до побачення"),
            ("yes", "так"),
            ("no", "ні"),
            ("please", "будь ласка"),
            ("thank you", "дякую"),
            ("sorry", "вибачте"),
            ("good", "добре"),
            ("bad", "погано"),
            ("water", "вода"),
            ("food", "їжа"),
            ("help", "допомога"),
            ("love", "любов"),
            ("friend", "друг"),
            ("family", "сім'я"),
            ("home", "дім"),
            ("work", "робота"),
            ("school", "школа"),
            ("time", "час"),
            ("day", "день"),
            ("night", "ніч"),
            ("morning", "ранок"),
            ("evening", "вечір"),
            ("today", "сьогодні"),
            ("tomorrow", "завтра"),
            ("yesterday", "вчора"),
            ("i", "я"),
            ("you", "ти"),
            ("he", "він"),
            ("she", "вона"),
            ("we", "ми"),
            ("they", "вони"),
            ("what", "що"),
            ("where", "де"),
            ("when", "коли"),
            ("why", "чому"),
            ("how", "як"),
            ("name", "ім'я"),
            ("translate", "перекласти"),
            ("language", "мова"),
            ("understand", "розуміти"),
            ("speak", "говорити"),
            ("write", "писати"),
            ("read", "читати"),
        ],
    ),
    (
        "uk-en",
        &[
            ("привіт", "hello"),
            ("до побачення", "goodbye"),
            ("так", "yes"),
            ("ні", "no"),
            ("будь ласка", "please"),
            ("дякую", "thank you"),
            ("вибачте", "sorry"),
            ("добре", "good"),
            ("погано", "bad"),
            ("вода", "water"),
            ("їжа", "food"),
            ("допомога", "help"),
            ("любов", "love"),
            ("друг", "friend"),
            ("сім'я", "family"),
            ("дім", "home"),
            ("робота", "work"),
            ("школа", "school"),
            ("час", "time"),
            ("день", "day"),
            ("ніч", "night"),
            ("ранок", "morning"),
            ("вечір", "evening"),
            ("сьогодні", "today"),
            ("завтра", "tomorrow"),
            ("вчора", "yesterday"),
            ("я", "i"),
            ("ти", "you"),
            ("він", "he"),
            ("вона", "she"),
            ("ми", "we"),
            ("вони", "they"),
            ("що", "what"),
            ("де", "where"),
            ("коли", "when"),
            ("чому", "why"),
            ("як", "how"),
            ("ім'я", "name"),
            ("перекласти", "translate"),
            ("мова", "language"),
            ("розуміти", "understand"),
            ("говорити", "speak"),
            ("писати", "write"),
            ("читати", "read"),
        ],
    ),
    (
        "en-ru",
        &[
            ("hello", "привет"),
            ("goodbye", "до свидания"),
            ("yes", "да"),
            ("no", "нет"),
            ("please", "пожалуйста"),
            ("thank you", "спасибо"),
            ("sorry", "извините"),
            ("good", "хорошо"),
            ("bad", "плохо"),
            ("water", "вода"),
            ("food", "еда"),
            ("help", "помощь"),
            ("love", "любовь"),
            ("friend", "друг"),
            ("family", "семья"),
            ("home", "дом"),
            ("work", "работа"),
            ("school", "школа"),
            ("time", "время"),
            ("day", "день"),
            ("night", "ночь"),
            ("morning", "утро"),
            ("evening", "вечер"),
            ("today", "сегодня"),
            ("tomorrow", "завтра"),
            ("yesterday", "вчера"),
        ],
    ),
    (
        "ru-en",
        &[
            ("привет", "hello"),
            ("до свидания", "goodbye"),
            ("да", "yes"),
            ("нет", "no"),
            ("пожалуйста", "please"),
            ("спасибо", "thank you"),
            ("извините", "sorry"),
            ("хорошо", "good"),
            ("плохо", "bad"),
            ("вода", "water"),
            ("еда", "food"),
            ("помощь", "help"),
            ("любовь", "love"),
            ("друг", "friend"),
            ("семья", "family"),
            ("дом", "home"),
            ("работа", "work"),
            ("школа", "school"),
            ("время", "time"),
            ("день", "day"),
            ("ночь", "night"),
            ("утро", "morning"),
            ("вечер", "evening"),
            ("сегодня", "today"),
            ("завтра", "tomorrow"),
            ("вчера", "yesterday"),
        ],
    ),
    (
        "en-es",
        &[
            ("hello", "hola"),
            ("goodbye", "adiós"),
            ("yes", "sí"),
            ("no", "no"),
            ("please", "por favor"),
            ("thank you", "gracias"),
            ("sorry", "lo siento"),
            ("good", "bueno"),
            ("bad", "malo"),
            ("water", "agua"),
            ("food", "comida"),
            ("help", "ayuda"),
            ("love", "amor"),
            ("friend", "amigo"),
            ("family", "familia"),
            ("home", "casa"),
            ("work", "trabajo"),
            ("school", "escuela"),
            ("time", "tiempo"),
            ("day", "día"),
            ("night", "noche"),
            ("morning", "mañana"),
            ("evening", "tarde"),
            ("today", "hoy"),
            ("tomorrow", "mañana"),
            ("yesterday", "ayer"),
        ],
    ),
    (
        "es-en",
        &[
            ("hola", "hello"),
            ("adiós", "goodbye"),
            ("sí", "yes"),
            ("no", "no"),
            ("por favor", "please"),
            ("gracias", "thank you"),
            ("lo siento", "sorry"),
            ("bueno", "good"),
            ("malo", "bad"),
            ("agua", "water"),
            ("comida", "food"),
            ("ayuda", "help"),
            ("amor", "love"),
            ("amigo", "friend"),
            ("familia", "family"),
            ("casa", "home"),
            ("trabajo", "work"),
            ("escuela", "school"),
            ("tiempo", "time"),
            ("día", "day"),
            ("noche", "night"),
            ("mañana", "morning"),
            ("tarde", "evening"),
            ("hoy", "today"),
            ("ayer", "yesterday"),
        ],
    ),
];
