use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::AUTO_DETECT_LANGUAGE;

/// One translation call as issued by a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    /// May be `auto`, leaving detection to the backend
    pub source_language: String,
    pub target_language: String,
}

impl TranslationRequest {
    pub fn new(
        text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }

    /// Request with source-language auto-detection
    pub fn auto(text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self::new(text, AUTO_DETECT_LANGUAGE, target_language)
    }
}

/// The concrete backend variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Remote,
    OnDevice,
    Lexicon,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Remote => "remote dictionary",
            Self::OnDevice => "on-device",
            Self::Lexicon => "offline lexicon",
        };
        f.write_str(name)
    }
}

/// Which backend the caller wants tried first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendSelection {
    /// On-device when the host offers it, remote otherwise
    #[default]
    Auto,
    Remote,
    OnDevice,
}

/// How a candidate translation relates to the primary one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationCategory {
    Primary,
    Synonym,
    Informal,
    Formal,
    Colloquial,
    Technical,
    Archaic,
    Alternative,
}

impl TranslationCategory {
    /// Display order, lowest first
    pub fn priority(self) -> u8 {
        match self {
            Self::Primary => 0,
            Self::Synonym => 1,
            Self::Formal => 2,
            Self::Informal => 3,
            Self::Alternative => 4,
            Self::Technical => 5,
            Self::Colloquial => 6,
            Self::Archaic => 7,
        }
    }

    /// Category for the `index`-th dictionary candidate with an optional score
    pub fn from_dictionary(score: Option<f64>, index: usize) -> Self {
        match score {
            Some(s) if s > 0.9 => {
                if index == 0 {
                    Self::Primary
                } else {
                    Self::Synonym
                }
            }
            Some(s) if s > 0.7 => Self::Synonym,
            Some(s) if s > 0.5 => Self::Alternative,
            Some(_) => Self::Colloquial,
            None if index == 0 => Self::Primary,
            None if index < 3 => Self::Synonym,
            None => Self::Alternative,
        }
    }
}

/// A candidate translation returned by `translate_with_options`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationOption {
    pub text: String,
    pub confidence: f64,
    pub category: TranslationCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
}

impl TranslationOption {
    pub fn new(text: impl Into<String>, confidence: f64, category: TranslationCategory) -> Self {
        Self {
            text: text.into(),
            confidence,
            category,
            part_of_speech: None,
        }
    }
}

/// Drop repeated (text, category) pairs, then order by category priority
/// and descending confidence
pub fn rank_options(options: Vec<TranslationOption>) -> Vec<TranslationOption> {
    let mut unique: Vec<TranslationOption> = Vec::with_capacity(options.len());
    for option in options {
        if !unique
            .iter()
            .any(|seen| seen.text == option.text && seen.category == option.category)
        {
            unique.push(option);
        }
    }

    unique.sort_by(|a, b| {
        a.category
            .priority()
            .cmp(&b.category.priority())
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dictionary_category_thresholds() {
        use TranslationCategory::*;
        assert_eq!(TranslationCategory::from_dictionary(Some(0.95), 0), Primary);
        assert_eq!(TranslationCategory::from_dictionary(Some(0.95), 2), Synonym);
        assert_eq!(TranslationCategory::from_dictionary(Some(0.8), 0), Synonym);
        assert_eq!(TranslationCategory::from_dictionary(Some(0.6), 0), Alternative);
        assert_eq!(TranslationCategory::from_dictionary(Some(0.1), 0), Colloquial);
        assert_eq!(TranslationCategory::from_dictionary(None, 0), Primary);
        assert_eq!(TranslationCategory::from_dictionary(None, 2), Synonym);
        assert_eq!(TranslationCategory::from_dictionary(None, 3), Alternative);
    }

    #[test]
    fn test_rank_options_dedupes_and_orders() {
        use TranslationCategory::*;
        let ranked = rank_options(vec![
            TranslationOption::new("b", 0.4, Synonym),
            TranslationOption::new("a", 0.95, Primary),
            TranslationOption::new("c", 0.9, Synonym),
            TranslationOption::new("b", 0.1, Synonym),
            TranslationOption::new("d", 0.7, Alternative),
            TranslationOption::new("a", 0.8, Synonym),
        ]);

        let order: Vec<(&str, TranslationCategory)> =
            ranked.iter().map(|o| (o.text.as_str(), o.category)).collect();
        assert_eq!(
            order,
            vec![
                ("a", Primary),
                ("c", Synonym),
                ("a", Synonym),
                ("b", Synonym),
                ("d", Alternative),
            ]
        );
    }

    #[test]
    fn test_selection_parses_from_config_names() {
        let parsed: BackendSelection = serde_json::from_str("\"on_device\"").unwrap();
        assert_eq!(parsed, BackendSelection::OnDevice);
        assert_eq!(BackendSelection::default(), BackendSelection::Auto);
    }
}
