use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use super::types::{TranslationCategory, TranslationOption};
use crate::constants::{
    ARTICLE_VARIATION_CONFIDENCE, CAPITALIZED_VARIATION_CONFIDENCE, FORMALITY_VARIATION_CONFIDENCE,
    LOWERCASE_VARIATION_CONFIDENCE,
};

/// (language, formal, informal)
const FORMALITY_PAIRS: &[(&str, &str, &str)] = &[
    ("en", "hello", "hi"),
    ("en", "goodbye", "bye"),
    ("en", "thank you", "thanks"),
    ("en", "please", "pls"),
    ("en", "you are", "you're"),
    ("en", "cannot", "can't"),
    ("en", "will not", "won't"),
    ("en", "should not", "shouldn't"),
    ("en", "would not", "wouldn't"),
    ("en", "do not", "don't"),
    ("uk", "дякую", "спасибі"),
    ("uk", "будь ласка", "будька"),
    ("uk", "добрий день", "привіт"),
    ("uk", "до побачення", "бувай"),
    ("uk", "вибачте", "сорі"),
    ("ru", "спасибо", "спс"),
    ("ru", "пожалуйста", "плз"),
    ("ru", "здравствуйте", "привет"),
    ("ru", "до свидания", "пока"),
];

struct FormalityRule {
    language: &'static str,
    formal: &'static str,
    informal: &'static str,
    formal_pattern: Regex,
    informal_pattern: Regex,
}

static FORMALITY_RULES: Lazy<Vec<FormalityRule>> = Lazy::new(|| {
    FORMALITY_PAIRS
        .iter()
        .map(|&(language, formal, informal)| FormalityRule {
            language,
            formal,
            informal,
            formal_pattern: case_insensitive(formal),
            informal_pattern: case_insensitive(informal),
        })
        .collect()
});

fn case_insensitive(literal: &str) -> Regex {
    Regex::new(&format!("(?i){}", regex::escape(literal))).expect("escaped literal is a valid pattern")
}

/// Casing, article and register variants of a primary translation
pub fn contextual_variations(primary: &str, target: &str) -> Vec<TranslationOption> {
    let mut variations = grammatical_variations(primary, target);
    variations.extend(formality_variations(primary, target));
    variations
}

fn grammatical_variations(text: &str, target: &str) -> Vec<TranslationOption> {
    let mut variations = Vec::new();
    let lowercased = text.to_lowercase();
    let capitalized = title_case(text);

    if lowercased != text {
        variations.push(TranslationOption::new(
            lowercased.clone(),
            LOWERCASE_VARIATION_CONFIDENCE,
            TranslationCategory::Informal,
        ));
    }
    if capitalized != text {
        variations.push(TranslationOption::new(
            capitalized,
            CAPITALIZED_VARIATION_CONFIDENCE,
            TranslationCategory::Formal,
        ));
    }

    if target == "en" && !["the ", "a ", "an "].iter().any(|article| lowercased.starts_with(article)) {
        let mut with_article = TranslationOption::new(
            format!("the {}", lowercased),
            ARTICLE_VARIATION_CONFIDENCE,
            TranslationCategory::Alternative,
        );
        with_article.part_of_speech = Some("noun".to_string());
        variations.push(with_article);
    }

    variations
}

fn formality_variations(text: &str, target: &str) -> Vec<TranslationOption> {
    let lowercased = text.to_lowercase();

    FORMALITY_RULES
        .iter()
        .filter(|rule| rule.language == target)
        .filter_map(|rule| {
            if lowercased.contains(rule.formal) {
                let informal = rule.formal_pattern.replace_all(text, NoExpand(rule.informal));
                Some(TranslationOption::new(
                    informal.into_owned(),
                    FORMALITY_VARIATION_CONFIDENCE,
                    TranslationCategory::Informal,
                ))
            } else if lowercased.contains(rule.informal) {
                let formal = rule.informal_pattern.replace_all(text, NoExpand(rule.formal));
                Some(TranslationOption::new(
                    formal.into_owned(),
                    FORMALITY_VARIATION_CONFIDENCE,
                    TranslationCategory::Formal,
                ))
            } else {
                None
            }
        })
        .collect()
}

/// Upper-case the first letter of every word, lower-case the rest
fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
