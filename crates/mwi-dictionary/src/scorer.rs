//! Deterministic integer relevance scorer (spec.md §4.2, §8 property 2/5).

use std::collections::HashSet;

use mwi_core::Expression;

use crate::tokenize::tokenize;

const TITLE_WEIGHT: i64 = 10;
const BODY_WEIGHT: i64 = 1;

/// A Land's dictionary reduced to the set of distinct lemmas, the only shape
/// the scorer needs.
#[derive(Debug, Clone, Default)]
pub struct LemmaSet(HashSet<String>);

impl LemmaSet {
    #[must_use]
    pub fn new(lemmas: impl IntoIterator<Item = String>) -> Self {
        Self(lemmas.into_iter().collect())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The distinct lemmas as a sorted vec, for callers (e.g. the Relevance
    /// Gate prompt, spec.md §4.6) that need the dictionary's contents rather
    /// than just membership.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        let mut lemmas: Vec<String> = self.0.iter().cloned().collect();
        lemmas.sort();
        lemmas
    }

    fn contains(&self, lemma: &str) -> bool {
        self.0.contains(lemma)
    }
}

fn count_matches(tokens: &[String], dictionary: &LemmaSet) -> i64 {
    tokens.iter().filter(|t| dictionary.contains(t.as_str())).count() as i64
}

/// Whether an Expression's detected language excludes it from scoring: set
/// and not a case-insensitive prefix match against the Land language.
#[must_use]
pub fn language_excluded(expression_lang: Option<&str>, land_lang: &str) -> bool {
    match expression_lang {
        None => false,
        Some(lang) => {
            let lang = lang.to_ascii_lowercase();
            let land_lang = land_lang.to_ascii_lowercase();
            !lang.starts_with(&land_lang) && !land_lang.starts_with(&lang)
        }
    }
}

/// Score an Expression against a Land's lemma dictionary, applying a
/// pre-computed stemmer to both title and body tokens.
#[must_use]
pub fn score(
    expression: &Expression,
    land_lang: &str,
    dictionary: &LemmaSet,
    stem: impl Fn(&str) -> String,
) -> i64 {
    if dictionary.is_empty() {
        return 0;
    }
    if language_excluded(expression.lang.as_deref(), land_lang) {
        return 0;
    }

    let title_lemmas: Vec<String> = expression
        .title
        .as_deref()
        .map(tokenize)
        .unwrap_or_default()
        .into_iter()
        .map(|t| stem(&t))
        .collect();
    let body_lemmas: Vec<String> = expression
        .body_text_for_scoring()
        .map(tokenize)
        .unwrap_or_default()
        .into_iter()
        .map(|t| stem(&t))
        .collect();

    TITLE_WEIGHT * count_matches(&title_lemmas, dictionary)
        + BODY_WEIGHT * count_matches(&body_lemmas, dictionary)
}
