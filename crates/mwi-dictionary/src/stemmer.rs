//! Land-language-keyed stemming (spec.md §4.2, §9: "Stemmer interface with
//! at least French and English and an identity fallback").

use rust_stemmers::{Algorithm, Stemmer as SnowballStemmer};

use crate::tokenize::fold;

pub trait Stemmer: Send + Sync {
    fn stem(&self, token: &str) -> String;
}

pub struct FrenchStemmer(SnowballStemmer);

impl FrenchStemmer {
    #[must_use]
    pub fn new() -> Self {
        Self(SnowballStemmer::create(Algorithm::French))
    }
}

impl Default for FrenchStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stemmer for FrenchStemmer {
    fn stem(&self, token: &str) -> String {
        self.0.stem(token).into_owned()
    }
}

pub struct EnglishStemmer(SnowballStemmer);

impl EnglishStemmer {
    #[must_use]
    pub fn new() -> Self {
        Self(SnowballStemmer::create(Algorithm::English))
    }
}

impl Default for EnglishStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stemmer for EnglishStemmer {
    fn stem(&self, token: &str) -> String {
        self.0.stem(token).into_owned()
    }
}

/// No-op stemmer for languages without a dedicated algorithm: the lemma is
/// the folded token itself.
#[derive(Default)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem(&self, token: &str) -> String {
        fold(token)
    }
}

/// Select a stemmer by ISO-639-ish Land language code (prefix match, e.g.
/// `"fr"`, `"fr-FR"`, `"en-US"` all resolve to their two-letter family).
#[must_use]
pub fn stemmer_for_lang(lang: &str) -> Box<dyn Stemmer> {
    let prefix = lang.split(['-', '_']).next().unwrap_or(lang).to_ascii_lowercase();
    match prefix.as_str() {
        "fr" => Box::new(FrenchStemmer::new()),
        "en" => Box::new(EnglishStemmer::new()),
        _ => Box::new(IdentityStemmer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn french_stemmer_reduces_to_shared_lemma() {
        let stemmer = FrenchStemmer::new();
        assert_eq!(stemmer.stem("pollution"), stemmer.stem("pollutions"));
    }

    #[test]
    fn english_stemmer_reduces_plural() {
        let stemmer = EnglishStemmer::new();
        assert_eq!(stemmer.stem("emission"), stemmer.stem("emissions"));
    }

    #[test]
    fn identity_stemmer_only_folds() {
        let stemmer = IdentityStemmer;
        assert_eq!(stemmer.stem("École"), "ecole");
    }

    #[test]
    fn lang_selection_is_prefix_matched() {
        assert!(stemmer_for_lang("fr-FR").stem("pollutions") == stemmer_for_lang("fr").stem("pollutions"));
        let _ = stemmer_for_lang("de");
    }
}
