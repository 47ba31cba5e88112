//! `mwi-dictionary` — tokenization, stemming, and the deterministic integer
//! relevance scorer (spec.md §4.2).

pub mod rescore;
pub mod scorer;
pub mod stemmer;
pub mod tokenize;

pub use rescore::{rescore_land, RescoreStats};
pub use scorer::{language_excluded, score, LemmaSet};
pub use stemmer::{stemmer_for_lang, EnglishStemmer, FrenchStemmer, IdentityStemmer, Stemmer};
pub use tokenize::{fold, tokenize};
