//! `mwi-readable` — external extractor contract, merge strategies, and the
//! batched offline refining pass (spec.md §4.5).

pub mod extractor;
pub mod merge;
pub mod refiner;

pub use extractor::{ExtractedPage, Extractor, ExtractorError};
pub use merge::{merge as merge_fields, MergeStrategy};
pub use refiner::{RefineStats, Refiner};
