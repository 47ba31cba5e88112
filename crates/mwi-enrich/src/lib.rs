//! `mwi-enrich` — Domain homepage enrichment and host-normalization
//! heuristics (spec.md §4.9).

mod enricher;
mod heuristics;

pub use enricher::{DomainEnricher, EnrichStats};
pub use heuristics::{apply_heuristics, HeuristicRule, HeuristicStats};
