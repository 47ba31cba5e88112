//! `mwi-gate` — optional LLM yes/no relevance admission filter with a
//! process-wide call budget (spec.md §4.6).
//!
//! Never invoked by the bulk re-score path in `mwi-dictionary::rescore_land`
//! (spec.md §4.6, "MUST NOT be invoked by the bulk re-score path").

pub mod budget;
pub mod gate;

pub use budget::Budget;
pub use gate::{GateQuery, GateVerdict, RelevanceGate};
