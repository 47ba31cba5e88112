//! `mwi-fetch` — bounded-concurrency HTTP fetch with archival fallback
//! (spec.md §4.3, §5).

pub mod archive;
pub mod fetcher;
pub mod types;

pub use archive::lookup_snapshot;
pub use fetcher::{cancel, fetch_batch, new_cancel_token, Fetcher};
pub use types::{FetchConfig, FetchResponse};
