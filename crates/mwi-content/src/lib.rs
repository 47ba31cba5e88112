//! `mwi-content` — HTML cleaning, metadata/readable extraction, and
//! outlink/media discovery (spec.md §4.4).

pub mod clean;
pub mod links;
pub mod media;
pub mod metadata;
pub mod pipeline;

pub use clean::{readable_text, DENYLIST};
pub use links::{discover_outlinks, is_crawlable, normalize, ExtractedLink};
pub use media::{discover_media, DiscoveredMedia};
pub use metadata::{extract as extract_metadata, PageMetadata};
pub use pipeline::{process, ProcessedPage};
