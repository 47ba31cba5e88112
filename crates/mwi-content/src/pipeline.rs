//! The Content Pipeline operation (spec.md §4.4): parse, clean, extract
//! metadata and readable text, and discover outlinks/media. The link depth
//! cap gates outlink discovery only; media discovery follows `discover`
//! alone.

use url::Url;

use crate::clean::readable_text;
use crate::links::{discover_outlinks, ExtractedLink};
use crate::media::{discover_media, DiscoveredMedia};
use crate::metadata::{self, PageMetadata};

pub struct ProcessedPage {
    pub metadata: PageMetadata,
    pub readable: String,
    pub outlinks: Vec<ExtractedLink>,
    pub media: Vec<DiscoveredMedia>,
}

/// Run spec.md §4.4 steps 1-4 plus outlink/media discovery for a page at
/// `source_depth`. Outlink discovery is skipped once `source_depth >=
/// depth_cap` (step 6, "Link depth cap"); media discovery has no depth gate
/// and runs whenever `discover` is set. Callers apply the relevance
/// gate/score separately and only call this with discovery enabled when
/// `relevance > 0`.
pub fn process(html: &str, page_url: &str, source_depth: i32, depth_cap: i32, discover: bool) -> ProcessedPage {
    let document = scraper::Html::parse_document(html);
    let metadata = metadata::extract(&document);
    let readable = readable_text(&document);

    let base = if discover { Url::parse(page_url).ok() } else { None };
    let outlinks = match &base {
        Some(base) if source_depth < depth_cap => discover_outlinks(&document, base),
        _ => Vec::new(),
    };
    let media = match &base {
        Some(base) => discover_media(&document, base),
        None => Vec::new(),
    };

    ProcessedPage {
        metadata,
        readable,
        outlinks,
        media,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html lang="fr"><head><title>Asthme et pollution urbaine</title></head>
        <body><p>La pollution touche tout le monde.</p>
        <a href="/suite">suite</a>
        <img src="photo.jpg"></body></html>"#;

    #[test]
    fn discovers_links_and_media_below_depth_cap() {
        let processed = process(PAGE, "https://example.com/article", 0, 3, true);
        assert_eq!(processed.metadata.title.as_deref(), Some("Asthme et pollution urbaine"));
        assert!(processed.readable.contains("pollution"));
        assert_eq!(processed.outlinks.len(), 1);
        assert_eq!(processed.media.len(), 1);
    }

    #[test]
    fn skips_outlink_discovery_at_or_above_depth_cap_but_keeps_media() {
        let processed = process(PAGE, "https://example.com/article", 3, 3, true);
        assert!(processed.outlinks.is_empty());
        assert_eq!(processed.media.len(), 1);
    }

    #[test]
    fn skips_discovery_when_relevance_gate_rejected() {
        let processed = process(PAGE, "https://example.com/article", 0, 3, false);
        assert!(processed.outlinks.is_empty());
        assert!(processed.media.is_empty());
    }
}
