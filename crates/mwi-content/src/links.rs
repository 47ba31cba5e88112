//! Outlink discovery, the crawlable predicate, and URL normalization
//! (spec.md §4.4 step 6, "Crawlable predicate").

use scraper::{Html, Selector};
use url::Url;

/// An anchor discovered on a page, resolved and normalized against the
/// page's own URL. Mirrors the `ExtractedLink` shape from the darkscraper
/// reference crawler, narrowed to the fields this engine persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    pub url: String,
}

/// Whether `url` may be crawled: parses, scheme is http/https, not
/// `mailto:`/`tel:`/`javascript:`/a data URI, and has a non-empty host.
#[must_use]
pub fn is_crawlable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
}

/// Strip the fragment and lower-case scheme/host, per spec.md §3 invariant 1.
#[must_use]
pub fn normalize(mut url: Url) -> Url {
    url.set_fragment(None);
    let scheme = url.scheme().to_ascii_lowercase();
    let _ = url.set_scheme(&scheme);
    if let Some(host) = url.host_str() {
        let lowered = host.to_ascii_lowercase();
        let _ = url.set_host(Some(&lowered));
    }
    url
}

/// Discover every crawlable anchor in `document`, resolved against
/// `base_url` and normalized. Non-crawlable or unresolvable hrefs are
/// silently dropped, matching spec.md §4.4's "Discover outlinks" contract.
pub fn discover_outlinks(document: &Html, base_url: &Url) -> Vec<ExtractedLink> {
    let selector = Selector::parse("a[href]").expect("static selector");
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base_url.join(href).ok())
        .map(normalize)
        .filter(is_crawlable)
        .map(|url| ExtractedLink { url: url.to_string() })
        .collect()
}
