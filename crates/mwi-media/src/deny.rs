//! Ad/tracker/pixel deny-list (spec.md §4.7 step 1).

use regex::Regex;
use std::sync::OnceLock;

const DENY_PATTERNS: &[&str] = &[
    r"/ads?/",
    r"banner",
    r"tracking",
    r"pixel",
    r"beacon",
    r"analytics",
    r"doubleclick",
    r"googlesyndication",
    r"amazon-adsystem",
    r"facebook\.com/tr",
    r"google-analytics",
];

fn deny_regexes() -> &'static Vec<Regex> {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        DENY_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("deny pattern is static and valid"))
            .collect()
    })
}

/// Whether `url` matches any deny pattern (ads, trackers, 1x1 pixels).
#[must_use]
pub fn is_denied(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    deny_regexes().iter().any(|re| re.is_match(&lower))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_known_ad_and_tracker_hosts() {
        assert!(is_denied("https://doubleclick.net/ad.gif"));
        assert!(is_denied("https://example.com/pixel.png"));
        assert!(is_denied("https://googlesyndication.com/x.jpg"));
        assert!(is_denied("https://www.google-analytics.com/collect.gif"));
    }

    #[test]
    fn accepts_ordinary_content_images() {
        assert!(!is_denied("https://example.com/images/article-photo.jpg"));
        assert!(!is_denied("https://cdn.example.com/logo.png"));
    }
}
