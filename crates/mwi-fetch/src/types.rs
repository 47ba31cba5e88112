//! Fetch request/response shapes (spec.md §4.3), grounded on the
//! `FetchConfig`/`FetchResponse` pair from the darkscraper reference crawler,
//! narrowed to the single HTTP(S) network this engine targets.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub follow_redirects: bool,
}

impl FetchConfig {
    #[must_use]
    pub fn from_core(cfg: &mwi_core::Config) -> Self {
        Self {
            timeout: Duration::from_secs(cfg.fetch_timeout_secs),
            user_agent: cfg.fetch_user_agent.clone(),
            follow_redirects: true,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "MyWebIntelligence/1.0".to_string(),
            follow_redirects: true,
        }
    }
}

/// Outcome of one `fetch(url)` call (spec.md §4.3 step 2/4): a definitive
/// HTTP status (or `"000"` for a fetch that never reached the network) plus
/// the body when one was obtained, and the URL the body actually came from
/// (the archive snapshot URL on fallback, otherwise the requested URL).
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub requested_url: String,
    pub final_url: String,
    pub status: String,
    pub body: Option<String>,
    pub from_archive: bool,
}

impl FetchResponse {
    #[must_use]
    pub fn failed(url: &str) -> Self {
        Self {
            requested_url: url.to_string(),
            final_url: url.to_string(),
            status: "000".to_string(),
            body: None,
            from_archive: false,
        }
    }

    #[must_use]
    pub fn is_html_success(&self) -> bool {
        self.body.is_some() && self.status.starts_with('2')
    }
}
