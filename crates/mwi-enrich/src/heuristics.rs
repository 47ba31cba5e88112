//! Host-normalization heuristics (spec.md §4.9): an ordered list of regex
//! rules mapping a matching host family to its canonical form, applied to
//! every Expression's URL to re-key its Domain reference. An offline
//! rewrite — it never touches page content.

use regex::Regex;
use url::Url;

use mwi_core::Error;
use mwi_store::{Store, StoreResult};

pub struct HeuristicRule {
    pattern: Regex,
    canonical_host: String,
}

impl HeuristicRule {
    /// Parse a `pattern=>canonical_host` rule line, e.g.
    /// `^m\.facebook\.com$=>facebook.com`.
    pub fn from_str(line: &str) -> mwi_core::Result<Self> {
        let (pattern, canonical_host) = line
            .split_once("=>")
            .ok_or_else(|| Error::InvalidArgument(format!("malformed heuristic rule: {line}")))?;
        let pattern = Regex::new(pattern.trim())
            .map_err(|e| Error::InvalidArgument(format!("bad heuristic regex {pattern}: {e}")))?;
        Ok(Self {
            pattern,
            canonical_host: canonical_host.trim().to_string(),
        })
    }

    /// The baseline rule set shipped with the engine, covering the mobile
    /// and AMP subdomain families most research crawls encounter.
    #[must_use]
    pub fn default_rules() -> Vec<Self> {
        [
            (r"^m\.facebook\.com$", "facebook.com"),
            (r"^mobile\.twitter\.com$", "twitter.com"),
            (r"^m\.twitter\.com$", "twitter.com"),
            (r"^amp\.(.+)$", "$1"),
            (r"^www\.(.+)$", "$1"),
        ]
        .into_iter()
        .map(|(pattern, canonical)| Self {
            pattern: Regex::new(pattern).expect("baked-in heuristic pattern is valid"),
            canonical_host: canonical.to_string(),
        })
        .collect()
    }

    fn apply(&self, host: &str) -> Option<String> {
        if self.pattern.is_match(host) {
            Some(self.pattern.replace(host, self.canonical_host.as_str()).into_owned())
        } else {
            None
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicStats {
    pub processed: usize,
    pub rekeyed: usize,
}

/// Apply `rules` in order to every Expression's URL in `land`, re-keying the
/// Domain reference to the first matching canonical host.
pub async fn apply_heuristics(
    store: &dyn Store,
    land: &mwi_core::Land,
    rules: &[HeuristicRule],
) -> StoreResult<HeuristicStats> {
    let Some(land_id) = land.id else {
        return Ok(HeuristicStats::default());
    };
    let expressions = store.list_expressions(land_id, None, None).await?;

    let mut stats = HeuristicStats::default();
    for mut expression in expressions {
        stats.processed += 1;
        let Ok(url) = Url::parse(&expression.url) else { continue };
        let Some(host) = url.host_str() else { continue };

        let Some(canonical) = rules.iter().find_map(|rule| rule.apply(host)) else {
            continue;
        };
        if canonical == host {
            continue;
        }

        let domain = store.get_or_create_domain(&canonical).await?;
        expression.domain_id = domain.id;
        store.save_expression(&expression).await?;
        stats.rekeyed += 1;
    }
    Ok(stats)
}
