//! Bulk re-score pass triggered by `land addterm` (SPEC_FULL.md §2).
//!
//! Re-runs the scorer over every Expression already stored in the Land
//! without invoking the Relevance Gate and without refetching or
//! rediscovering links/media — the Gate and the fetch/discovery pipeline are
//! both explicitly out of scope for this path.

use mwi_core::{Error, Land, Result};
use mwi_store::Store;

use crate::scorer::{score, LemmaSet};
use crate::stemmer::stemmer_for_lang;

#[derive(Debug, Default, Clone, Copy)]
pub struct RescoreStats {
    pub processed: u64,
    pub changed: u64,
}

/// Recompute relevance for every Expression in `land` against its current
/// dictionary, persisting only the Expressions whose score actually moved.
pub async fn rescore_land(store: &dyn Store, land: &Land) -> Result<RescoreStats> {
    let land_id = land.id.ok_or_else(|| Error::InvalidArgument("land has no id".into()))?;

    let words = store.land_dictionary(land_id).await.map_err(Error::from)?;
    let dictionary = LemmaSet::new(words.into_iter().map(|w| w.lemma));
    let stemmer = stemmer_for_lang(&land.lang);

    let expressions = store
        .list_expressions(land_id, None, None)
        .await
        .map_err(Error::from)?;

    let mut stats = RescoreStats::default();
    for mut expression in expressions {
        stats.processed += 1;
        let new_relevance = score(&expression, &land.lang, &dictionary, |t| stemmer.stem(t));
        if new_relevance != expression.relevance {
            expression.relevance = new_relevance;
            expression.approved_at = if new_relevance > 0 {
                Some(chrono::Utc::now())
            } else {
                None
            };
            store.save_expression(&expression).await.map_err(Error::from)?;
            stats.changed += 1;
        }
    }
    Ok(stats)
}
