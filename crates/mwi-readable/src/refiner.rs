//! Offline batched refining pass (spec.md §4.5).

use std::sync::Arc;
use std::time::Duration;

use mwi_core::{Error, ExpressionLink, Land, Media, MediaKind, Result};
use mwi_dictionary::{score, stemmer_for_lang, LemmaSet};
use mwi_store::Store;
use tracing::warn;
use url::Url;

use crate::extractor::{Extractor, ExtractorError};
use crate::merge::{merge, MergeStrategy};

const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

#[derive(Debug, Default, Clone, Copy)]
pub struct RefineStats {
    pub processed: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
}

pub struct Refiner {
    extractor: Arc<dyn Extractor>,
    retries: u32,
    batch_size: usize,
}

impl Refiner {
    #[must_use]
    pub fn new(extractor: Arc<dyn Extractor>, retries: u32, batch_size: usize) -> Self {
        Self {
            extractor,
            retries,
            batch_size,
        }
    }

    async fn extract_with_retry(&self, url: &str) -> std::result::Result<crate::extractor::ExtractedPage, ExtractorError> {
        let mut last_err = ExtractorError::Timeout;
        for attempt in 0..self.retries.max(1) {
            match self.extractor.extract(url).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    last_err = e;
                    if attempt + 1 < self.retries {
                        let delay = RETRY_DELAYS_SECS.get(attempt as usize).copied().unwrap_or(4);
                        tokio::time::sleep(Duration::from_secs(delay)).await;
                    }
                }
            }
        }
        Err(last_err)
    }

    /// Refine every Expression in `land` with `fetched_at` set, in batches of
    /// `self.batch_size`, applying `strategy`.
    pub async fn refine_land(&self, store: &dyn Store, land: &Land, strategy: MergeStrategy) -> Result<RefineStats> {
        let land_id = land.id.ok_or_else(|| Error::InvalidArgument("land has no id".into()))?;
        let words = store.land_dictionary(land_id).await.map_err(Error::from)?;
        let dictionary = LemmaSet::new(words.into_iter().map(|w| w.lemma));
        let stemmer = stemmer_for_lang(&land.lang);

        let expressions = store.list_expressions(land_id, None, None).await.map_err(Error::from)?;
        let fetched: Vec<_> = expressions.into_iter().filter(|e| e.fetched_at.is_some()).collect();

        let mut stats = RefineStats::default();
        for batch in fetched.chunks(self.batch_size.max(1)) {
            for expression in batch {
                stats.processed += 1;
                let mut expression = expression.clone();

                let extracted = match self.extract_with_retry(&expression.url).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!(url = %expression.url, error = %e, "readable extraction failed after retries");
                        stats.errors += 1;
                        continue;
                    }
                };

                let changed = merge(strategy, &mut expression, &extracted);
                if !changed {
                    stats.skipped += 1;
                    continue;
                }

                let new_relevance = score(&expression, &land.lang, &dictionary, |t| stemmer.stem(t));
                expression.relevance = new_relevance;
                expression.readable_at = Some(chrono::Utc::now());
                expression.approved_at = if new_relevance > 0 {
                    Some(chrono::Utc::now())
                } else {
                    None
                };
                store.save_expression(&expression).await.map_err(Error::from)?;

                self.harvest(store, &expression, &extracted).await?;
                stats.updated += 1;
            }
        }
        Ok(stats)
    }

    /// Harvest media, and, when the extractor supplied a non-empty link set,
    /// add any outbound links it found on top of existing edges (upserts are
    /// idempotent, so this never duplicates one). Existing edges are never
    /// deleted, so an empty extracted link set leaves prior edges untouched
    /// (spec.md §4.5 step 5 — link preservation is mandatory).
    async fn harvest(
        &self,
        store: &dyn Store,
        expression: &mwi_core::Expression,
        extracted: &crate::extractor::ExtractedPage,
    ) -> Result<()> {
        let expression_id = expression.id.ok_or_else(|| Error::Internal("expression has no id".into()))?;

        for image_url in extracted.images.iter().chain(extracted.lead_image.iter()) {
            let media = Media::new(expression_id, image_url.clone(), MediaKind::Img);
            store.upsert_media(media).await.map_err(Error::from)?;
        }

        if !extracted.outlinks.is_empty() {
            for raw in &extracted.outlinks {
                let Ok(target_url) = Url::parse(raw).or_else(|_| {
                    Url::parse(&expression.url).and_then(|base| base.join(raw))
                }) else {
                    continue;
                };
                if !mwi_content::is_crawlable(&target_url) {
                    continue;
                }
                let normalized = mwi_content::normalize(target_url);
                let mut discovered = mwi_core::Expression::seed(expression.land_id, normalized.to_string());
                discovered.depth = expression.depth + 1;
                let target = store.upsert_expression(discovered).await.map_err(Error::from)?;
                let target_id = target.id.ok_or_else(|| Error::Internal("target has no id".into()))?;
                store
                    .add_link(ExpressionLink {
                        source_id: expression_id,
                        target_id,
                    })
                    .await
                    .map_err(Error::from)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ExtractedPage;
    use async_trait::async_trait;
    use mwi_core::{Expression, Land};
    use mwi_store::SqliteStore;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::tempdir;

    struct StubExtractor {
        page: ExtractedPage,
        fail_times: AtomicU32,
    }

    #[async_trait]
    impl Extractor for StubExtractor {
        async fn extract(&self, _url: &str) -> std::result::Result<ExtractedPage, ExtractorError> {
            if self.fail_times.load(Ordering::SeqCst) > 0 {
                self.fail_times.fetch_sub(1, Ordering::SeqCst);
                return Err(ExtractorError::ProcessFailed("stub failure".into()));
            }
            Ok(self.page.clone())
        }
    }

    #[tokio::test]
    async fn refine_applies_smart_merge_and_sets_readable_at() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("mwi.db")).await.unwrap();
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        let land_id = land.id.unwrap();

        let mut seed = Expression::seed(land_id, "https://example.com/a");
        seed.title = Some("Short".into());
        seed.fetched_at = Some(chrono::Utc::now());
        let created = store.upsert_expression(seed).await.unwrap();
        store.save_expression(&created).await.unwrap();

        let extractor = Arc::new(StubExtractor {
            page: ExtractedPage {
                title: Some("Much Longer Title".into()),
                markdown: Some("new body".into()),
                ..Default::default()
            },
            fail_times: AtomicU32::new(0),
        });
        let refiner = Refiner::new(extractor, 3, 10);
        let stats = refiner.refine_land(&store, &land, MergeStrategy::SmartMerge).await.unwrap();

        assert_eq!(stats.processed, 1);
        assert_eq!(stats.updated, 1);

        let reloaded = store.get_expression(created.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(reloaded.title.as_deref(), Some("Much Longer Title"));
        assert_eq!(reloaded.readable.as_deref(), Some("new body"));
        assert!(reloaded.readable_at.is_some());
    }

    #[tokio::test]
    async fn refine_retries_before_giving_up() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("mwi.db")).await.unwrap();
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        let land_id = land.id.unwrap();

        let mut seed = Expression::seed(land_id, "https://example.com/a");
        seed.fetched_at = Some(chrono::Utc::now());
        store.upsert_expression(seed).await.unwrap();

        let extractor = Arc::new(StubExtractor {
            page: ExtractedPage {
                title: Some("Recovered".into()),
                ..Default::default()
            },
            fail_times: AtomicU32::new(2),
        });
        let refiner = Refiner::new(extractor, 3, 10);
        let stats = refiner.refine_land(&store, &land, MergeStrategy::SmartMerge).await.unwrap();
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.errors, 0);
    }
}
