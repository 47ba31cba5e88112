//! Consolidator (spec.md §4.8): rebuild derived Store state — relevance
//! score, outlinks, discovered media — from content already on disk,
//! without ever touching the network. Grounded on the same
//! parse-then-upsert shape as `mwi-readable::refiner`, minus the extractor
//! and HTTP legs.

use mwi_core::{Expression, ExpressionLink, Media, MediaKind};
use mwi_dictionary::{score, stemmer_for_lang, LemmaSet};
use mwi_store::{Store, StoreResult};
use url::Url;

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolidateStats {
    pub processed: usize,
    pub links_added: usize,
    pub media_added: usize,
    pub rescored: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolidateOptions {
    pub max_depth: Option<i32>,
    pub limit: Option<usize>,
}

/// Re-parse, re-discover, and re-score every fetched Expression in `land`.
/// Existing links and media are never deleted; discovery only ever adds.
pub async fn consolidate_land(
    store: &dyn Store,
    land: &mwi_core::Land,
    options: &ConsolidateOptions,
) -> StoreResult<ConsolidateStats> {
    let Some(land_id) = land.id else {
        return Ok(ConsolidateStats::default());
    };

    let dictionary = store.land_dictionary(land_id).await?;
    let lemmas = LemmaSet::new(dictionary.into_iter().map(|w| w.lemma));
    let stemmer = stemmer_for_lang(&land.lang);

    let mut expressions = store.list_expressions(land_id, None, None).await?;
    expressions.retain(|e| e.fetched_at.is_some());
    if let Some(max_depth) = options.max_depth {
        expressions.retain(|e| e.depth <= max_depth);
    }
    if let Some(limit) = options.limit {
        expressions.truncate(limit);
    }

    let mut stats = ConsolidateStats::default();
    for mut expression in expressions {
        let Some(expression_id) = expression.id else { continue };
        // Structural rediscovery needs markup to find anchors/img tags, so
        // prefer raw_html over the plain-text readable that scoring uses.
        let Some(body) = expression
            .raw_html
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(expression.readable.as_deref())
            .map(str::to_string)
        else {
            stats.processed += 1;
            continue;
        };

        let processed = mwi_content::process(&body, &expression.url, expression.depth, i32::MAX, true);

        let new_relevance = score(&expression, &land.lang, &lemmas, |t| stemmer.stem(t));
        if new_relevance != expression.relevance {
            stats.rescored += 1;
        }
        expression.relevance = new_relevance;
        expression.approved_at = if new_relevance > 0 { Some(chrono::Utc::now()) } else { None };
        store.save_expression(&expression).await?;

        for link in &processed.outlinks {
            let mut discovered = Expression::seed(land_id, link.url.clone());
            discovered.depth = expression.depth + 1;
            let target = store.upsert_expression(discovered).await?;
            let Some(target_id) = target.id else { continue };
            store
                .add_link(ExpressionLink {
                    source_id: expression_id,
                    target_id,
                })
                .await?;
            stats.links_added += 1;
        }

        for discovered in &processed.media {
            let kind = media_kind_for(&discovered.url);
            store
                .upsert_media(Media::new(expression_id, discovered.url.clone(), kind))
                .await?;
            stats.media_added += 1;
        }

        stats.processed += 1;
    }

    Ok(stats)
}

fn media_kind_for(url: &str) -> MediaKind {
    let lower = url.to_ascii_lowercase();
    let extension = Url::parse(&lower)
        .ok()
        .and_then(|u| u.path().rsplit('.').next().map(str::to_string))
        .unwrap_or_default();
    match extension.as_str() {
        "mp4" | "webm" | "mov" | "avi" => MediaKind::Video,
        "mp3" | "wav" | "ogg" | "flac" => MediaKind::Audio,
        _ => MediaKind::Img,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mwi_core::Land;
    use mwi_store::SqliteStore;

    async fn test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("t.db")).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn consolidate_discovers_links_and_media_without_refetching() {
        let (store, _dir) = test_store().await;
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();

        let mut expression = Expression::seed(land.id.unwrap(), "https://example.com/article");
        expression.fetched_at = Some(chrono::Utc::now());
        expression.readable = Some(
            r#"<html><body><p>pollution pollution</p>
               <a href="/suite">suite</a>
               <img src="photo.jpg"></body></html>"#
                .to_string(),
        );
        let expression = store.upsert_expression(expression).await.unwrap();

        let word = store.add_word_if_absent("pollution", "pollution").await.unwrap();
        store.link_land_word(land.id.unwrap(), word.id.unwrap()).await.unwrap();

        let stats = consolidate_land(&store, &land, &ConsolidateOptions::default())
            .await
            .unwrap();
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.links_added, 1);
        assert_eq!(stats.media_added, 1);

        let updated = store.get_expression(expression.id.unwrap()).await.unwrap().unwrap();
        assert!(updated.relevance > 0);
        assert!(updated.approved_at.is_some());
    }

    #[tokio::test]
    async fn consolidate_rediscovers_structure_from_raw_html_over_readable() {
        let (store, _dir) = test_store().await;
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();

        let mut expression = Expression::seed(land.id.unwrap(), "https://example.com/article");
        expression.fetched_at = Some(chrono::Utc::now());
        expression.raw_html = Some(
            r#"<html><body><p>pollution pollution</p>
               <a href="/suite">suite</a>
               <img src="photo.jpg"></body></html>"#
                .to_string(),
        );
        // readable holds only rendered plain text, no anchors/img tags.
        expression.readable = Some("pollution pollution suite".to_string());
        let expression = store.upsert_expression(expression).await.unwrap();

        let word = store.add_word_if_absent("pollution", "pollution").await.unwrap();
        store.link_land_word(land.id.unwrap(), word.id.unwrap()).await.unwrap();

        let stats = consolidate_land(&store, &land, &ConsolidateOptions::default())
            .await
            .unwrap();
        assert_eq!(stats.links_added, 1);
        assert_eq!(stats.media_added, 1);

        let outlinks = store.outlinks(expression.id.unwrap()).await.unwrap();
        assert_eq!(outlinks.len(), 1);
    }

    #[tokio::test]
    async fn consolidate_skips_expressions_never_fetched() {
        let (store, _dir) = test_store().await;
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        store
            .upsert_expression(Expression::seed(land.id.unwrap(), "https://example.com/unfetched"))
            .await
            .unwrap();

        let stats = consolidate_land(&store, &land, &ConsolidateOptions::default())
            .await
            .unwrap();
        assert_eq!(stats.processed, 0);
    }

    #[tokio::test]
    async fn depth_filter_excludes_deeper_expressions() {
        let (store, _dir) = test_store().await;
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        let mut deep = Expression::seed(land.id.unwrap(), "https://example.com/deep");
        deep.depth = 5;
        deep.fetched_at = Some(chrono::Utc::now());
        deep.readable = Some("<html><body>text</body></html>".to_string());
        store.upsert_expression(deep).await.unwrap();

        let stats = consolidate_land(
            &store,
            &land,
            &ConsolidateOptions {
                max_depth: Some(2),
                limit: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(stats.processed, 0);
    }
}
