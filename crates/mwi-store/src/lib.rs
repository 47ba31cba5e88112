//! `mwi-store` — SQLite-backed persistence for Lands, the term dictionary,
//! Expressions, link graph, Domains, and Media (spec.md §3, §4.1).

pub mod error;
pub mod retry;
pub mod schema;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{open_with_retry, SqliteStore, Store};

#[cfg(test)]
mod tests {
    use super::*;
    use mwi_core::{Domain, Expression, ExpressionLink, Land, Media, MediaKind};
    use tempfile::tempdir;

    async fn open_test_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mwi.db");
        let store = SqliteStore::open(&path).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn create_and_fetch_land() {
        let (_dir, store) = open_test_store().await;
        let created = store
            .create_land(Land::new("asthme", Some("air quality research".into()), None))
            .await
            .unwrap();
        assert!(created.id.is_some());

        let fetched = store.get_land("asthme").await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.lang, "fr");
    }

    #[tokio::test]
    async fn create_land_is_idempotent_on_name_conflict() {
        let (_dir, store) = open_test_store().await;
        let first = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        let second = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn list_lands_filters_by_name_substring() {
        let (_dir, store) = open_test_store().await;
        store.create_land(Land::new("asthme", None, None)).await.unwrap();
        store.create_land(Land::new("pollution", None, None)).await.unwrap();
        let matches = store.list_lands(Some("asth")).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "asthme");
    }

    #[tokio::test]
    async fn word_interning_is_idempotent() {
        let (_dir, store) = open_test_store().await;
        let a = store.add_word_if_absent("pollutions", "pollution").await.unwrap();
        let b = store.add_word_if_absent("pollutions", "pollution").await.unwrap();
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn land_dictionary_round_trips() {
        let (_dir, store) = open_test_store().await;
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        let word = store.add_word_if_absent("air", "air").await.unwrap();
        store.link_land_word(land.id.unwrap(), word.id.unwrap()).await.unwrap();
        let dict = store.land_dictionary(land.id.unwrap()).await.unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict[0].term, "air");
    }

    #[tokio::test]
    async fn expression_upsert_never_raises_depth() {
        let (_dir, store) = open_test_store().await;
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        let land_id = land.id.unwrap();

        let mut seed = Expression::seed(land_id, "https://example.com/a");
        seed.depth = 2;
        let first = store.upsert_expression(seed).await.unwrap();
        assert_eq!(first.depth, 2);

        let mut rediscovered = Expression::seed(land_id, "https://example.com/a");
        rediscovered.depth = 1;
        let second = store.upsert_expression(rediscovered).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.depth, 1);

        let mut deeper = Expression::seed(land_id, "https://example.com/a");
        deeper.depth = 5;
        let third = store.upsert_expression(deeper).await.unwrap();
        assert_eq!(third.depth, 1);
    }

    #[tokio::test]
    async fn save_expression_persists_relevance_and_timestamps() {
        let (_dir, store) = open_test_store().await;
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        let seed = Expression::seed(land.id.unwrap(), "https://example.com/a");
        let mut created = store.upsert_expression(seed).await.unwrap();

        created.relevance = 42;
        created.approved_at = Some(chrono::Utc::now());
        store.save_expression(&created).await.unwrap();

        let reloaded = store.get_expression(created.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(reloaded.relevance, 42);
        assert!(reloaded.approved_at.is_some());
    }

    #[tokio::test]
    async fn delete_expressions_respects_depth_filter() {
        let (_dir, store) = open_test_store().await;
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        let land_id = land.id.unwrap();

        let mut shallow = Expression::seed(land_id, "https://example.com/seed");
        shallow.depth = 0;
        store.upsert_expression(shallow).await.unwrap();

        let mut deep = Expression::seed(land_id, "https://example.com/deep");
        deep.depth = 4;
        store.upsert_expression(deep).await.unwrap();

        let deleted = store.delete_expressions(land_id, Some(3)).await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = store.list_expressions(land_id, None, None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].url, "https://example.com/seed");
    }

    #[tokio::test]
    async fn delete_expressions_below_relevance_keeps_relevant_rows() {
        let (_dir, store) = open_test_store().await;
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        let land_id = land.id.unwrap();

        let mut weak = store
            .upsert_expression(Expression::seed(land_id, "https://example.com/weak"))
            .await
            .unwrap();
        weak.relevance = 1;
        store.save_expression(&weak).await.unwrap();

        let mut strong = store
            .upsert_expression(Expression::seed(land_id, "https://example.com/strong"))
            .await
            .unwrap();
        strong.relevance = 50;
        store.save_expression(&strong).await.unwrap();

        let deleted = store.delete_expressions_below_relevance(land_id, 10).await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = store.list_expressions(land_id, None, None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].url, "https://example.com/strong");
    }

    #[tokio::test]
    async fn deleting_land_cascades_to_expressions() {
        let (_dir, store) = open_test_store().await;
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        let land_id = land.id.unwrap();
        let seed = Expression::seed(land_id, "https://example.com/a");
        let created = store.upsert_expression(seed).await.unwrap();

        store.delete_land(land_id).await.unwrap();

        assert!(store.get_expression(created.id.unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expression_links_are_deduplicated() {
        let (_dir, store) = open_test_store().await;
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        let land_id = land.id.unwrap();
        let a = store
            .upsert_expression(Expression::seed(land_id, "https://example.com/a"))
            .await
            .unwrap();
        let b = store
            .upsert_expression(Expression::seed(land_id, "https://example.com/b"))
            .await
            .unwrap();

        let link = ExpressionLink {
            source_id: a.id.unwrap(),
            target_id: b.id.unwrap(),
        };
        store.add_link(link).await.unwrap();
        store.add_link(link).await.unwrap();

        let outlinks = store.outlinks(a.id.unwrap()).await.unwrap();
        assert_eq!(outlinks, vec![b.id.unwrap()]);
    }

    #[tokio::test]
    async fn domain_interning_is_idempotent_and_savable() {
        let (_dir, store) = open_test_store().await;
        let first = store.get_or_create_domain("example.com").await.unwrap();
        let second = store.get_or_create_domain("example.com").await.unwrap();
        assert_eq!(first.id, second.id);

        let mut domain: Domain = first;
        domain.title = Some("Example".into());
        store.save_domain(&domain).await.unwrap();

        let reloaded = store.get_or_create_domain("example.com").await.unwrap();
        assert_eq!(reloaded.title.as_deref(), Some("Example"));
    }

    #[tokio::test]
    async fn media_upsert_and_analysis_round_trip() {
        let (_dir, store) = open_test_store().await;
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();
        let expr = store
            .upsert_expression(Expression::seed(land.id.unwrap(), "https://example.com/a"))
            .await
            .unwrap();

        let media = Media::new(expr.id.unwrap(), "https://example.com/a.png", MediaKind::Img);
        let mut created = store.upsert_media(media).await.unwrap();
        created.width = Some(640);
        created.height = Some(480);
        created.perceptual_hash = Some("abc123".into());
        store.save_media(&created).await.unwrap();

        let list = store.media_for_expression(expr.id.unwrap()).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].width, Some(640));
        assert_eq!(list[0].perceptual_hash.as_deref(), Some("abc123"));

        store.delete_media(list[0].id.unwrap()).await.unwrap();
        assert!(store.media_for_expression(expr.id.unwrap()).await.unwrap().is_empty());
    }
}
