//! Async `Store` trait and its SQLite implementation (spec.md §4.1).
//!
//! Grounded on the teacher's `mcp-agent-mail-db::queries` module: plain
//! `sqlx::query`/`query_as` (no compile-time `query!` macro, since the
//! database is created at runtime rather than checked against a fixture at
//! build time), and the select-then-insert-then-reselect-on-conflict pattern
//! from `queries::ensure_project` for every idempotent upsert.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mwi_core::{Domain, Expression, ExpressionLink, Land, Media, MediaKind, Word};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::error::{StoreError, StoreResult};
use crate::retry::{backoff_delay, is_lock_contention, CircuitBreaker};
use crate::schema::SCHEMA_SQL;

/// Persistence operations required by the crawl engine (spec.md §4.1).
///
/// Every write that can race against a concurrent worker on the same batch
/// (word interning, domain interning, expression upsert) must be idempotent:
/// callers may call these concurrently across the `P`-wide worker pool and
/// expect a single winning row rather than a duplicate-key error.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_land(&self, name: &str) -> StoreResult<Option<Land>>;
    async fn get_land_by_id(&self, id: i64) -> StoreResult<Option<Land>>;
    async fn list_lands(&self, name_filter: Option<&str>) -> StoreResult<Vec<Land>>;
    async fn create_land(&self, land: Land) -> StoreResult<Land>;
    async fn delete_land(&self, land_id: i64) -> StoreResult<()>;

    async fn add_word_if_absent(&self, term: &str, lemma: &str) -> StoreResult<Word>;
    async fn link_land_word(&self, land_id: i64, word_id: i64) -> StoreResult<()>;
    async fn unlink_land_word(&self, land_id: i64, word_id: i64) -> StoreResult<()>;
    async fn land_dictionary(&self, land_id: i64) -> StoreResult<Vec<Word>>;

    async fn get_or_create_domain(&self, host: &str) -> StoreResult<Domain>;
    async fn save_domain(&self, domain: &Domain) -> StoreResult<()>;

    /// Insert the Expression if its `(land_id, url)` pair is new, otherwise
    /// return the existing row untouched. Used for link/seed discovery where
    /// the caller must never clobber a row another worker just wrote.
    async fn upsert_expression(&self, expression: Expression) -> StoreResult<Expression>;
    async fn get_expression(&self, id: i64) -> StoreResult<Option<Expression>>;
    async fn get_expression_by_url(&self, land_id: i64, url: &str) -> StoreResult<Option<Expression>>;
    /// Full overwrite of a previously-upserted Expression's mutable fields.
    async fn save_expression(&self, expression: &Expression) -> StoreResult<()>;
    async fn list_expressions(
        &self,
        land_id: i64,
        min_relevance: Option<i64>,
        http_status: Option<&str>,
    ) -> StoreResult<Vec<Expression>>;
    async fn delete_expressions(&self, land_id: i64, max_depth: Option<i32>) -> StoreResult<u64>;
    /// Delete every Expression in `land_id` whose `relevance` is strictly
    /// below `max_relevance` (the `land delete --maxrel` verb, spec.md §6).
    async fn delete_expressions_below_relevance(&self, land_id: i64, max_relevance: i64) -> StoreResult<u64>;

    async fn add_link(&self, link: ExpressionLink) -> StoreResult<()>;
    async fn outlinks(&self, source_id: i64) -> StoreResult<Vec<i64>>;

    async fn upsert_media(&self, media: Media) -> StoreResult<Media>;
    async fn save_media(&self, media: &Media) -> StoreResult<()>;
    async fn delete_media(&self, media_id: i64) -> StoreResult<()>;
    async fn media_for_expression(&self, expression_id: i64) -> StoreResult<Vec<Media>>;
}

pub struct SqliteStore {
    pool: SqlitePool,
    breaker: CircuitBreaker,
}

impl SqliteStore {
    /// Open (creating if absent) the database at `path` with WAL journaling
    /// and apply the embedded schema.
    pub async fn open(path: &std::path::Path) -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(16)
            .connect_with(options)
            .await
            .map_err(StoreError::from)?;

        let store = Self {
            pool,
            breaker: CircuitBreaker::new(),
        };
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn run_migrations(&self) -> StoreResult<()> {
        for statement in SCHEMA_SQL.split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Migration(e.to_string()))?;
        }
        Ok(())
    }

    /// Run `op` with retry-on-lock-contention and circuit breaking, mirroring
    /// the teacher's `db::retry` wrapper around every write.
    async fn with_retry<T, F, Fut>(&self, mut op: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = StoreResult<T>>,
    {
        use crate::retry::CircuitState;

        if self.breaker.state() == CircuitState::Open {
            return Err(StoreError::CircuitOpen);
        }

        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => {
                    self.breaker.record_success();
                    return Ok(value);
                }
                Err(StoreError::Sqlite(msg)) if is_lock_contention(&msg) && attempt < 5 => {
                    self.breaker.record_failure();
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn row_to_land(row: &SqliteRow) -> StoreResult<Land> {
        Ok(Land {
            id: Some(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            lang: row.try_get("lang")?,
            created_at: parse_ts(row.try_get("created_at")?)?,
        })
    }

    fn row_to_word(row: &SqliteRow) -> StoreResult<Word> {
        Ok(Word {
            id: Some(row.try_get("id")?),
            term: row.try_get("term")?,
            lemma: row.try_get("lemma")?,
        })
    }

    fn row_to_domain(row: &SqliteRow) -> StoreResult<Domain> {
        Ok(Domain {
            id: Some(row.try_get("id")?),
            host: row.try_get("host")?,
            fetched_at: opt_ts(row.try_get("fetched_at")?)?,
            http_status: row.try_get("http_status")?,
            title: row.try_get("title")?,
            keywords: row.try_get("keywords")?,
            description: row.try_get("description")?,
        })
    }

    fn row_to_expression(row: &SqliteRow) -> StoreResult<Expression> {
        Ok(Expression {
            id: Some(row.try_get("id")?),
            land_id: row.try_get("land_id")?,
            url: row.try_get("url")?,
            depth: row.try_get("depth")?,
            lang: row.try_get("lang")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            keywords: row.try_get("keywords")?,
            author: row.try_get("author")?,
            published_at: opt_ts(row.try_get("published_at")?)?,
            raw_html: row.try_get("raw_html")?,
            readable: row.try_get("readable")?,
            relevance: row.try_get::<Option<i64>, _>("relevance")?.unwrap_or(0),
            domain_id: row.try_get("domain_id")?,
            http_status: row.try_get("http_status")?,
            created_at: parse_ts(row.try_get("created_at")?)?,
            fetched_at: opt_ts(row.try_get("fetched_at")?)?,
            approved_at: opt_ts(row.try_get("approved_at")?)?,
            readable_at: opt_ts(row.try_get("readable_at")?)?,
        })
    }

    fn row_to_media(row: &SqliteRow) -> StoreResult<Media> {
        let kind_str: String = row.try_get("kind")?;
        let kind = match kind_str.as_str() {
            "img" => MediaKind::Img,
            "video" => MediaKind::Video,
            "audio" => MediaKind::Audio,
            other => return Err(StoreError::Sqlite(format!("unknown media kind {other}"))),
        };
        let dominant_colors_json: Option<String> = row.try_get("dominant_colors")?;
        let exif_json: Option<String> = row.try_get("exif")?;
        let palette_json: Option<String> = row.try_get("web_safe_palette")?;
        let tags_json: Option<String> = row.try_get("content_tags")?;

        Ok(Media {
            id: Some(row.try_get("id")?),
            expression_id: row.try_get("expression_id")?,
            url: row.try_get("url")?,
            kind,
            width: row.try_get::<Option<i64>, _>("width")?.map(|v| v as u32),
            height: row.try_get::<Option<i64>, _>("height")?.map(|v| v as u32),
            file_size: row.try_get::<Option<i64>, _>("file_size")?.map(|v| v as u64),
            format: row.try_get("format")?,
            color_mode: row.try_get("color_mode")?,
            dominant_colors: dominant_colors_json
                .map(|s| serde_json::from_str(&s))
                .transpose()
                .map_err(|e: serde_json::Error| StoreError::Sqlite(e.to_string()))?
                .unwrap_or_default(),
            aspect_ratio: row.try_get::<Option<f64>, _>("aspect_ratio")?.map(|v| v as f32),
            has_transparency: row.try_get::<Option<i64>, _>("has_transparency")?.map(|v| v != 0),
            exif: exif_json
                .map(|s| serde_json::from_str(&s))
                .transpose()
                .map_err(|e: serde_json::Error| StoreError::Sqlite(e.to_string()))?
                .unwrap_or_default(),
            perceptual_hash: row.try_get("perceptual_hash")?,
            web_safe_palette: palette_json
                .map(|s| serde_json::from_str(&s))
                .transpose()
                .map_err(|e: serde_json::Error| StoreError::Sqlite(e.to_string()))?
                .unwrap_or_default(),
            content_tags: tags_json
                .map(|s| serde_json::from_str(&s))
                .transpose()
                .map_err(|e: serde_json::Error| StoreError::Sqlite(e.to_string()))?
                .unwrap_or_default(),
            nsfw_score: row.try_get::<Option<f64>, _>("nsfw_score")?.map(|v| v as f32),
            analyzed_at: opt_ts(row.try_get("analyzed_at")?)?,
            analysis_error: row.try_get("analysis_error")?,
        })
    }
}

fn parse_ts(raw: String) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Sqlite(format!("bad timestamp {raw}: {e}")))
}

fn opt_ts(raw: Option<String>) -> StoreResult<Option<DateTime<Utc>>> {
    raw.map(parse_ts).transpose()
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_land(&self, name: &str) -> StoreResult<Option<Land>> {
        let row = sqlx::query("SELECT * FROM land WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_land).transpose()
    }

    async fn get_land_by_id(&self, id: i64) -> StoreResult<Option<Land>> {
        let row = sqlx::query("SELECT * FROM land WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_land).transpose()
    }

    async fn list_lands(&self, name_filter: Option<&str>) -> StoreResult<Vec<Land>> {
        let rows = match name_filter {
            Some(pattern) => {
                sqlx::query("SELECT * FROM land WHERE name LIKE ?1 ORDER BY name")
                    .bind(format!("%{pattern}%"))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM land ORDER BY name")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(Self::row_to_land).collect()
    }

    async fn create_land(&self, land: Land) -> StoreResult<Land> {
        self.with_retry(|| async {
            let result = sqlx::query(
                "INSERT INTO land (name, description, lang, created_at) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&land.name)
            .bind(land.description.as_deref().unwrap_or(""))
            .bind(&land.lang)
            .bind(land.created_at.to_rfc3339())
            .execute(&self.pool)
            .await;

            match result {
                Ok(res) => {
                    let mut created = land.clone();
                    created.id = Some(res.last_insert_rowid());
                    Ok(created)
                }
                Err(e) => {
                    let store_err = StoreError::from(e);
                    if matches!(store_err, StoreError::Conflict { .. }) {
                        self.get_land(&land.name)
                            .await?
                            .ok_or_else(|| StoreError::NotFound(land.name.clone()))
                    } else {
                        Err(store_err)
                    }
                }
            }
        })
        .await
    }

    async fn delete_land(&self, land_id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM land WHERE id = ?1")
            .bind(land_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_word_if_absent(&self, term: &str, lemma: &str) -> StoreResult<Word> {
        self.with_retry(|| async {
            let existing = sqlx::query("SELECT * FROM word WHERE term = ?1 AND lemma = ?2")
                .bind(term)
                .bind(lemma)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(row) = existing {
                return Self::row_to_word(&row);
            }

            let result = sqlx::query("INSERT INTO word (term, lemma) VALUES (?1, ?2)")
                .bind(term)
                .bind(lemma)
                .execute(&self.pool)
                .await;

            match result {
                Ok(res) => Ok(Word {
                    id: Some(res.last_insert_rowid()),
                    term: term.to_string(),
                    lemma: lemma.to_string(),
                }),
                Err(e) => {
                    let store_err = StoreError::from(e);
                    if matches!(store_err, StoreError::Conflict { .. }) {
                        let row = sqlx::query("SELECT * FROM word WHERE term = ?1 AND lemma = ?2")
                            .bind(term)
                            .bind(lemma)
                            .fetch_one(&self.pool)
                            .await?;
                        Self::row_to_word(&row)
                    } else {
                        Err(store_err)
                    }
                }
            }
        })
        .await
    }

    async fn link_land_word(&self, land_id: i64, word_id: i64) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO land_dictionary (land_id, word_id) VALUES (?1, ?2)
             ON CONFLICT (land_id, word_id) DO NOTHING",
        )
        .bind(land_id)
        .bind(word_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unlink_land_word(&self, land_id: i64, word_id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM land_dictionary WHERE land_id = ?1 AND word_id = ?2")
            .bind(land_id)
            .bind(word_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn land_dictionary(&self, land_id: i64) -> StoreResult<Vec<Word>> {
        let rows = sqlx::query(
            "SELECT w.* FROM word w
             JOIN land_dictionary ld ON ld.word_id = w.id
             WHERE ld.land_id = ?1",
        )
        .bind(land_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_word).collect()
    }

    async fn get_or_create_domain(&self, host: &str) -> StoreResult<Domain> {
        self.with_retry(|| async {
            let existing = sqlx::query("SELECT * FROM domain WHERE host = ?1")
                .bind(host)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(row) = existing {
                return Self::row_to_domain(&row);
            }

            let result = sqlx::query("INSERT INTO domain (host) VALUES (?1)")
                .bind(host)
                .execute(&self.pool)
                .await;

            match result {
                Ok(res) => {
                    let mut domain = Domain::new(host);
                    domain.id = Some(res.last_insert_rowid());
                    Ok(domain)
                }
                Err(e) => {
                    let store_err = StoreError::from(e);
                    if matches!(store_err, StoreError::Conflict { .. }) {
                        let row = sqlx::query("SELECT * FROM domain WHERE host = ?1")
                            .bind(host)
                            .fetch_one(&self.pool)
                            .await?;
                        Self::row_to_domain(&row)
                    } else {
                        Err(store_err)
                    }
                }
            }
        })
        .await
    }

    async fn save_domain(&self, domain: &Domain) -> StoreResult<()> {
        let Some(id) = domain.id else {
            return Err(StoreError::NotFound("domain has no id".to_string()));
        };
        sqlx::query(
            "UPDATE domain SET fetched_at = ?1, http_status = ?2, title = ?3,
             keywords = ?4, description = ?5 WHERE id = ?6",
        )
        .bind(domain.fetched_at.map(|t| t.to_rfc3339()))
        .bind(&domain.http_status)
        .bind(&domain.title)
        .bind(&domain.keywords)
        .bind(&domain.description)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_expression(&self, expression: Expression) -> StoreResult<Expression> {
        self.with_retry(|| async {
            let existing = sqlx::query("SELECT * FROM expression WHERE land_id = ?1 AND url = ?2")
                .bind(expression.land_id)
                .bind(&expression.url)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(row) = existing {
                let mut current = Self::row_to_expression(&row)?;
                // Depth only ever decreases toward a seed, never increases.
                if expression.depth < current.depth {
                    current.depth = expression.depth;
                    self.save_expression(&current).await?;
                }
                return Ok(current);
            }

            let result = sqlx::query(
                "INSERT INTO expression (land_id, url, depth, created_at, relevance)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(expression.land_id)
            .bind(&expression.url)
            .bind(expression.depth)
            .bind(expression.created_at.to_rfc3339())
            .bind(expression.relevance)
            .execute(&self.pool)
            .await;

            match result {
                Ok(res) => {
                    let mut created = expression.clone();
                    created.id = Some(res.last_insert_rowid());
                    Ok(created)
                }
                Err(e) => {
                    let store_err = StoreError::from(e);
                    if matches!(store_err, StoreError::Conflict { .. }) {
                        let row =
                            sqlx::query("SELECT * FROM expression WHERE land_id = ?1 AND url = ?2")
                                .bind(expression.land_id)
                                .bind(&expression.url)
                                .fetch_one(&self.pool)
                                .await?;
                        Self::row_to_expression(&row)
                    } else {
                        Err(store_err)
                    }
                }
            }
        })
        .await
    }

    async fn get_expression(&self, id: i64) -> StoreResult<Option<Expression>> {
        let row = sqlx::query("SELECT * FROM expression WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_expression).transpose()
    }

    async fn get_expression_by_url(
        &self,
        land_id: i64,
        url: &str,
    ) -> StoreResult<Option<Expression>> {
        let row = sqlx::query("SELECT * FROM expression WHERE land_id = ?1 AND url = ?2")
            .bind(land_id)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_expression).transpose()
    }

    async fn save_expression(&self, expression: &Expression) -> StoreResult<()> {
        let Some(id) = expression.id else {
            return Err(StoreError::NotFound("expression has no id".to_string()));
        };
        sqlx::query(
            "UPDATE expression SET depth = ?1, lang = ?2, title = ?3, description = ?4,
             keywords = ?5, author = ?6, published_at = ?7, raw_html = ?8, readable = ?9,
             relevance = ?10, domain_id = ?11, http_status = ?12, fetched_at = ?13,
             approved_at = ?14, readable_at = ?15 WHERE id = ?16",
        )
        .bind(expression.depth)
        .bind(&expression.lang)
        .bind(&expression.title)
        .bind(&expression.description)
        .bind(&expression.keywords)
        .bind(&expression.author)
        .bind(expression.published_at.map(|t| t.to_rfc3339()))
        .bind(&expression.raw_html)
        .bind(&expression.readable)
        .bind(expression.relevance)
        .bind(expression.domain_id)
        .bind(&expression.http_status)
        .bind(expression.fetched_at.map(|t| t.to_rfc3339()))
        .bind(expression.approved_at.map(|t| t.to_rfc3339()))
        .bind(expression.readable_at.map(|t| t.to_rfc3339()))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_expressions(
        &self,
        land_id: i64,
        min_relevance: Option<i64>,
        http_status: Option<&str>,
    ) -> StoreResult<Vec<Expression>> {
        let rows = sqlx::query(
            "SELECT * FROM expression WHERE land_id = ?1
             AND (?2 IS NULL OR relevance >= ?2)
             AND (?3 IS NULL OR http_status = ?3)
             ORDER BY id",
        )
        .bind(land_id)
        .bind(min_relevance)
        .bind(http_status)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_expression).collect()
    }

    async fn delete_expressions(&self, land_id: i64, max_depth: Option<i32>) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM expression WHERE land_id = ?1 AND (?2 IS NULL OR depth > ?2)",
        )
        .bind(land_id)
        .bind(max_depth)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_expressions_below_relevance(&self, land_id: i64, max_relevance: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM expression WHERE land_id = ?1 AND relevance < ?2")
            .bind(land_id)
            .bind(max_relevance)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn add_link(&self, link: ExpressionLink) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO expression_link (source_id, target_id) VALUES (?1, ?2)
             ON CONFLICT (source_id, target_id) DO NOTHING",
        )
        .bind(link.source_id)
        .bind(link.target_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn outlinks(&self, source_id: i64) -> StoreResult<Vec<i64>> {
        let rows = sqlx::query("SELECT target_id FROM expression_link WHERE source_id = ?1")
            .bind(source_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| r.try_get::<i64, _>("target_id").map_err(StoreError::from))
            .collect()
    }

    async fn upsert_media(&self, media: Media) -> StoreResult<Media> {
        self.with_retry(|| async {
            let existing = sqlx::query("SELECT * FROM media WHERE expression_id = ?1 AND url = ?2")
                .bind(media.expression_id)
                .bind(&media.url)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(row) = existing {
                return Self::row_to_media(&row);
            }

            let result = sqlx::query(
                "INSERT INTO media (expression_id, url, kind) VALUES (?1, ?2, ?3)",
            )
            .bind(media.expression_id)
            .bind(&media.url)
            .bind(media.kind.to_string())
            .execute(&self.pool)
            .await;

            match result {
                Ok(res) => {
                    let mut created = media.clone();
                    created.id = Some(res.last_insert_rowid());
                    Ok(created)
                }
                Err(e) => {
                    let store_err = StoreError::from(e);
                    if matches!(store_err, StoreError::Conflict { .. }) {
                        let row =
                            sqlx::query("SELECT * FROM media WHERE expression_id = ?1 AND url = ?2")
                                .bind(media.expression_id)
                                .bind(&media.url)
                                .fetch_one(&self.pool)
                                .await?;
                        Self::row_to_media(&row)
                    } else {
                        Err(store_err)
                    }
                }
            }
        })
        .await
    }

    async fn save_media(&self, media: &Media) -> StoreResult<()> {
        let Some(id) = media.id else {
            return Err(StoreError::NotFound("media has no id".to_string()));
        };
        let dominant_colors = serde_json::to_string(&media.dominant_colors)
            .map_err(|e| StoreError::Sqlite(e.to_string()))?;
        let exif = serde_json::to_string(&media.exif).map_err(|e| StoreError::Sqlite(e.to_string()))?;
        let palette = serde_json::to_string(&media.web_safe_palette)
            .map_err(|e| StoreError::Sqlite(e.to_string()))?;
        let tags = serde_json::to_string(&media.content_tags)
            .map_err(|e| StoreError::Sqlite(e.to_string()))?;

        sqlx::query(
            "UPDATE media SET width = ?1, height = ?2, file_size = ?3, format = ?4,
             color_mode = ?5, dominant_colors = ?6, aspect_ratio = ?7, has_transparency = ?8,
             exif = ?9, perceptual_hash = ?10, web_safe_palette = ?11, content_tags = ?12,
             nsfw_score = ?13, analyzed_at = ?14, analysis_error = ?15 WHERE id = ?16",
        )
        .bind(media.width)
        .bind(media.height)
        .bind(media.file_size.map(|v| v as i64))
        .bind(&media.format)
        .bind(&media.color_mode)
        .bind(dominant_colors)
        .bind(media.aspect_ratio)
        .bind(media.has_transparency)
        .bind(exif)
        .bind(&media.perceptual_hash)
        .bind(palette)
        .bind(tags)
        .bind(media.nsfw_score)
        .bind(media.analyzed_at.map(|t| t.to_rfc3339()))
        .bind(&media.analysis_error)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_media(&self, media_id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM media WHERE id = ?1")
            .bind(media_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn media_for_expression(&self, expression_id: i64) -> StoreResult<Vec<Media>> {
        let rows = sqlx::query("SELECT * FROM media WHERE expression_id = ?1")
            .bind(expression_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_media).collect()
    }
}

/// Retry a fallible connect operation once more after a brief pause. Used by
/// callers that open the store eagerly at process start, where a cold NFS
/// mount or an antivirus file-lock can transiently fail `create_if_missing`.
pub async fn open_with_retry(path: &std::path::Path) -> StoreResult<SqliteStore> {
    match SqliteStore::open(path).await {
        Ok(store) => Ok(store),
        Err(_) => {
            tokio::time::sleep(Duration::from_millis(200)).await;
            SqliteStore::open(path).await
        }
    }
}
