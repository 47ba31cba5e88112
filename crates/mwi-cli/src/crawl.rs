//! The `land crawl` orchestrator (spec.md §4.3/§4.4): fetch a frontier of
//! not-yet-fetched Expressions in batches of `P`, run each response through
//! the Content Pipeline and the optional Relevance Gate, score it, and write
//! back scalar fields, links, and media. Repeats until the frontier is
//! empty, matching the BFS-by-depth crawl shape implied by §4.4's
//! `depth = source.depth + 1` discovery rule.
//!
//! `--depth` only bounds which Expressions this run is willing to *fetch*
//! (`max_fetch_depth`); it never touches the §4.4 outlink discovery cap
//! (`discovery_depth_cap`), which stays fixed at `Config::link_depth_cap` so
//! a depth-0 crawl still discovers depth-1 outlinks.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use mwi_core::{Error, Expression, ExpressionLink, Land, Media, Result};
use mwi_dictionary::{score, stemmer_for_lang, LemmaSet, Stemmer};
use mwi_fetch::{fetch_batch, new_cancel_token, Fetcher};
use mwi_gate::{GateQuery, GateVerdict, RelevanceGate};
use mwi_store::Store;

#[derive(Debug, Default, Clone, Copy)]
pub struct CrawlStats {
    pub fetched: u64,
    pub approved: u64,
    pub rejected: u64,
    pub failed: u64,
}

pub struct CrawlOptions {
    pub concurrency: usize,
    /// The §4.4 outlink discovery cap; never overridden by `--depth`.
    pub discovery_depth_cap: i32,
    /// `--depth`: bounds which Expressions get fetched this run, not discovery.
    pub max_fetch_depth: Option<i32>,
    pub limit: Option<usize>,
    /// `--http`: re-crawl already-fetched Expressions matching this status
    /// instead of the default not-yet-fetched frontier.
    pub http_status_filter: Option<String>,
}

pub async fn crawl_land(
    store: &dyn Store,
    land: &Land,
    fetcher: &Fetcher,
    gate: Option<&RelevanceGate>,
    options: &CrawlOptions,
) -> Result<CrawlStats> {
    let land_id = land.id.ok_or_else(|| Error::InvalidArgument("land has no id".into()))?;
    let words = store.land_dictionary(land_id).await.map_err(Error::from)?;
    let lemmas = LemmaSet::new(words.into_iter().map(|w| w.lemma));
    let land_lemmas = lemmas.to_vec();
    let stemmer = stemmer_for_lang(&land.lang);
    let cancel = new_cancel_token();

    let mut stats = CrawlStats::default();

    if options.http_status_filter.is_some() {
        // Re-crawling already-fetched rows matching a status doesn't grow a
        // BFS frontier the way the default path does, so one pass suffices.
        let mut frontier = select_frontier(store, land_id, options).await?;
        if let Some(limit) = options.limit {
            frontier.truncate(limit);
        }
        fetch_and_process(store, land, &lemmas, &land_lemmas, &*stemmer, fetcher, gate, options, frontier, &cancel, &mut stats).await?;
        return Ok(stats);
    }

    loop {
        let mut frontier = select_frontier(store, land_id, options).await?;
        if frontier.is_empty() {
            break;
        }
        if let Some(limit) = options.limit {
            let remaining = limit.saturating_sub(stats.fetched as usize);
            if remaining == 0 {
                break;
            }
            frontier.truncate(remaining);
        }

        fetch_and_process(store, land, &lemmas, &land_lemmas, &*stemmer, fetcher, gate, options, frontier, &cancel, &mut stats).await?;

        if let Some(limit) = options.limit {
            if stats.fetched as usize >= limit {
                break;
            }
        }
    }

    Ok(stats)
}

/// Select this run's fetch frontier: not-yet-fetched Expressions by default,
/// or already-fetched ones matching `--http` when that filter is set.
/// `--depth` (`max_fetch_depth`) bounds either selection.
async fn select_frontier(store: &dyn Store, land_id: i64, options: &CrawlOptions) -> Result<Vec<Expression>> {
    let mut frontier: Vec<Expression> = match &options.http_status_filter {
        Some(status) => store
            .list_expressions(land_id, None, Some(status.as_str()))
            .await
            .map_err(Error::from)?
            .into_iter()
            .filter(|e| e.fetched_at.is_some())
            .collect(),
        None => store
            .list_expressions(land_id, None, None)
            .await
            .map_err(Error::from)?
            .into_iter()
            .filter(|e| e.fetched_at.is_none())
            .collect(),
    };
    if let Some(max_depth) = options.max_fetch_depth {
        frontier.retain(|e| e.depth <= max_depth);
    }
    Ok(frontier)
}

#[allow(clippy::too_many_arguments)]
async fn fetch_and_process(
    store: &dyn Store,
    land: &Land,
    lemmas: &LemmaSet,
    land_lemmas: &[String],
    stemmer: &dyn Stemmer,
    fetcher: &Fetcher,
    gate: Option<&RelevanceGate>,
    options: &CrawlOptions,
    frontier: Vec<Expression>,
    cancel: &Arc<AtomicBool>,
    stats: &mut CrawlStats,
) -> Result<()> {
    let land_id = land.id.ok_or_else(|| Error::InvalidArgument("land has no id".into()))?;
    let urls: Vec<String> = frontier.iter().map(|e| e.url.clone()).collect();
    let responses = fetch_batch(fetcher, &urls, options.concurrency, cancel.clone()).await;

    for (mut expression, response) in frontier.into_iter().zip(responses) {
        stats.fetched += 1;
        expression.http_status = Some(response.status.clone());
        expression.fetched_at = Some(chrono::Utc::now());

        let Some(html) = response.body else {
            expression.relevance = 0;
            store.save_expression(&expression).await.map_err(Error::from)?;
            stats.failed += 1;
            continue;
        };

        let processed = mwi_content::process(&html, &expression.url, expression.depth, options.discovery_depth_cap, true);
        expression.lang = processed.metadata.lang.clone();
        expression.title = processed.metadata.title.clone();
        expression.description = processed.metadata.description.clone();
        expression.keywords = processed.metadata.keywords.clone();
        expression.raw_html = Some(html);
        expression.readable = Some(processed.readable.clone());

        let local_score = score(&expression, &land.lang, lemmas, |t| stemmer.stem(t));
        let verdict = match gate {
            Some(gate) => {
                gate.ask(&GateQuery {
                    land_name: &land.name,
                    land_description: land.description.as_deref(),
                    land_lang: &land.lang,
                    land_lemmas,
                    url: &expression.url,
                    title: expression.title.as_deref(),
                    description: expression.description.as_deref(),
                    readable: expression.readable.as_deref(),
                })
                .await
            }
            None => GateVerdict::Unknown,
        };

        expression.relevance = match verdict {
            GateVerdict::No => 0,
            _ => local_score,
        };
        expression.approved_at = if expression.relevance > 0 { Some(chrono::Utc::now()) } else { None };
        store.save_expression(&expression).await.map_err(Error::from)?;

        if expression.relevance > 0 {
            stats.approved += 1;
            let expression_id = expression.id.ok_or_else(|| Error::Internal("expression has no id".into()))?;
            for link in &processed.outlinks {
                let mut discovered = Expression::seed(land_id, link.url.clone());
                discovered.depth = expression.depth + 1;
                let target = store.upsert_expression(discovered).await.map_err(Error::from)?;
                let Some(target_id) = target.id else { continue };
                store
                    .add_link(ExpressionLink {
                        source_id: expression_id,
                        target_id,
                    })
                    .await
                    .map_err(Error::from)?;
            }
            for discovered in &processed.media {
                store
                    .upsert_media(Media::new(expression_id, discovered.url.clone(), discovered.kind))
                    .await
                    .map_err(Error::from)?;
            }
        } else {
            stats.rejected += 1;
        }
    }

    Ok(())
}
