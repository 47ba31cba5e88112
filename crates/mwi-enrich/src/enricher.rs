//! Domain Enricher (spec.md §4.9): fetch each Domain's homepage through the
//! fetch-then-archive cascade already implemented by `mwi_fetch::Fetcher`,
//! preferring https before falling back to http, and fill in title,
//! description, and keywords from the page.

use mwi_fetch::Fetcher;
use mwi_store::{Store, StoreResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct EnrichStats {
    pub processed: usize,
    pub updated: usize,
    pub failed: usize,
}

pub struct DomainEnricher {
    fetcher: Fetcher,
}

impl DomainEnricher {
    #[must_use]
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Enrich every Domain in `store` lacking `fetched_at`, or matching
    /// `status_filter` when given (re-run semantics).
    pub async fn enrich_all(
        &self,
        store: &dyn Store,
        hosts: Vec<String>,
        status_filter: Option<&str>,
    ) -> StoreResult<EnrichStats> {
        let mut stats = EnrichStats::default();
        for host in hosts {
            let mut domain = store.get_or_create_domain(&host).await?;
            let needs_run = domain.fetched_at.is_none()
                || status_filter.is_some_and(|f| domain.http_status.as_deref() == Some(f));
            if !needs_run {
                continue;
            }
            stats.processed += 1;

            let response = self.fetch_homepage(&host).await;
            domain.http_status = Some(response.status.clone());
            domain.fetched_at = Some(chrono::Utc::now());

            if let Some(body) = &response.body {
                let document = scraper::Html::parse_document(body);
                let metadata = mwi_content::extract_metadata(&document);
                if metadata.title.is_some() {
                    domain.title = metadata.title;
                }
                if metadata.description.is_some() {
                    domain.description = metadata.description;
                }
                if metadata.keywords.is_some() {
                    domain.keywords = metadata.keywords;
                }
                stats.updated += 1;
            } else {
                stats.failed += 1;
            }

            store.save_domain(&domain).await?;
        }
        Ok(stats)
    }

    async fn fetch_homepage(&self, host: &str) -> mwi_fetch::FetchResponse {
        let https = self.fetcher.fetch(&format!("https://{host}/")).await;
        if https.is_html_success() {
            return https;
        }
        self.fetcher.fetch(&format!("http://{host}/")).await
    }
}
