//! Per-item fetch operation and the bounded-concurrency batch orchestrator
//! (spec.md §4.3, §5).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::warn;

use crate::archive::lookup_snapshot;
use crate::types::{FetchConfig, FetchResponse};

#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()?;
        Ok(Self { client, config })
    }

    /// Execute spec.md §4.3 steps 1-4 for a single URL.
    pub async fn fetch(&self, url: &str) -> FetchResponse {
        match self.fetch_live(url).await {
            Some(response) if response.is_html_success() => response,
            live => {
                let status = live.map(|r| r.status).unwrap_or_else(|| "000".to_string());
                match lookup_snapshot(&self.client, url).await {
                    Some(snapshot_url) => match self.fetch_live(&snapshot_url).await {
                        Some(archived) if archived.body.is_some() => FetchResponse {
                            requested_url: url.to_string(),
                            final_url: archived.final_url,
                            status,
                            body: archived.body,
                            from_archive: true,
                        },
                        _ => FetchResponse {
                            requested_url: url.to_string(),
                            final_url: url.to_string(),
                            status,
                            body: None,
                            from_archive: false,
                        },
                    },
                    None => FetchResponse {
                        requested_url: url.to_string(),
                        final_url: url.to_string(),
                        status,
                        body: None,
                        from_archive: false,
                    },
                }
            }
        }
    }

    async fn fetch_live(&self, url: &str) -> Option<FetchResponse> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "fetch failed");
                return None;
            }
        };
        let status = response.status().as_u16().to_string();
        let final_url = response.url().to_string();
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("html"))
            .unwrap_or(false);

        let body = match response.text().await {
            Ok(text) if is_html => Some(text),
            Ok(_) => None,
            Err(e) => {
                warn!(url, error = %e, "failed to read body");
                None
            }
        };

        Some(FetchResponse {
            requested_url: url.to_string(),
            final_url,
            status,
            body,
            from_archive: false,
        })
    }
}

/// Run `fetch` over `urls` in windows of at most `concurrency`, awaiting each
/// window fully before advancing (spec.md §5 batch-barrier model). Returns
/// results in input order.
pub async fn fetch_batch(
    fetcher: &Fetcher,
    urls: &[String],
    concurrency: usize,
    cancelled: Arc<AtomicBool>,
) -> Vec<FetchResponse> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut results = Vec::with_capacity(urls.len());

    for window in urls.chunks(concurrency.max(1)) {
        if cancelled.load(Ordering::Relaxed) {
            break;
        }
        let tasks: Vec<_> = window
            .iter()
            .map(|url| {
                let fetcher = fetcher.clone();
                let url = url.clone();
                let semaphore = semaphore.clone();
                let cancelled = cancelled.clone();
                tokio::spawn(async move {
                    let _permit = semaphore.acquire().await.expect("semaphore not closed");
                    if cancelled.load(Ordering::Relaxed) {
                        return FetchResponse::failed(&url);
                    }
                    fetcher.fetch(&url).await
                })
            })
            .collect();

        for task in tasks {
            match task.await {
                Ok(response) => results.push(response),
                Err(_join_error) => results.push(FetchResponse::failed("unknown")),
            }
        }
    }
    results
}

/// A cooperative cancel signal shared across an in-flight batch.
#[must_use]
pub fn new_cancel_token() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

pub fn cancel(token: &AtomicBool) {
    token.store(true, Ordering::Relaxed);
}

#[allow(dead_code)]
const DEFAULT_CANCEL_GRACE: Duration = Duration::from_secs(30);

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_returns_html_body_on_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html><body>hi</body></html>"),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        let response = fetcher.fetch(&format!("{}/page", server.uri())).await;
        assert_eq!(response.status, "200");
        assert!(response.body.unwrap().contains("hi"));
        assert!(!response.from_archive);
    }

    #[tokio::test]
    async fn fetch_reports_000_when_connection_refused() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        let response = fetcher.fetch("http://127.0.0.1:1").await;
        assert_eq!(response.status, "000");
        assert!(response.body.is_none());
    }

    #[tokio::test]
    async fn fetch_batch_respects_window_size_and_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html></html>"),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        let urls: Vec<String> = (0..5).map(|i| format!("{}/p{}", server.uri(), i)).collect();
        let results = fetch_batch(&fetcher, &urls, 2, new_cancel_token()).await;
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.status == "200"));
    }
}
