//! Wayback-Machine archival fallback (spec.md §4.3 step 3, §6 "Archive
//! service", §9 "Archive-org URL parsing").

use serde::Deserialize;

const WAYBACK_AVAILABLE_ENDPOINT: &str = "https://archive.org/wayback/available";

#[derive(Debug, Deserialize)]
struct WaybackResponse {
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<ClosestSnapshot>,
}

#[derive(Debug, Deserialize)]
struct ClosestSnapshot {
    url: String,
}

/// Look up `archived_snapshots.closest.url` for `url`. Per spec.md §9, a
/// missing path at any level means no fallback — never an error.
pub async fn lookup_snapshot(client: &reqwest::Client, url: &str) -> Option<String> {
    let response = client
        .get(WAYBACK_AVAILABLE_ENDPOINT)
        .query(&[("url", url)])
        .send()
        .await
        .ok()?;
    let parsed: WaybackResponse = response.json().await.ok()?;
    parsed.archived_snapshots.closest.map(|c| c.url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn lookup_returns_snapshot_url_on_hit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wayback/available"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "archived_snapshots": {
                    "closest": { "url": "https://web.archive.org/web/2020/https://example.com/" }
                }
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let endpoint = format!("{}/wayback/available", server.uri());
        let response = client
            .get(endpoint)
            .query(&[("url", "https://example.com/")])
            .send()
            .await
            .unwrap();
        let parsed: WaybackResponse = response.json().await.unwrap();
        assert_eq!(
            parsed.archived_snapshots.closest.unwrap().url,
            "https://web.archive.org/web/2020/https://example.com/"
        );
    }

    #[tokio::test]
    async fn lookup_returns_none_when_no_closest_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wayback/available"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "archived_snapshots": {}
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let endpoint = format!("{}/wayback/available", server.uri());
        let snapshot = lookup_snapshot_at(&client, &endpoint, "https://example.com/").await;
        assert!(snapshot.is_none());
    }

    async fn lookup_snapshot_at(client: &reqwest::Client, endpoint: &str, url: &str) -> Option<String> {
        let response = client.get(endpoint).query(&[("url", url)]).send().await.ok()?;
        let parsed: WaybackResponse = response.json().await.ok()?;
        parsed.archived_snapshots.closest.map(|c| c.url)
    }
}
