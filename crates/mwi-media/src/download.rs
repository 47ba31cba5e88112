//! Image download with retry and a size cap (spec.md §4.7 step 2).

use std::time::Duration;

use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("download failed after retries: {0}")]
    NetworkError(String),
    #[error("response exceeded max size of {max} bytes")]
    TooLarge { max: u64 },
}

pub async fn download_with_retry(
    client: &reqwest::Client,
    url: &str,
    retries: u32,
    max_size_bytes: u64,
) -> Result<Vec<u8>, DownloadError> {
    let mut attempt = 0;
    loop {
        match download_once(client, url, max_size_bytes).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) if attempt < retries => {
                warn!(url, attempt, error = %e, "media download failed, retrying");
                tokio::time::sleep(Duration::from_millis(200 * 2u64.pow(attempt))).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn download_once(client: &reqwest::Client, url: &str, max_size_bytes: u64) -> Result<Vec<u8>, DownloadError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| DownloadError::NetworkError(e.to_string()))?;

    if let Some(len) = response.content_length() {
        if len > max_size_bytes {
            return Err(DownloadError::TooLarge { max: max_size_bytes });
        }
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DownloadError::NetworkError(e.to_string()))?;

    if bytes.len() as u64 > max_size_bytes {
        return Err(DownloadError::TooLarge { max: max_size_bytes });
    }

    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn downloads_small_images_successfully() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 16]))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let bytes = download_with_retry(&client, &server.uri(), 2, 1024).await.unwrap();
        assert_eq!(bytes.len(), 16);
    }

    #[tokio::test]
    async fn rejects_oversized_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 2048]))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let result = download_with_retry(&client, &server.uri(), 0, 1024).await;
        assert!(matches!(result, Err(DownloadError::TooLarge { .. })));
    }
}
