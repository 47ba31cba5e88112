//! Subprocess-backed [`Extractor`]: invokes a configured external binary or
//! script, passing the URL as its sole argument, and parses a JSON object on
//! stdout matching spec.md §4.5 step 1's field list. Grounded on the
//! teacher's subprocess style in `mcp-agent-mail-cli::e2e_runner` (spawn,
//! inherit nothing, collect output, classify non-zero exit as failure).

use std::time::Duration;

use async_trait::async_trait;
use mwi_readable::{ExtractedPage, Extractor, ExtractorError};
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, Deserialize, Default)]
struct ExtractorOutput {
    title: Option<String>,
    markdown: Option<String>,
    excerpt: Option<String>,
    author: Option<String>,
    published_at: Option<chrono::DateTime<chrono::Utc>>,
    language: Option<String>,
    lead_image: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    outlinks: Vec<String>,
}

impl From<ExtractorOutput> for ExtractedPage {
    fn from(out: ExtractorOutput) -> Self {
        Self {
            title: out.title,
            markdown: out.markdown,
            excerpt: out.excerpt,
            author: out.author,
            published_at: out.published_at,
            language: out.language,
            lead_image: out.lead_image,
            images: out.images,
            outlinks: out.outlinks,
        }
    }
}

pub struct ProcessExtractor {
    binary_path: String,
    timeout: Duration,
}

impl ProcessExtractor {
    #[must_use]
    pub fn new(binary_path: String, timeout_secs: u64) -> Self {
        Self {
            binary_path,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl Extractor for ProcessExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedPage, ExtractorError> {
        let run = Command::new(&self.binary_path).arg(url).output();

        let output = match timeout(self.timeout, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ExtractorError::ProcessFailed(e.to_string())),
            Err(_elapsed) => return Err(ExtractorError::Timeout),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractorError::ProcessFailed(stderr.trim().to_string()));
        }

        serde_json::from_slice::<ExtractorOutput>(&output.stdout)
            .map(ExtractedPage::from)
            .map_err(|e| ExtractorError::ProcessFailed(format!("unparseable extractor output: {e}")))
    }
}
