//! External high-quality extractor contract (spec.md §4.5 step 1, §6
//! "Readable extractor").

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub markdown: Option<String>,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub language: Option<String>,
    pub lead_image: Option<String>,
    pub images: Vec<String>,
    pub outlinks: Vec<String>,
}

/// Any process or library that consumes a URL and returns the fields above.
/// Absence of a configured extractor disables the refiner entirely (spec.md
/// §6) — callers should simply not construct a [`super::refiner::Refiner`]
/// in that case rather than implementing a null object here.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractedPage, ExtractorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    #[error("extractor timed out")]
    Timeout,
    #[error("extractor process failed: {0}")]
    ProcessFailed(String),
}
