//! Entity types for the crawl/relevance/link-graph engine.
//!
//! These map directly to the Store tables described in `spec.md` §3. Every
//! timestamp is UTC. `id: None` means "not yet persisted"; the Store
//! populates it on insert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A bounded research project: name, language, weighted term dictionary, seeds.
///
/// # Constraints
/// - `name`: unique.
/// - `lang`: ISO-639-ish code, defaults to `"fr"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Land {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub lang: String,
    pub created_at: DateTime<Utc>,
}

impl Land {
    pub fn new(name: impl Into<String>, description: Option<String>, lang: Option<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description,
            lang: lang.unwrap_or_else(|| "fr".to_string()),
            created_at: Utc::now(),
        }
    }
}

/// Global vocabulary entry: an original surface term and its stemmed lemma.
///
/// # Constraints
/// - `term`: unique.
/// - `lemma`: indexed (not unique — many terms can stem to the same lemma).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Word {
    pub id: Option<i64>,
    pub term: String,
    pub lemma: String,
}

/// Association between a Land and a Word: the weighted term set used for
/// scoring that Land.
///
/// # Constraints
/// - Unique: `(land_id, word_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LandDictionaryEntry {
    pub id: Option<i64>,
    pub land_id: i64,
    pub word_id: i64,
}

/// A unique host name with cached metadata from the Domain Enricher (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Domain {
    pub id: Option<i64>,
    pub host: String,
    pub fetched_at: Option<DateTime<Utc>>,
    pub http_status: Option<String>,
    pub title: Option<String>,
    pub keywords: Option<String>,
    pub description: Option<String>,
}

impl Domain {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            id: None,
            host: host.into(),
            fetched_at: None,
            http_status: None,
            title: None,
            keywords: None,
            description: None,
        }
    }
}

/// A single crawled page URL within exactly one Land.
///
/// # Invariants (spec.md §3)
/// - `url` is globally unique within the store and already normalized.
/// - `depth` is the minimum link distance to a seed at first-record time;
///   later discoveries never raise it, only ever lower it.
/// - `fetched_at` is set iff an HTTP attempt concluded.
/// - `approved_at` is set iff `relevance > 0` at writeback time.
/// - `readable_at` is set iff the readable refiner wrote the readable field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expression {
    pub id: Option<i64>,
    pub land_id: i64,
    pub url: String,
    pub depth: i32,
    pub lang: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub raw_html: Option<String>,
    pub readable: Option<String>,
    pub relevance: i64,
    pub domain_id: Option<i64>,
    pub http_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub readable_at: Option<DateTime<Utc>>,
}

impl Expression {
    pub fn seed(land_id: i64, url: impl Into<String>) -> Self {
        Self {
            id: None,
            land_id,
            url: url.into(),
            depth: 0,
            lang: None,
            title: None,
            description: None,
            keywords: None,
            author: None,
            published_at: None,
            raw_html: None,
            readable: None,
            relevance: 0,
            domain_id: None,
            http_status: None,
            created_at: Utc::now(),
            fetched_at: None,
            approved_at: None,
            readable_at: None,
        }
    }

    /// Body text used as the relevance scorer's secondary signal: prefer the
    /// readable body, fall back to a text rendering of the raw HTML.
    pub fn body_text_for_scoring(&self) -> Option<&str> {
        self.readable
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.raw_html.as_deref())
    }
}

/// A directed edge between two Expressions in the same Land.
///
/// # Constraints
/// - Unique: `(source_id, target_id)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpressionLink {
    pub source_id: i64,
    pub target_id: i64,
}

/// What kind of embedded resource a [`Media`] row refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Img,
    Video,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Img => write!(f, "img"),
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// An ordered dominant-color entry: RGB, hex, HSV, an approximate name, and
/// the fraction of sampled pixels it covers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DominantColor {
    pub rgb: (u8, u8, u8),
    pub hex: String,
    pub hsv: (f32, f32, f32),
    pub name: String,
    pub percentage: f32,
}

/// An image/video/audio reference discovered inside an Expression, plus the
/// analysis fields the Media Analyzer (§4.7) fills in for images.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Media {
    pub id: Option<i64>,
    pub expression_id: i64,
    pub url: String,
    pub kind: MediaKind,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub file_size: Option<u64>,
    pub format: Option<String>,
    pub color_mode: Option<String>,
    pub dominant_colors: Vec<DominantColor>,
    pub aspect_ratio: Option<f32>,
    pub has_transparency: Option<bool>,
    pub exif: HashMap<String, String>,
    pub perceptual_hash: Option<String>,
    pub web_safe_palette: HashMap<String, String>,
    pub content_tags: Vec<String>,
    pub nsfw_score: Option<f32>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub analysis_error: Option<String>,
}

impl Media {
    pub fn new(expression_id: i64, url: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: None,
            expression_id,
            url: url.into(),
            kind,
            width: None,
            height: None,
            file_size: None,
            format: None,
            color_mode: None,
            dominant_colors: Vec::new(),
            aspect_ratio: None,
            has_transparency: None,
            exif: HashMap::new(),
            perceptual_hash: None,
            web_safe_palette: HashMap::new(),
            content_tags: Vec::new(),
            nsfw_score: None,
            analyzed_at: None,
            analysis_error: None,
        }
    }
}

/// Hierarchical annotation node. Read-only to the core engine (§3): never
/// created or mutated here, only preserved for referential integrity on
/// Expression deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: Option<i64>,
    pub land_id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
}

/// A text span tagged under a [`Tag`], read-only to the core engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaggedContent {
    pub id: Option<i64>,
    pub tag_id: i64,
    pub expression_id: i64,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn land_defaults_to_french() {
        let land = Land::new("asthme", None, None);
        assert_eq!(land.lang, "fr");
        assert!(land.id.is_none());
    }

    #[test]
    fn expression_seed_is_depth_zero_and_unscored() {
        let e = Expression::seed(1, "https://example.com/");
        assert_eq!(e.depth, 0);
        assert_eq!(e.relevance, 0);
        assert!(e.fetched_at.is_none());
        assert!(e.approved_at.is_none());
    }

    #[test]
    fn body_text_prefers_readable_over_raw_html() {
        let mut e = Expression::seed(1, "https://example.com/");
        e.raw_html = Some("<p>raw</p>".into());
        assert_eq!(e.body_text_for_scoring(), Some("<p>raw</p>"));
        e.readable = Some("readable body".into());
        assert_eq!(e.body_text_for_scoring(), Some("readable body"));
    }

    #[test]
    fn media_kind_display_matches_extension_family_name() {
        assert_eq!(MediaKind::Img.to_string(), "img");
        assert_eq!(MediaKind::Video.to_string(), "video");
        assert_eq!(MediaKind::Audio.to_string(), "audio");
    }
}
