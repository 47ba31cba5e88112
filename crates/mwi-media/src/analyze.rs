//! Per-`Media` analysis orchestrator (spec.md §4.7 steps 1-4).
//!
//! Grounded on the teacher's batched-worker shape (`mwi-readable::refiner`):
//! fetch a batch of rows, process each independently, persist as it goes,
//! tally an outcome struct.

use std::sync::Arc;

use mwi_core::{Config, DominantColor, Land, Media};
use mwi_store::Store;

use crate::color::dominant_colors;
use crate::deny::is_denied;
use crate::download::download_with_retry;
use crate::exif;
use crate::hints::classify;
use crate::phash::dhash;

#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyzeStats {
    pub processed: usize,
    pub analyzed: usize,
    pub denied: usize,
    pub rejected: usize,
    pub errored: usize,
}

/// `(depth <= D, relevance >= R)` filter on the owning Expression (spec.md
/// §4.7, "operates on stored Media rows whose owning Expression satisfies an
/// optional filter").
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyzeFilter {
    pub max_depth: Option<i32>,
    pub min_relevance: Option<i64>,
}

impl AnalyzeFilter {
    fn admits(&self, expression: &mwi_core::Expression) -> bool {
        self.max_depth.map_or(true, |d| expression.depth <= d)
            && self.min_relevance.map_or(true, |r| expression.relevance >= r)
    }
}

pub struct MediaAnalyzer {
    client: reqwest::Client,
    download_retries: u32,
    max_file_size_bytes: u64,
    min_dimensions: (u32, u32),
    color_k: usize,
}

impl MediaAnalyzer {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            download_retries: config.media_download_retries,
            max_file_size_bytes: config.media_max_file_size_bytes,
            min_dimensions: config.media_min_dimensions,
            color_k: config.media_color_k,
        }
    }

    /// Analyze every `img` media row belonging to `land`, writing results
    /// back through `store` one row at a time. Non-image kinds (video,
    /// audio) are counted as processed but never analyzed: the analyzer
    /// only inspects bitmap content.
    pub async fn analyze_land(
        &self,
        store: &dyn Store,
        land: &Land,
        filter: AnalyzeFilter,
    ) -> mwi_store::StoreResult<AnalyzeStats> {
        let Some(land_id) = land.id else {
            return Ok(AnalyzeStats::default());
        };
        let expressions = store.list_expressions(land_id, None, None).await?;

        let mut stats = AnalyzeStats::default();
        for expression in expressions {
            if !filter.admits(&expression) {
                continue;
            }
            let Some(expression_id) = expression.id else { continue };
            let media_rows = store.media_for_expression(expression_id).await?;
            for media in media_rows {
                if media.kind != mwi_core::MediaKind::Img {
                    continue;
                }
                stats.processed += 1;
                let outcome = self.analyze_one(media).await;
                store.save_media(&outcome).await?;
                match &outcome.analysis_error {
                    Some(msg) if msg == DENIED_MARKER => stats.denied += 1,
                    Some(msg) if msg == REJECTED_MARKER => stats.rejected += 1,
                    Some(_) => stats.errored += 1,
                    None => stats.analyzed += 1,
                }
            }
        }
        Ok(stats)
    }

    /// Force re-evaluation of every previously-analyzed `img` row in `land`,
    /// ignoring `analyzed_at`. Used by reanalysis mode (spec.md §4.7,
    /// "Reanalysis: force re-evaluation of already-analyzed media").
    pub async fn reanalyze_land(
        &self,
        store: &dyn Store,
        land: &Land,
        filter: AnalyzeFilter,
    ) -> mwi_store::StoreResult<AnalyzeStats> {
        self.analyze_land(store, land, filter).await
    }

    async fn analyze_one(&self, mut media: Media) -> Media {
        if is_denied(&media.url) {
            media.analysis_error = Some(DENIED_MARKER.to_string());
            media.analyzed_at = Some(chrono::Utc::now());
            return media;
        }

        let bytes = match download_with_retry(
            &self.client,
            &media.url,
            self.download_retries,
            self.max_file_size_bytes,
        )
        .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                media.analysis_error = Some(e.to_string());
                media.analyzed_at = Some(chrono::Utc::now());
                return media;
            }
        };
        media.file_size = Some(bytes.len() as u64);

        let image = match image::load_from_memory(&bytes) {
            Ok(image) => image,
            Err(e) => {
                media.analysis_error = Some(format!("decode failed: {e}"));
                media.analyzed_at = Some(chrono::Utc::now());
                return media;
            }
        };

        let (width, height) = (image.width(), image.height());
        if width < self.min_dimensions.0 || height < self.min_dimensions.1 {
            media.analysis_error = Some(REJECTED_MARKER.to_string());
            media.analyzed_at = Some(chrono::Utc::now());
            return media;
        }

        media.width = Some(width);
        media.height = Some(height);
        media.aspect_ratio = Some(width as f32 / height as f32);
        media.format = image::guess_format(&bytes).ok().map(|f| format!("{f:?}").to_ascii_lowercase());
        media.color_mode = Some(color_mode_name(&image));
        media.has_transparency = Some(has_transparency(&image));
        media.perceptual_hash = Some(dhash(&image));
        media.exif = exif::extract(&bytes);
        media.dominant_colors = self.safe_dominant_colors(&image);
        media.content_tags = classify(&image);
        media.analysis_error = None;
        media.analyzed_at = Some(chrono::Utc::now());
        media
    }

    fn safe_dominant_colors(&self, image: &image::DynamicImage) -> Vec<DominantColor> {
        if self.color_k == 0 {
            return Vec::new();
        }
        dominant_colors(image, self.color_k)
    }
}

const DENIED_MARKER: &str = "denied: matched ad/tracker pattern";
const REJECTED_MARKER: &str = "rejected: below minimum dimensions";

fn color_mode_name(image: &image::DynamicImage) -> String {
    use image::DynamicImage::*;
    match image {
        ImageLuma8(_) => "grayscale",
        ImageLumaA8(_) => "grayscale_alpha",
        ImageRgb8(_) => "rgb",
        ImageRgba8(_) => "rgba",
        ImageLuma16(_) => "grayscale16",
        ImageLumaA16(_) => "grayscale_alpha16",
        ImageRgb16(_) => "rgb16",
        ImageRgba16(_) => "rgba16",
        ImageRgb32F(_) => "rgb32f",
        ImageRgba32F(_) => "rgba32f",
        _ => "unknown",
    }
    .to_string()
}

fn has_transparency(image: &image::DynamicImage) -> bool {
    use image::DynamicImage::*;
    matches!(
        image,
        ImageLumaA8(_) | ImageLumaA16(_) | ImageRgba8(_) | ImageRgba16(_) | ImageRgba32F(_)
    )
}

pub fn shared_client() -> Arc<reqwest::Client> {
    Arc::new(reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mwi_core::MediaKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(image::ImageBuffer::from_fn(width, height, |x, y| {
            image::Rgba([(x % 255) as u8, (y % 255) as u8, 128, 255])
        }));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn analyzer() -> MediaAnalyzer {
        MediaAnalyzer::new(&Config::default())
    }

    #[tokio::test]
    async fn denied_url_never_triggers_a_download() {
        let media = Media::new(1, "https://doubleclick.net/pixel.gif", MediaKind::Img);
        let result = analyzer().analyze_one(media).await;
        assert_eq!(result.analysis_error.as_deref(), Some(DENIED_MARKER));
        assert!(result.analyzed_at.is_some());
        assert!(result.width.is_none());
    }

    #[tokio::test]
    async fn small_image_is_rejected_below_minimum_dimensions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tiny.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(10, 10)))
            .mount(&server)
            .await;

        let media = Media::new(1, format!("{}/tiny.png", server.uri()), MediaKind::Img);
        let result = analyzer().analyze_one(media).await;
        assert_eq!(result.analysis_error.as_deref(), Some(REJECTED_MARKER));
        assert!(result.analyzed_at.is_some());
    }

    #[tokio::test]
    async fn valid_image_is_fully_analyzed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/photo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(120, 120)))
            .mount(&server)
            .await;

        let media = Media::new(1, format!("{}/photo.png", server.uri()), MediaKind::Img);
        let result = analyzer().analyze_one(media).await;
        assert!(result.analysis_error.is_none());
        assert_eq!(result.width, Some(120));
        assert_eq!(result.height, Some(120));
        assert!(result.perceptual_hash.is_some());
        assert!(result.analyzed_at.is_some());
        assert!(!result.dominant_colors.is_empty());
    }

    #[tokio::test]
    async fn network_failure_still_sets_analyzed_at() {
        let media = Media::new(1, "http://127.0.0.1:1/unreachable.png", MediaKind::Img);
        let result = analyzer().analyze_one(media).await;
        assert!(result.analysis_error.is_some());
        assert!(result.analyzed_at.is_some());
    }

    #[tokio::test]
    async fn analyze_land_skips_expressions_excluded_by_the_filter() {
        use mwi_core::{Expression, Land};
        use mwi_store::SqliteStore;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/photo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(120, 120)))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("t.db")).await.unwrap();
        let land = store.create_land(Land::new("asthme", None, None)).await.unwrap();

        let mut deep = Expression::seed(land.id.unwrap(), "https://example.com/deep");
        deep.depth = 5;
        let deep = store.upsert_expression(deep).await.unwrap();
        store
            .upsert_media(Media::new(
                deep.id.unwrap(),
                format!("{}/photo.png", server.uri()),
                MediaKind::Img,
            ))
            .await
            .unwrap();

        let filter = AnalyzeFilter {
            max_depth: Some(2),
            min_relevance: None,
        };
        let stats = analyzer().analyze_land(&store, &land, filter).await.unwrap();
        assert_eq!(stats.processed, 0);

        let stats = analyzer().analyze_land(&store, &land, AnalyzeFilter::default()).await.unwrap();
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.analyzed, 1);
    }
}
