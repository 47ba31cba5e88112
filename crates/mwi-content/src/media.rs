//! Media discovery: `<img>`, `<video>`, `<audio>` with recognized extensions
//! (spec.md §4.4 step 6).

use mwi_core::MediaKind;
use scraper::{Html, Selector};
use url::Url;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "ogv", "mov", "avi", "mkv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "flac", "m4a"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredMedia {
    pub url: String,
    pub kind: MediaKind,
}

fn extension_of(url: &Url) -> Option<String> {
    url.path()
        .rsplit('.')
        .next()
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5)
}

fn kind_for_extension(ext: &str) -> Option<MediaKind> {
    if IMAGE_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Img)
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Video)
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Audio)
    } else {
        None
    }
}

/// Discover `<img src>`, `<video src>`, `<audio src>` references, resolved
/// against `base_url` and filtered to recognized extensions.
pub fn discover_media(document: &Html, base_url: &Url) -> Vec<DiscoveredMedia> {
    let selector = Selector::parse("img[src], video[src], audio[src]").expect("static selector");
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .filter_map(|src| base_url.join(src).ok())
        .filter_map(|url| {
            let kind = kind_for_extension(&extension_of(&url)?)?;
            Some(DiscoveredMedia {
                url: url.to_string(),
                kind,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_images_videos_and_audio_by_extension() {
        let html = Html::parse_document(
            r#"<html><body>
                 <img src="/a.JPG">
                 <video src="clip.mp4"></video>
                 <audio src="sound.mp3"></audio>
                 <img src="/logo.ico">
               </body></html>"#,
        );
        let base = Url::parse("https://example.com/page").unwrap();
        let found = discover_media(&html, &base);
        assert_eq!(found.len(), 3);
        assert!(found.iter().any(|m| m.url.ends_with("a.JPG") && m.kind == MediaKind::Img));
        assert!(found.iter().any(|m| m.kind == MediaKind::Video));
        assert!(found.iter().any(|m| m.kind == MediaKind::Audio));
    }

    #[test]
    fn unrecognized_extensions_are_dropped() {
        let html = Html::parse_document(r#"<html><body><img src="/icon.ico"></body></html>"#);
        let base = Url::parse("https://example.com/").unwrap();
        assert!(discover_media(&html, &base).is_empty());
    }
}
