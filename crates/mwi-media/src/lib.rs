//! Media Analyzer: image download, decode, perceptual hash, EXIF, dominant
//! colors, and content-hint classification (spec.md §4.7).

mod analyze;
mod color;
mod deny;
mod download;
mod exif;
mod hints;
mod phash;

pub use analyze::{AnalyzeFilter, AnalyzeStats, MediaAnalyzer};
pub use color::dominant_colors;
pub use deny::is_denied;
pub use download::{download_with_retry, DownloadError};
pub use hints::classify as classify_content_hints;
pub use phash::{dhash, hamming_distance};
