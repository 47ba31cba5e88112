//! Hand-rolled k-means dominant-color extraction on a thumbnail (spec.md
//! §4.7 step 3). No crate in the reference pack offers this; k-means over
//! RGB is simple enough to own directly.

use image::{DynamicImage, GenericImageView};
use mwi_core::DominantColor;

const THUMBNAIL_SIDE: u32 = 64;
const MAX_ITERATIONS: usize = 10;

pub fn dominant_colors(image: &DynamicImage, k: usize) -> Vec<DominantColor> {
    let thumbnail = image.thumbnail(THUMBNAIL_SIDE, THUMBNAIL_SIDE).to_rgb8();
    let pixels: Vec<(f32, f32, f32)> = thumbnail
        .pixels()
        .map(|p| (p[0] as f32, p[1] as f32, p[2] as f32))
        .collect();

    if pixels.is_empty() || k == 0 {
        return Vec::new();
    }
    let k = k.min(pixels.len());

    let mut centroids: Vec<(f32, f32, f32)> = (0..k)
        .map(|i| pixels[(i * pixels.len()) / k])
        .collect();
    let mut assignments = vec![0usize; pixels.len()];

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (idx, pixel) in pixels.iter().enumerate() {
            let nearest = nearest_centroid(*pixel, &centroids);
            if assignments[idx] != nearest {
                assignments[idx] = nearest;
                changed = true;
            }
        }

        let mut sums = vec![(0f32, 0f32, 0f32, 0u32); k];
        for (idx, pixel) in pixels.iter().enumerate() {
            let cluster = assignments[idx];
            sums[cluster].0 += pixel.0;
            sums[cluster].1 += pixel.1;
            sums[cluster].2 += pixel.2;
            sums[cluster].3 += 1;
        }
        for (i, (r, g, b, count)) in sums.into_iter().enumerate() {
            if count > 0 {
                centroids[i] = (r / count as f32, g / count as f32, b / count as f32);
            }
        }

        if !changed {
            break;
        }
    }

    let mut counts = vec![0u32; k];
    for &cluster in &assignments {
        counts[cluster] += 1;
    }

    let total = pixels.len() as f32;
    let mut colors: Vec<DominantColor> = centroids
        .into_iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|((r, g, b), count)| {
            let rgb = (r.round() as u8, g.round() as u8, b.round() as u8);
            let hsv = rgb_to_hsv(rgb);
            DominantColor {
                rgb,
                hex: format!("#{:02x}{:02x}{:02x}", rgb.0, rgb.1, rgb.2),
                hsv,
                name: approximate_name(hsv),
                percentage: 100.0 * count as f32 / total,
            }
        })
        .collect();

    colors.sort_by(|a, b| b.percentage.partial_cmp(&a.percentage).unwrap());
    colors
}

fn nearest_centroid(pixel: (f32, f32, f32), centroids: &[(f32, f32, f32)]) -> usize {
    centroids
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| distance2(pixel, **a).partial_cmp(&distance2(pixel, **b)).unwrap())
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn distance2(a: (f32, f32, f32), b: (f32, f32, f32)) -> f32 {
    let dr = a.0 - b.0;
    let dg = a.1 - b.1;
    let db = a.2 - b.2;
    dr * dr + dg * dg + db * db
}

fn rgb_to_hsv((r, g, b): (u8, u8, u8)) -> (f32, f32, f32) {
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };
    (hue, saturation, max)
}

fn approximate_name(hsv: (f32, f32, f32)) -> String {
    let (hue, saturation, value) = hsv;
    if value < 0.12 {
        return "black".to_string();
    }
    if saturation < 0.12 {
        return if value > 0.85 { "white".to_string() } else { "gray".to_string() };
    }
    match hue as u32 {
        0..=14 | 345..=360 => "red",
        15..=44 => "orange",
        45..=64 => "yellow",
        65..=170 => "green",
        171..=200 => "cyan",
        201..=255 => "blue",
        256..=290 => "purple",
        291..=344 => "pink",
        _ => "unknown",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    #[test]
    fn solid_red_image_yields_single_dominant_red_cluster() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_fn(32, 32, |_, _| Rgba([220, 20, 20, 255])));
        let colors = dominant_colors(&img, 5);
        assert!(!colors.is_empty());
        assert_eq!(colors[0].name, "red");
        assert!(colors[0].percentage > 50.0);
    }

    #[test]
    fn two_color_image_yields_two_clusters_summing_to_full_percentage() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_fn(32, 32, |x, _| {
            if x < 16 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        }));
        let colors = dominant_colors(&img, 2);
        let total: f32 = colors.iter().map(|c| c.percentage).sum();
        assert!((total - 100.0).abs() < 1.0);
    }

    #[test]
    fn zero_k_returns_empty() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_fn(4, 4, |_, _| Rgba([1, 2, 3, 255])));
        assert!(dominant_colors(&img, 0).is_empty());
    }
}
