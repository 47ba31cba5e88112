//! Deterministic content-hint classification via entropy and edge density
//! (spec.md §4.7 step 3, "Classify simple content hints").

use image::{DynamicImage, GenericImageView};

/// Coarse content tags derived from simple statistics on the decoded image.
/// Not a learned classifier — deterministic thresholds only.
#[must_use]
pub fn classify(image: &DynamicImage) -> Vec<String> {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();
    if width < 2 || height < 2 {
        return Vec::new();
    }

    let entropy = grayscale_entropy(&gray);
    let edge_density = edge_density(&gray);

    let mut tags = Vec::new();
    let aspect = width as f32 / height as f32;

    if entropy < 4.0 && edge_density < 0.05 {
        tags.push("logo".to_string());
    }
    if edge_density > 0.35 && entropy > 5.5 {
        tags.push("text".to_string());
    }
    if (0.9..=2.5).contains(&aspect) && edge_density > 0.15 && edge_density <= 0.35 {
        tags.push("screenshot".to_string());
    }
    tags
}

fn grayscale_entropy(gray: &image::GrayImage) -> f32 {
    let mut histogram = [0u32; 256];
    for pixel in gray.pixels() {
        histogram[pixel[0] as usize] += 1;
    }
    let total = gray.width() as f32 * gray.height() as f32;
    histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f32 / total;
            -p * p.log2()
        })
        .sum()
}

fn edge_density(gray: &image::GrayImage) -> f32 {
    let (width, height) = gray.dimensions();
    if width < 2 || height < 2 {
        return 0.0;
    }
    let mut edge_pixels = 0u32;
    for y in 0..height - 1 {
        for x in 0..width - 1 {
            let center = gray.get_pixel(x, y)[0] as i16;
            let right = gray.get_pixel(x + 1, y)[0] as i16;
            let down = gray.get_pixel(x, y + 1)[0] as i16;
            if (center - right).abs() > 30 || (center - down).abs() > 30 {
                edge_pixels += 1;
            }
        }
    }
    edge_pixels as f32 / ((width - 1) * (height - 1)) as f32
}
