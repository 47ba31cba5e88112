//! Perceptual hashing via the classic dHash (difference hash) algorithm: a
//! 9x8 grayscale downscale compared column-to-column, yielding a 64-bit
//! fingerprint robust to re-encoding (spec.md §4.7 step 3, §8 property 8).

use image::{DynamicImage, GenericImageView};

const HASH_WIDTH: u32 = 9;
const HASH_HEIGHT: u32 = 8;

/// Compute the hex-encoded 64-bit difference hash of `image`.
#[must_use]
pub fn dhash(image: &DynamicImage) -> String {
    let small = image.resize_exact(HASH_WIDTH, HASH_HEIGHT, image::imageops::FilterType::Triangle);
    let gray = small.to_luma8();

    let mut bits: u64 = 0;
    for y in 0..HASH_HEIGHT {
        for x in 0..HASH_WIDTH - 1 {
            let left = gray.get_pixel(x, y)[0];
            let right = gray.get_pixel(x + 1, y)[0];
            bits <<= 1;
            if left > right {
                bits |= 1;
            }
        }
    }
    format!("{bits:016x}")
}

/// Hamming distance between two hex-encoded 64-bit hashes.
#[must_use]
pub fn hamming_distance(a: &str, b: &str) -> Option<u32> {
    let a = u64::from_str_radix(a, 16).ok()?;
    let b = u64::from_str_radix(b, 16).ok()?;
    Some((a ^ b).count_ones())
}
