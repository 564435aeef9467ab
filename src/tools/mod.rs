//! Helpers shared by the CLI, benches and integration tests: image IO and
//! synthetic fixtures.

use crate::models::BitMatrix;
use image::{GrayImage, Luma};
use std::path::Path;

/// Synthetic symbol rendering
pub mod synth;

/// Luma at or below this value counts as a dark pixel when loading images
pub const DARK_THRESHOLD: u8 = 127;

/// Load an already binarized image as a bit matrix.
///
/// Pixels are converted to luma first; anything at or below
/// [`DARK_THRESHOLD`] is dark.
pub fn load_bit_matrix<P: AsRef<Path>>(path: P) -> Result<BitMatrix, image::ImageError> {
    let gray = image::open(path)?.to_luma8();
    Ok(from_gray(&gray))
}

/// Threshold a grayscale image into a bit matrix
pub fn from_gray(gray: &GrayImage) -> BitMatrix {
    let (width, height) = gray.dimensions();
    let mut matrix = BitMatrix::new(width as usize, height as usize);
    for (x, y, pixel) in gray.enumerate_pixels() {
        if pixel.0[0] <= DARK_THRESHOLD {
            matrix.fill_rect(x as usize, y as usize, 1, 1, true);
        }
    }
    matrix
}

/// Render a bit matrix as black-on-white grayscale
pub fn to_gray(matrix: &BitMatrix) -> GrayImage {
    GrayImage::from_fn(matrix.width() as u32, matrix.height() as u32, |x, y| {
        if matrix.pixel(x as i32, y as i32) {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

/// Write a bit matrix as a PNG (or any format `image` infers from the path)
pub fn save_bit_matrix<P: AsRef<Path>>(matrix: &BitMatrix, path: P) -> Result<(), image::ImageError> {
    to_gray(matrix).save(path)
}

/// Summary statistics for a binary matrix.
#[derive(Debug, Clone, Copy)]
pub struct BinaryStats {
    /// Count of dark pixels.
    pub dark_pixels: usize,
    /// Total pixels in the matrix.
    pub total_pixels: usize,
    /// Ratio of dark pixels to total pixels.
    pub dark_ratio: f64,
}

/// Compute dark pixel stats for a binary matrix.
pub fn binary_stats(matrix: &BitMatrix) -> BinaryStats {
    let dark = matrix.count_dark();
    let total = matrix.width() * matrix.height();
    let ratio = if total == 0 {
        0.0
    } else {
        dark as f64 / total as f64
    };
    BinaryStats {
        dark_pixels: dark,
        total_pixels: total,
        dark_ratio: ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_round_trip() {
        let mut m = BitMatrix::new(5, 3);
        m.set(1, 1, true).unwrap();
        m.set(4, 2, true).unwrap();
        let back = from_gray(&to_gray(&m));
        assert_eq!(back, m);
    }

    #[test]
    fn test_binary_stats() {
        let mut m = BitMatrix::new(4, 4);
        m.fill_rect(0, 0, 2, 2, true);
        let stats = binary_stats(&m);
        assert_eq!(stats.dark_pixels, 4);
        assert_eq!(stats.total_pixels, 16);
        assert!((stats.dark_ratio - 0.25).abs() < 1e-9);
    }
}
