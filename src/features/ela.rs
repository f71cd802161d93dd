//! Error-level analysis
//!
//! Regions pasted or retouched after the last JPEG save recompress
//! differently from the rest of the image. Re-encoding at a known quality and
//! diffing against the original exposes those regions as high error levels.
//!
//! Algorithm:
//! 1. Re-encode the RGB image as JPEG at a fixed quality
//! 2. Decode the copy and take the per-channel absolute difference
//! 3. Report the maximum and mean difference (the "error level")

use crate::error::KycError;
use crate::preprocessing::recompress::recompress_rgb;
use image::{Rgb, RgbImage};

/// Error-level measurement for one image
#[derive(Debug, Clone)]
pub struct ErrorLevel {
    /// Largest per-channel difference (0-255)
    pub max_difference: u8,

    /// Mean per-channel difference
    pub mean_difference: f64,

    /// Per-pixel, per-channel absolute difference image
    pub difference: RgbImage,
}

/// Compute the error level of an image against its JPEG re-encode
///
/// # Arguments
///
/// * `image` - Original RGB pixels
/// * `quality` - JPEG quality of the re-encode (typically 90)
///
/// # Errors
///
/// Returns `KycError` if the JPEG round trip fails
pub fn compute_error_level(image: &RgbImage, quality: u8) -> Result<ErrorLevel, KycError> {
    let recompressed = recompress_rgb(image, quality)?;
    let difference = absolute_difference(image, &recompressed)?;

    let raw = difference.as_raw();
    let max_difference = raw.iter().copied().max().unwrap_or(0);
    let mean_difference = if raw.is_empty() {
        0.0
    } else {
        raw.iter().map(|&v| v as f64).sum::<f64>() / raw.len() as f64
    };

    log::debug!(
        "Error level at quality {}: max={}, mean={:.3}",
        quality,
        max_difference,
        mean_difference
    );

    Ok(ErrorLevel {
        max_difference,
        mean_difference,
        difference,
    })
}

/// Per-channel absolute difference of two equally sized images
pub fn absolute_difference(a: &RgbImage, b: &RgbImage) -> Result<RgbImage, KycError> {
    if a.dimensions() != b.dimensions() {
        return Err(KycError::ProcessingError(format!(
            "Dimension mismatch: {:?} vs {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }

    let mut out = RgbImage::new(a.width(), a.height());
    for ((pa, pb), po) in a.pixels().zip(b.pixels()).zip(out.pixels_mut()) {
        *po = Rgb([
            pa.0[0].abs_diff(pb.0[0]),
            pa.0[1].abs_diff(pb.0[1]),
            pa.0[2].abs_diff(pb.0[2]),
        ]);
    }
    Ok(out)
}

/// Brightness-scaled difference image for visual review
///
/// Scales by `255 / max_difference` (1 when the maximum is zero) so the
/// strongest error maps to full brightness.
pub fn render_error_level(level: &ErrorLevel) -> RgbImage {
    let scale = if level.max_difference == 0 {
        1.0
    } else {
        255.0 / level.max_difference as f64
    };

    let mut out = level.difference.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as f64 * scale).round().min(255.0) as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_difference() {
        let a = RgbImage::from_pixel(2, 1, Rgb([10, 200, 30]));
        let b = RgbImage::from_pixel(2, 1, Rgb([15, 100, 30]));
        let diff = absolute_difference(&a, &b).unwrap();
        assert_eq!(diff.get_pixel(0, 0).0, [5, 100, 0]);
    }

    #[test]
    fn test_absolute_difference_mismatch() {
        let a = RgbImage::new(2, 2);
        let b = RgbImage::new(3, 2);
        assert!(absolute_difference(&a, &b).is_err());
    }

    #[test]
    fn test_flat_image_has_low_error_level() {
        let img = RgbImage::from_pixel(64, 64, Rgb([128, 128, 128]));
        let level = compute_error_level(&img, 90).unwrap();
        assert!(level.max_difference < 10, "got {}", level.max_difference);
    }

    #[test]
    fn test_sharp_noise_has_higher_error_level_than_flat() {
        let flat = RgbImage::from_pixel(64, 64, Rgb([128, 128, 128]));
        // Checkerboard of saturated colours recompresses poorly
        let noisy = RgbImage::from_fn(64, 64, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 0, 255])
            } else {
                Rgb([0, 255, 0])
            }
        });

        let flat_level = compute_error_level(&flat, 90).unwrap();
        let noisy_level = compute_error_level(&noisy, 90).unwrap();
        assert!(noisy_level.max_difference > flat_level.max_difference);
        assert!(noisy_level.mean_difference > flat_level.mean_difference);
    }

    #[test]
    fn test_render_scales_to_full_brightness() {
        let difference = RgbImage::from_fn(2, 1, |x, _| Rgb([if x == 0 { 51 } else { 17 }, 0, 0]));
        let level = ErrorLevel {
            max_difference: 51,
            mean_difference: 11.3,
            difference,
        };
        let rendered = render_error_level(&level);
        assert_eq!(rendered.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(rendered.get_pixel(1, 0).0, [85, 0, 0]);
    }
}
