//! Structural similarity (SSIM)
//!
//! Mean SSIM over all 7x7 windows fully inside the image, uniform weights,
//! sample covariance, `K1 = 0.01`, `K2 = 0.03`, data range 255.
//!
//! Summed-area tables are built for one band of window rows at a time, so
//! memory stays proportional to the band rather than the photograph.
//!
//! # Reference
//!
//! Wang, Z., Bovik, A. C., Sheikh, H. R., & Simoncelli, E. P. (2004).
//! Image Quality Assessment: From Error Visibility to Structural Similarity.
//! *IEEE Transactions on Image Processing*, 13(4), 600-612.

use crate::error::KycError;
use crate::preprocessing::grayscale::GrayPlane;
use crate::preprocessing::integral::IntegralImage;
use crate::preprocessing::recompress::recompress_luma;

/// Window side
pub const WINDOW_SIZE: usize = 7;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// Window rows evaluated per band of summed-area tables
const BAND_ROWS: usize = 128;

/// Mean SSIM between two equally sized planes
///
/// # Errors
///
/// Returns `KycError::InvalidInput` if the planes differ in size or are
/// smaller than the 7x7 window
pub fn mean_ssim(a: &GrayPlane, b: &GrayPlane) -> Result<f64, KycError> {
    let (w, h) = (a.width(), a.height());
    if (w, h) != (b.width(), b.height()) {
        return Err(KycError::InvalidInput(format!(
            "SSIM inputs differ in size: {}x{} vs {}x{}",
            w,
            h,
            b.width(),
            b.height()
        )));
    }
    if w < WINDOW_SIZE || h < WINDOW_SIZE {
        return Err(KycError::InvalidInput(format!(
            "Image {}x{} is smaller than the {}x{} SSIM window",
            w, h, WINDOW_SIZE, WINDOW_SIZE
        )));
    }

    Ok(banded_mean_ssim(w, h, BAND_ROWS, |y0, y1| {
        (a.rows(y0, y1), b.rows(y0, y1))
    }))
}

/// Mean SSIM of a `width x height` pair whose row bands come from `band`
///
/// `band(y0, y1)` returns rows `y0..y1` of both images.
fn banded_mean_ssim(
    width: usize,
    height: usize,
    band_rows: usize,
    band: impl Fn(usize, usize) -> (GrayPlane, GrayPlane),
) -> f64 {
    let last_top = height - WINDOW_SIZE;
    let band_rows = band_rows.max(1);

    let mut total = 0.0;
    let mut count = 0usize;
    let mut top = 0;
    while top <= last_top {
        let window_rows = band_rows.min(last_top - top + 1);
        let (a, b) = band(top, top + window_rows + WINDOW_SIZE - 1);
        total += window_ssim_sum(&a, &b);
        count += window_rows * (width - WINDOW_SIZE + 1);
        top += window_rows;
    }

    total / count as f64
}

/// Sum of SSIM over every window fully inside the band
fn window_ssim_sum(a: &GrayPlane, b: &GrayPlane) -> f64 {
    let (w, h) = (a.width(), a.height());
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);
    let n = (WINDOW_SIZE * WINDOW_SIZE) as f64;
    let cov_norm = n / (n - 1.0);

    let sum_a = IntegralImage::of(a);
    let sum_b = IntegralImage::of(b);
    let sq_a = IntegralImage::of_squares(a);
    let sq_b = IntegralImage::of_squares(b);
    let prod = IntegralImage::of_products(a, b);

    let mut total = 0.0;
    for y in 0..=h - WINDOW_SIZE {
        for x in 0..=w - WINDOW_SIZE {
            let ws = |ii: &IntegralImage| ii.window_sum(x, y, WINDOW_SIZE, WINDOW_SIZE) / n;

            let ux = ws(&sum_a);
            let uy = ws(&sum_b);
            let vx = cov_norm * (ws(&sq_a) - ux * ux);
            let vy = cov_norm * (ws(&sq_b) - uy * uy);
            let vxy = cov_norm * (ws(&prod) - ux * uy);

            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
        }
    }
    total
}

/// Structural loss `1 - SSIM` of the plane against its JPEG recompression
///
/// # Arguments
///
/// * `plane` - Grayscale plane
/// * `quality` - JPEG quality of the synthetic recompression (typically 50)
pub fn recompression_loss(plane: &GrayPlane, quality: u8) -> Result<f64, KycError> {
    let original = plane.to_luma8();
    let recompressed = recompress_luma(&original, quality)?;

    let (w, h) = (plane.width(), plane.height());
    if w < WINDOW_SIZE || h < WINDOW_SIZE {
        return Err(KycError::InvalidInput(format!(
            "Image {}x{} is smaller than the {}x{} SSIM window",
            w, h, WINDOW_SIZE, WINDOW_SIZE
        )));
    }

    let ssim = banded_mean_ssim(w, h, BAND_ROWS, |y0, y1| {
        (
            GrayPlane::from_luma_rows(&original, y0, y1),
            GrayPlane::from_luma_rows(&recompressed, y0, y1),
        )
    });
    log::debug!("SSIM under quality {} recompression: {:.4}", quality, ssim);
    Ok(1.0 - ssim)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> GrayPlane {
        GrayPlane::new(
            width,
            height,
            (0..width * height)
                .map(|i| ((i % width) * 3 + (i / width) * 2) as f64 % 256.0)
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_identical_planes() {
        let plane = gradient(20, 16);
        let ssim = mean_ssim(&plane, &plane).unwrap();
        assert!((ssim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_plane_is_dissimilar() {
        let plane = gradient(20, 16);
        let inverted =
            GrayPlane::new(20, 16, plane.pixels().iter().map(|v| 255.0 - v).collect()).unwrap();
        assert!(mean_ssim(&plane, &inverted).unwrap() < 0.5);
    }

    #[test]
    fn test_too_small_or_mismatched() {
        let small = GrayPlane::new(5, 5, vec![0.0; 25]).unwrap();
        assert!(mean_ssim(&small, &small).is_err());

        let a = gradient(10, 10);
        let b = gradient(12, 10);
        assert!(mean_ssim(&a, &b).is_err());
    }

    #[test]
    fn test_banding_matches_single_pass() {
        let a = gradient(23, 41);
        let b = GrayPlane::new(
            23,
            41,
            a.pixels().iter().enumerate().map(|(i, v)| (v + (i % 7) as f64 * 9.0) % 256.0).collect(),
        )
        .unwrap();
        let bands = |y0: usize, y1: usize| (a.rows(y0, y1), b.rows(y0, y1));

        let single = banded_mean_ssim(23, 41, 1000, bands);
        for band_rows in [1, 4, 10, 35] {
            let banded = banded_mean_ssim(23, 41, band_rows, bands);
            assert!((banded - single).abs() < 1e-9, "band {} gave {} vs {}", band_rows, banded, single);
        }
        assert!(single < 1.0);
    }

    #[test]
    fn test_recompression_loss_is_small_for_smooth_image() {
        let plane = gradient(32, 32);
        let loss = recompression_loss(&plane, 50).unwrap();
        assert!(loss > -1e-9 && loss < 0.2, "got {}", loss);
    }
}
