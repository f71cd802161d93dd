//! Noise residual magnitude
//!
//! A camera sensor leaves a fairly uniform noise floor; heavy retouching,
//! resampling or composited regions from other sources shift it. The residual
//! is what remains after removing local structure with a 3x3 median filter.
//!
//! The measurement is deterministic: identical pixels always give the same
//! residual.

use crate::preprocessing::grayscale::GrayPlane;

/// Mean absolute difference between the plane and its 3x3 median filter
///
/// Borders use replicate padding. Returns 0.0 for an empty plane.
pub fn noise_residual(plane: &GrayPlane) -> f64 {
    let (w, h) = (plane.width(), plane.height());
    if w == 0 || h == 0 {
        return 0.0;
    }

    let mut window = [0.0f64; 9];
    let mut total = 0.0;
    for y in 0..h as isize {
        for x in 0..w as isize {
            let mut i = 0;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    window[i] = plane.get_clamped(x + dx, y + dy);
                    i += 1;
                }
            }
            window.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let median = window[4];

            total += (plane.get(x as usize, y as usize) - median).abs();
        }
    }

    let mean = total / (w * h) as f64;
    log::debug!("Noise residual: {:.3} over {}x{}", mean, w, h);
    mean
}
