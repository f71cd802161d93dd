//! Edge strength via Sobel gradient magnitude
//!
//! Splices and pasted text leave unnaturally hard boundaries. The mean
//! gradient magnitude over the whole plane rises when such edges dominate.
//!
//! Borders use replicate padding.

use crate::preprocessing::grayscale::GrayPlane;

/// Mean Sobel gradient magnitude `sqrt(gx^2 + gy^2)` over all pixels
///
/// # Arguments
///
/// * `plane` - Grayscale plane in [0, 255]
///
/// # Returns
///
/// Mean magnitude; 0.0 for an empty plane
pub fn edge_strength(plane: &GrayPlane) -> f64 {
    let (w, h) = (plane.width(), plane.height());
    if w == 0 || h == 0 {
        return 0.0;
    }

    let mut total = 0.0;
    for y in 0..h as isize {
        for x in 0..w as isize {
            let p = |dx: isize, dy: isize| plane.get_clamped(x + dx, y + dy);

            let gx = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
            let gy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));

            total += gx.hypot(gy);
        }
    }

    let mean = total / (w * h) as f64;
    log::debug!("Edge strength: {:.3} over {}x{}", mean, w, h);
    mean
}
