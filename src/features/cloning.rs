//! Clone (copy-move) detection via block self-similarity
//!
//! A copy-moved region (duplicated photo, stamped-over digits) correlates
//! almost perfectly with its source. Each non-overlapping block of the plane
//! is used as a template and matched against every other position with
//! zero-mean normalized cross-correlation; the clone score is the best match
//! found for any block.
//!
//! Algorithm:
//! 1. Split the plane into non-overlapping `block_size` blocks (full blocks only)
//! 2. For each block, compute NCC against all positions whose window does not
//!    overlap the block itself (so the trivial self-match and its near
//!    shifts never count)
//! 3. Flat (zero-variance) blocks and windows are skipped; NCC is undefined there
//! 4. Return the maximum NCC over all blocks, or 0.0 when there are no blocks
//!
//! Window statistics come from summed-area tables; only the cross term is
//! computed per position. Blocks are matched in parallel.

use crate::preprocessing::grayscale::GrayPlane;
use crate::preprocessing::integral::IntegralImage;
use rayon::prelude::*;

/// Numerical stability epsilon for variance checks
const EPSILON: f64 = 1e-9;

/// Best NCC between any block and any non-overlapping position
///
/// # Arguments
///
/// * `plane` - Grayscale plane
/// * `block_size` - Block side in pixels (typically 50)
///
/// # Returns
///
/// Clone score in [-1.0, 1.0]; 0.0 when the plane is smaller than one block
/// or no comparable position exists
pub fn clone_score(plane: &GrayPlane, block_size: usize) -> f64 {
    let (w, h) = (plane.width(), plane.height());
    if block_size == 0 || w < block_size || h < block_size {
        log::debug!(
            "Plane {}x{} smaller than clone block {}, no blocks to match",
            w,
            h,
            block_size
        );
        return 0.0;
    }

    let sums = IntegralImage::of(plane);
    let squares = IntegralImage::of_squares(plane);
    let n = (block_size * block_size) as f64;

    let blocks: Vec<(usize, usize)> = (0..=h - block_size)
        .step_by(block_size)
        .flat_map(|by| {
            (0..=w - block_size)
                .step_by(block_size)
                .map(move |bx| (bx, by))
        })
        .collect();

    let best = blocks
        .par_iter()
        .filter_map(|&(bx, by)| best_match(plane, &sums, &squares, n, block_size, bx, by))
        .reduce(|| f64::NEG_INFINITY, f64::max);

    let score = if best.is_finite() { best } else { 0.0 };
    log::debug!(
        "Clone score: {:.4} ({} blocks of {}px over {}x{})",
        score,
        blocks.len(),
        block_size,
        w,
        h
    );
    score
}

fn best_match(
    plane: &GrayPlane,
    sums: &IntegralImage,
    squares: &IntegralImage,
    n: f64,
    size: usize,
    bx: usize,
    by: usize,
) -> Option<f64> {
    let block_sum = sums.window_sum(bx, by, size, size);
    let block_var = squares.window_sum(bx, by, size, size) - block_sum * block_sum / n;
    if block_var <= EPSILON {
        return None;
    }

    let block_mean = block_sum / n;
    let mut template = Vec::with_capacity(size * size);
    for y in by..by + size {
        for x in bx..bx + size {
            template.push(plane.get(x, y) - block_mean);
        }
    }
    let template_norm = block_var.sqrt();

    let width = plane.width();
    let pixels = plane.pixels();
    let mut best: Option<f64> = None;

    for y in 0..=plane.height() - size {
        for x in 0..=width - size {
            if x.abs_diff(bx) < size && y.abs_diff(by) < size {
                continue;
            }

            let win_sum = sums.window_sum(x, y, size, size);
            let win_var = squares.window_sum(x, y, size, size) - win_sum * win_sum / n;
            if win_var <= EPSILON {
                continue;
            }

            // The zero-mean template makes the window mean drop out of the cross term
            let mut cross = 0.0;
            for (row, t_row) in template.chunks_exact(size).enumerate() {
                let start = (y + row) * width + x;
                cross += t_row
                    .iter()
                    .zip(&pixels[start..start + size])
                    .map(|(t, p)| t * p)
                    .sum::<f64>();
            }

            let ncc = (cross / (template_norm * win_var.sqrt())).clamp(-1.0, 1.0);
            best = Some(best.map_or(ncc, |b: f64| b.max(ncc)));
        }
    }

    best
}
