//! Summed-area tables
//!
//! Window sums in O(1) for the correlation and SSIM computations. Tables are
//! `(width + 1) x (height + 1)` with a zero first row and column.

use super::grayscale::GrayPlane;

/// Summed-area table over arbitrary per-pixel values
#[derive(Debug, Clone)]
pub struct IntegralImage {
    stride: usize,
    table: Vec<f64>,
}

impl IntegralImage {
    /// Table of the plane's samples
    pub fn of(plane: &GrayPlane) -> Self {
        Self::from_fn(plane.width(), plane.height(), |x, y| plane.get(x, y))
    }

    /// Table of squared samples
    pub fn of_squares(plane: &GrayPlane) -> Self {
        Self::from_fn(plane.width(), plane.height(), |x, y| {
            let v = plane.get(x, y);
            v * v
        })
    }

    /// Table of the element-wise product of two equally sized planes
    pub fn of_products(a: &GrayPlane, b: &GrayPlane) -> Self {
        debug_assert_eq!((a.width(), a.height()), (b.width(), b.height()));
        Self::from_fn(a.width(), a.height(), |x, y| a.get(x, y) * b.get(x, y))
    }

    fn from_fn(width: usize, height: usize, value: impl Fn(usize, usize) -> f64) -> Self {
        let stride = width + 1;
        let mut table = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0.0;
            for x in 0..width {
                row_sum += value(x, y);
                table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
            }
        }
        Self { stride, table }
    }

    /// Sum over the window with top-left (x, y) and size w x h
    #[inline]
    pub fn window_sum(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        let s = self.stride;
        self.table[(y + h) * s + x + w] - self.table[y * s + x + w] - self.table[(y + h) * s + x]
            + self.table[y * s + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_sum() {
        let plane = GrayPlane::new(3, 3, (1..=9).map(|v| v as f64).collect()).unwrap();
        let ii = IntegralImage::of(&plane);
        assert_eq!(ii.window_sum(0, 0, 3, 3), 45.0);
        assert_eq!(ii.window_sum(1, 1, 2, 2), 5.0 + 6.0 + 8.0 + 9.0);
        assert_eq!(ii.window_sum(2, 0, 1, 1), 3.0);
    }

    #[test]
    fn test_squares_and_products() {
        let a = GrayPlane::new(2, 1, vec![2.0, 3.0]).unwrap();
        let b = GrayPlane::new(2, 1, vec![4.0, 5.0]).unwrap();
        assert_eq!(IntegralImage::of_squares(&a).window_sum(0, 0, 2, 1), 13.0);
        assert_eq!(IntegralImage::of_products(&a, &b).window_sum(0, 0, 2, 1), 23.0);
    }
}
