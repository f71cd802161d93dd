//! Grayscale planes for pixel-level analysis
//!
//! Luma uses the BT.601 weights (0.299, 0.587, 0.114), the same conversion
//! most forensic tooling applies before gradient and correlation work.

use crate::error::KycError;
use image::{GrayImage, Luma, RgbImage};

/// Single-channel image with `f64` samples in [0, 255], row-major
#[derive(Debug, Clone, PartialEq)]
pub struct GrayPlane {
    width: usize,
    height: usize,
    pixels: Vec<f64>,
}

impl GrayPlane {
    /// Build a plane from raw samples
    ///
    /// # Errors
    ///
    /// Returns `KycError::InvalidInput` if `pixels.len() != width * height`
    pub fn new(width: usize, height: usize, pixels: Vec<f64>) -> Result<Self, KycError> {
        if pixels.len() != width * height {
            return Err(KycError::InvalidInput(format!(
                "Plane size mismatch: {}x{} needs {} samples, got {}",
                width,
                height,
                width * height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Convert an RGB image with BT.601 luma weights
    pub fn from_rgb(image: &RgbImage) -> Self {
        let pixels = image
            .pixels()
            .map(|p| {
                let [r, g, b] = p.0;
                0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
            })
            .collect();
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            pixels,
        }
    }

    /// Quantize to an 8-bit grayscale image (rounded, clamped)
    pub fn to_luma8(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let v = self.get(x as usize, y as usize).round().clamp(0.0, 255.0);
            Luma([v as u8])
        })
    }

    /// Rows `y0..y1` of an 8-bit grayscale image
    pub fn from_luma_rows(image: &GrayImage, y0: usize, y1: usize) -> Self {
        let width = image.width() as usize;
        let y1 = y1.min(image.height() as usize);
        let y0 = y0.min(y1);
        Self {
            width,
            height: y1 - y0,
            pixels: image.as_raw()[y0 * width..y1 * width]
                .iter()
                .map(|&v| v as f64)
                .collect(),
        }
    }

    /// Copy of rows `y0..y1`
    pub fn rows(&self, y0: usize, y1: usize) -> GrayPlane {
        let y1 = y1.min(self.height);
        let y0 = y0.min(y1);
        GrayPlane {
            width: self.width,
            height: y1 - y0,
            pixels: self.pixels[y0 * self.width..y1 * self.width].to_vec(),
        }
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major samples
    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }

    /// Sample at (x, y); caller guarantees bounds
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.pixels[y * self.width + x]
    }

    /// Sample with coordinates clamped to the border (replicate padding)
    #[inline]
    pub fn get_clamped(&self, x: isize, y: isize) -> f64 {
        let cx = x.clamp(0, self.width as isize - 1) as usize;
        let cy = y.clamp(0, self.height as isize - 1) as usize;
        self.get(cx, cy)
    }

    /// Area-average downscale so the longer side is at most `max_dimension`
    ///
    /// Returns a copy when the plane already fits.
    pub fn downscale_to(&self, max_dimension: usize) -> GrayPlane {
        let longest = self.width.max(self.height);
        if max_dimension == 0 || longest <= max_dimension {
            return self.clone();
        }

        let scale = max_dimension as f64 / longest as f64;
        let new_w = ((self.width as f64 * scale).round() as usize).max(1);
        let new_h = ((self.height as f64 * scale).round() as usize).max(1);

        let mut pixels = Vec::with_capacity(new_w * new_h);
        for ny in 0..new_h {
            let y0 = ny * self.height / new_h;
            let y1 = ((ny + 1) * self.height / new_h).max(y0 + 1);
            for nx in 0..new_w {
                let x0 = nx * self.width / new_w;
                let x1 = ((nx + 1) * self.width / new_w).max(x0 + 1);

                let mut sum = 0.0;
                for y in y0..y1 {
                    let row = &self.pixels[y * self.width..(y + 1) * self.width];
                    sum += row[x0..x1].iter().sum::<f64>();
                }
                pixels.push(sum / ((y1 - y0) * (x1 - x0)) as f64);
            }
        }

        log::debug!(
            "Downscaled plane {}x{} -> {}x{}",
            self.width,
            self.height,
            new_w,
            new_h
        );

        GrayPlane {
            width: new_w,
            height: new_h,
            pixels,
        }
    }
}
