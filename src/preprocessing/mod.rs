//! Image preprocessing modules
//!
//! This module contains utilities for preparing document images for the
//! numeric analyzers:
//! - Grayscale planes (BT.601 luma, f64 samples) and downscaling
//! - JPEG recompression round trips
//! - Summed-area tables for windowed statistics

pub mod grayscale;
pub mod integral;
pub mod recompress;
