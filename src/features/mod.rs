//! Forensic feature extraction modules
//!
//! This module contains the numeric measurements behind the deterministic
//! analyzers:
//! - Error-level analysis (recompression difference)
//! - Edge strength (Sobel gradient magnitude)
//! - Noise residual (median-filter residual)
//! - Clone detection (block self-similarity)
//! - Structural similarity (SSIM) under recompression

pub mod cloning;
pub mod edges;
pub mod ela;
pub mod noise;
pub mod ssim;
