//! JPEG recompression round trips
//!
//! Both the error-level analysis and the SSIM artifact score compare an image
//! against a deliberately re-encoded copy of itself.

use crate::error::KycError;
use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, ImageFormat, RgbImage};

/// Encode RGB pixels as JPEG at `quality` and decode them back
///
/// # Errors
///
/// Returns `KycError::InvalidInput` for a quality outside [1, 100] and
/// `KycError::DecodingError` if the codec fails
pub fn recompress_rgb(image: &RgbImage, quality: u8) -> Result<RgbImage, KycError> {
    let encoded = encode_jpeg(image, quality)?;
    let decoded = image::load_from_memory_with_format(&encoded, ImageFormat::Jpeg)?;
    Ok(decoded.to_rgb8())
}

/// Encode a grayscale image as JPEG at `quality` and decode it back
pub fn recompress_luma(image: &GrayImage, quality: u8) -> Result<GrayImage, KycError> {
    check_quality(quality)?;
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality).encode_image(image)?;
    let decoded = image::load_from_memory_with_format(&buffer, ImageFormat::Jpeg)?;
    Ok(decoded.to_luma8())
}

/// Encode RGB pixels as JPEG bytes
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, KycError> {
    check_quality(quality)?;
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality).encode_image(image)?;
    log::debug!(
        "Re-encoded {}x{} image at quality {} ({} bytes)",
        image.width(),
        image.height(),
        quality,
        buffer.len()
    );
    Ok(buffer)
}

fn check_quality(quality: u8) -> Result<(), KycError> {
    if !(1..=100).contains(&quality) {
        return Err(KycError::InvalidInput(format!(
            "JPEG quality must be in [1, 100], got {}",
            quality
        )));
    }
    Ok(())
}
