//! Document image decoding

use crate::error::KycError;
use image::{DynamicImage, ImageFormat, RgbImage};

/// Decode document bytes into an image
///
/// # Arguments
///
/// * `bytes` - Encoded image (JPEG or PNG)
///
/// # Errors
///
/// Returns `KycError::InvalidInput` for empty input and
/// `KycError::DecodingError` when the bytes are not a supported image
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, KycError> {
    if bytes.is_empty() {
        return Err(KycError::InvalidInput("Empty image data".to_string()));
    }

    let image = image::load_from_memory(bytes)?;
    log::debug!(
        "Decoded document image: {}x{} ({:?})",
        image.width(),
        image.height(),
        image.color()
    );

    if image.width() == 0 || image.height() == 0 {
        return Err(KycError::DecodingError("Image has zero size".to_string()));
    }

    Ok(image)
}

/// Decode document bytes straight to 8-bit RGB
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, KycError> {
    Ok(decode_image(bytes)?.to_rgb8())
}

/// MIME type of the encoded image, used for the reasoner's inline data
///
/// Falls back to `image/jpeg` when the format cannot be sniffed.
pub fn mime_type(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Gif) => "image/gif",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 10) as u8, (y * 10) as u8, 128])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let rgb = decode_rgb(&png_bytes(8, 4)).unwrap();
        assert_eq!(rgb.dimensions(), (8, 4));
        assert_eq!(rgb.get_pixel(2, 1).0, [20, 10, 128]);
    }

    #[test]
    fn test_decode_empty() {
        assert!(matches!(decode_image(&[]), Err(KycError::InvalidInput(_))));
    }

    #[test]
    fn test_decode_garbage() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(result, Err(KycError::DecodingError(_))));
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type(&png_bytes(2, 2)), "image/png");
        assert_eq!(mime_type(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(mime_type(b"unknown"), "image/jpeg");
    }
}
