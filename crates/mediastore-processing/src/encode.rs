//! Image encoding
//!
//! Encodes decoded images to their output format. JPEG honors the quality
//! setting; PNG and WebP use the image crate's lossless encoders, where
//! quality does not apply.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;
use mediastore_core::models::ImageFormat;
use mediastore_core::{AppError, AppResult};
use std::io::Cursor;

/// Encode an image to bytes in the requested format.
pub fn encode_image(img: &DynamicImage, format: ImageFormat, quality: u8) -> AppResult<Vec<u8>> {
    let mut buffer = Vec::new();

    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = img.to_rgb8();
            let mut cursor = Cursor::new(&mut buffer);
            let encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
            rgb.write_with_encoder(encoder)
                .map_err(|e| AppError::ImageProcessing(format!("JPEG encode failed: {}", e)))?;
        }
        ImageFormat::Png => {
            let mut cursor = Cursor::new(&mut buffer);
            let encoder = PngEncoder::new(&mut cursor);
            img.write_with_encoder(encoder)
                .map_err(|e| AppError::ImageProcessing(format!("PNG encode failed: {}", e)))?;
        }
        ImageFormat::WebP => {
            let mut cursor = Cursor::new(&mut buffer);
            let encoder = WebPEncoder::new_lossless(&mut cursor);
            img.write_with_encoder(encoder)
                .map_err(|e| AppError::ImageProcessing(format!("WebP encode failed: {}", e)))?;
        }
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn test_image() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 48, image::Rgba([10, 200, 30, 255])))
    }

    #[test]
    fn test_jpeg_roundtrip() {
        let img = test_image();
        let bytes = encode_image(&img, ImageFormat::Jpeg, 85).unwrap();
        assert!(!bytes.is_empty());

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
    }

    #[test]
    fn test_png_roundtrip() {
        let img = test_image();
        let bytes = encode_image(&img, ImageFormat::Png, 85).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 64);
    }

    #[test]
    fn test_webp_roundtrip() {
        let img = test_image();
        let bytes = encode_image(&img, ImageFormat::WebP, 85).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.height(), 48);
    }

    #[test]
    fn test_jpeg_quality_affects_size() {
        // Use a noisy image so quality actually changes output size
        let noisy = RgbaImage::from_fn(128, 128, |x, y| {
            image::Rgba([
                ((x * 7 + y * 13) % 256) as u8,
                ((x * 31 + y * 3) % 256) as u8,
                ((x * 17 + y * 23) % 256) as u8,
                255,
            ])
        });
        let img = DynamicImage::ImageRgba8(noisy);

        let high = encode_image(&img, ImageFormat::Jpeg, 95).unwrap();
        let low = encode_image(&img, ImageFormat::Jpeg, 30).unwrap();
        assert!(low.len() < high.len());
    }
}
