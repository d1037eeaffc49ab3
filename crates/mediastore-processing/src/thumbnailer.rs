//! Thumbnail rendering
//!
//! Decode once, render each enabled size preset independently. A preset whose
//! target box would upscale the source is skipped rather than rendered.

use image::imageops::FilterType;
use image::DynamicImage;
use mediastore_core::models::{ImageDimensions, ImageFormat, ImageSize};
use mediastore_core::{AppError, AppResult};

/// One rendered thumbnail variant, ready for storage
#[derive(Debug, Clone)]
pub struct RenderedVariant {
    pub size_name: String,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

/// Stateless image pipeline entry points
pub struct Thumbnailer;

impl Thumbnailer {
    /// Decode image bytes, guessing the format from content.
    pub fn decode(data: &[u8]) -> AppResult<DynamicImage> {
        image::load_from_memory(data)
            .map_err(|e| AppError::ImageProcessing(format!("Failed to decode image: {}", e)))
    }

    /// Pixel dimensions without a full decode.
    pub fn dimensions(data: &[u8]) -> AppResult<ImageDimensions> {
        let reader = image::ImageReader::new(std::io::Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| AppError::ImageProcessing(format!("Failed to probe image: {}", e)))?;

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| AppError::ImageProcessing(format!("Failed to read dimensions: {}", e)))?;

        Ok(ImageDimensions { width, height })
    }

    /// Output format for derived variants of a source content type.
    ///
    /// PNG and WebP sources keep their format so transparency survives;
    /// everything else becomes JPEG.
    pub fn variant_format(content_type: &str) -> ImageFormat {
        match content_type {
            "image/png" => ImageFormat::Png,
            "image/webp" => ImageFormat::WebP,
            _ => ImageFormat::Jpeg,
        }
    }

    /// True when rendering this preset would only upscale the source.
    pub fn would_upscale(size: &ImageSize, source_width: u32, source_height: u32) -> bool {
        let (target_width, target_height) = size.calculate_dimensions(source_width, source_height);
        target_width >= source_width && target_height >= source_height
    }

    /// Render one size preset from a decoded source.
    pub fn render(
        img: &DynamicImage,
        size: &ImageSize,
        format: ImageFormat,
    ) -> AppResult<RenderedVariant> {
        let rendered = crate::resize::render_size(img, size)?;
        let data = crate::encode::encode_image(&rendered, format, size.quality)?;

        Ok(RenderedVariant {
            size_name: size.name.clone(),
            width: rendered.width(),
            height: rendered.height(),
            format,
            data,
        })
    }

    /// Downscale oversized images and re-encode.
    ///
    /// Returns `None` when the source is already within bounds, or when
    /// re-encoding would not shrink the payload. The caller keeps the
    /// original bytes in that case.
    pub fn optimize(
        data: &[u8],
        content_type: &str,
        max_width: u32,
        max_height: u32,
        jpeg_quality: u8,
    ) -> AppResult<Option<Vec<u8>>> {
        let img = Self::decode(data)?;
        let (width, height) = (img.width(), img.height());
        let within_bounds = width <= max_width && height <= max_height;

        let format = Self::variant_format(content_type);

        // Lossless formats within bounds gain nothing from a re-encode
        if within_bounds && format != ImageFormat::Jpeg {
            return Ok(None);
        }

        let output = if within_bounds {
            crate::encode::encode_image(&img, format, jpeg_quality)?
        } else {
            let bounded = img.resize(max_width, max_height, FilterType::Lanczos3);
            tracing::debug!(
                original_width = width,
                original_height = height,
                bounded_width = bounded.width(),
                bounded_height = bounded.height(),
                "Downscaled oversized image"
            );
            crate::encode::encode_image(&bounded, format, jpeg_quality)?
        };

        if within_bounds && output.len() >= data.len() {
            return Ok(None);
        }

        Ok(Some(output))
    }
}
