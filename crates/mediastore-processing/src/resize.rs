//! Resize operations
//!
//! Maps a decoded image onto a size preset. Fit preserves aspect ratio within
//! the target box, Fill center-crops to cover the box exactly, Exact stretches.

use image::imageops::FilterType;
use image::DynamicImage;
use mediastore_core::models::{ImageSize, ResizeMode};
use mediastore_core::{AppError, AppResult};

/// Render a decoded image at a size preset's target dimensions.
///
/// Fill and Exact require both dimensions to be concrete; a zero dimension in
/// those modes is a preset misconfiguration and fails instead of producing an
/// empty image.
pub fn render_size(img: &DynamicImage, size: &ImageSize) -> AppResult<DynamicImage> {
    if matches!(size.mode, ResizeMode::Fill | ResizeMode::Exact)
        && (size.width == 0 || size.height == 0)
    {
        return Err(AppError::ImageProcessing(format!(
            "Size '{}' has zero dimension in {:?} mode",
            size.name, size.mode
        )));
    }

    let (target_width, target_height) =
        size.calculate_dimensions(img.width(), img.height());

    if target_width == 0 || target_height == 0 {
        return Err(AppError::ImageProcessing(format!(
            "Size '{}' resolves to empty dimensions",
            size.name
        )));
    }

    let rendered = match size.mode {
        ResizeMode::Fit => img.resize(target_width, target_height, FilterType::Lanczos3),
        ResizeMode::Fill => img.resize_to_fill(target_width, target_height, FilterType::Lanczos3),
        ResizeMode::Exact => img.resize_exact(target_width, target_height, FilterType::Lanczos3),
    };

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([120, 80, 40, 255]),
        ))
    }

    #[test]
    fn test_fit_preserves_aspect_ratio() {
        let img = test_image(600, 400);
        let size = ImageSize::new("small", 300, 0);
        let rendered = render_size(&img, &size).unwrap();
        assert_eq!(rendered.width(), 300);
        assert_eq!(rendered.height(), 200);
    }

    #[test]
    fn test_fill_produces_exact_box() {
        let img = test_image(600, 400);
        let mut size = ImageSize::new("thumbnail", 150, 150);
        size.mode = ResizeMode::Fill;
        let rendered = render_size(&img, &size).unwrap();
        assert_eq!(rendered.width(), 150);
        assert_eq!(rendered.height(), 150);
    }

    #[test]
    fn test_exact_ignores_aspect_ratio() {
        let img = test_image(600, 400);
        let mut size = ImageSize::new("banner", 500, 100);
        size.mode = ResizeMode::Exact;
        let rendered = render_size(&img, &size).unwrap();
        assert_eq!(rendered.width(), 500);
        assert_eq!(rendered.height(), 100);
    }

    #[test]
    fn test_fill_with_zero_dimension_fails() {
        let img = test_image(600, 400);
        let mut size = ImageSize::new("broken", 150, 0);
        size.mode = ResizeMode::Fill;
        let result = render_size(&img, &size);
        assert!(matches!(result, Err(AppError::ImageProcessing(_))));
    }
}
