//! Image models
//!
//! Thumbnail size presets and the dimension math that drives the resize
//! pipeline. Width or height of 0 means "derive from aspect ratio" in Fit
//! mode; in Fill and Exact both dimensions must be concrete.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of a raster image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// How a source image maps onto a target size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Fit within dimensions, maintaining aspect ratio
    Fit,
    /// Fill dimensions exactly, center-cropping the overflow
    Fill,
    /// Exact dimensions, distorting if the aspect ratio differs
    Exact,
}

impl Default for ResizeMode {
    fn default() -> Self {
        Self::Fit
    }
}

/// Output encoding for derived images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
}

impl ImageFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }
}

impl Default for ImageFormat {
    fn default() -> Self {
        Self::Jpeg
    }
}

/// Named thumbnail size preset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSize {
    /// Size name (e.g., "thumbnail", "medium", "large")
    pub name: String,
    /// Width in pixels (0 = auto, Fit mode only)
    pub width: u32,
    /// Height in pixels (0 = auto, Fit mode only)
    pub height: u32,
    pub mode: ResizeMode,
    /// Encoding quality (1-100)
    pub quality: u8,
    /// Disabled sizes are skipped during generation
    pub enabled: bool,
}

impl ImageSize {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            mode: ResizeMode::Fit,
            quality: 85,
            enabled: true,
        }
    }

    /// Target dimensions for a source image under this preset's mode.
    pub fn calculate_dimensions(&self, original_width: u32, original_height: u32) -> (u32, u32) {
        match self.mode {
            ResizeMode::Exact | ResizeMode::Fill => (self.width, self.height),
            ResizeMode::Fit => {
                if self.width == 0 && self.height == 0 {
                    return (original_width, original_height);
                }

                let ratio = original_width as f64 / original_height as f64;

                if self.width == 0 {
                    let new_width = (self.height as f64 * ratio).round() as u32;
                    (new_width, self.height)
                } else if self.height == 0 {
                    let new_height = (self.width as f64 / ratio).round() as u32;
                    (self.width, new_height)
                } else {
                    let width_ratio = self.width as f64 / original_width as f64;
                    let height_ratio = self.height as f64 / original_height as f64;
                    let ratio = width_ratio.min(height_ratio);

                    let new_width = (original_width as f64 * ratio).round() as u32;
                    let new_height = (original_height as f64 * ratio).round() as u32;
                    (new_width, new_height)
                }
            }
        }
    }
}

/// Default thumbnail size presets
pub fn default_image_sizes() -> Vec<ImageSize> {
    vec![
        ImageSize {
            name: "thumbnail".to_string(),
            width: 150,
            height: 150,
            mode: ResizeMode::Fill,
            quality: 80,
            enabled: true,
        },
        ImageSize {
            name: "small".to_string(),
            width: 300,
            height: 0,
            mode: ResizeMode::Fit,
            quality: 85,
            enabled: true,
        },
        ImageSize {
            name: "medium".to_string(),
            width: 600,
            height: 0,
            mode: ResizeMode::Fit,
            quality: 85,
            enabled: true,
        },
        ImageSize {
            name: "large".to_string(),
            width: 1200,
            height: 0,
            mode: ResizeMode::Fit,
            quality: 85,
            enabled: true,
        },
    ]
}
