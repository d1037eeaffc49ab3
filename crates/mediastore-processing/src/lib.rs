//! Mediastore Processing Library
//!
//! Image decode, resize, and encode for the thumbnail pipeline and upload
//! optimization. Everything here is synchronous CPU work; callers decide
//! whether to move it off the async runtime.

pub mod encode;
pub mod resize;
pub mod thumbnailer;

pub use encode::encode_image;
pub use resize::render_size;
pub use thumbnailer::{RenderedVariant, Thumbnailer};
