use thiserror::Error;

use crate::camera::types::Size;
use crate::crop::geometry::Rect;

/// Rendering errors raised while turning a frame into a pixmap.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("crop rect {rect:?} is empty or not inside the {frame} frame")]
    InvalidCropRect { rect: Rect, frame: Size },

    #[error("frame buffer does not match its {0} dimensions")]
    InvalidFrame(Size),

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("target size {0} is empty")]
    EmptyTarget(Size),

    #[error("image buffer: {0}")]
    ImageBuffer(#[from] fast_image_resize::ImageBufferError),

    #[error("resize failed: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, RenderError>;
