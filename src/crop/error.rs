use thiserror::Error;

/// Crop editor errors.
#[derive(Debug, Error, PartialEq)]
pub enum CropError {
    #[error("border {width}x{height} cannot hold a square larger than {min_extent}")]
    BorderTooSmall {
        width: f64,
        height: f64,
        min_extent: f64,
    },
}
