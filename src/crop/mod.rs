// Crop editor: square region, corner markers, pointer handling.

pub mod controller;
pub mod error;
pub mod geometry;
pub mod marker;

pub use controller::{
    CropRegionController, CursorAffordance, MoveOutcome, RegionHandle, HANDLE_RADIUS, MIN_EXTENT,
};
pub use error::CropError;
pub use geometry::{Rect, Vec2};
pub use marker::{CornerMarker, Orientation};
