//! Circular overlay rendering: crop, mask, scale.

use tracing::trace;

use crate::camera::types::Size;
use crate::crop::geometry::Rect;
use crate::overlay::error::{RenderError, Result};
use crate::overlay::pixmap::Pixmap;
use crate::preview::capture::Frame;

/// Render the part of `frame` under `crop_rect` as a circle on a transparent
/// background, scaled to fit a `target_diameter` square.
///
/// The crop must lie fully inside the frame; it is then rounded to whole
/// pixels and must still cover at least one.
/// Output dimensions are physical pixels (`target_diameter * device_pixel_ratio`);
/// a ratio that is not a positive finite number is treated as `1.0`.
pub fn render_circular_overlay(
    frame: &Frame,
    target_diameter: u32,
    crop_rect: Rect,
    device_pixel_ratio: f32,
) -> Result<Pixmap> {
    if !frame.is_valid() {
        return Err(RenderError::InvalidFrame(frame.size()));
    }
    if target_diameter == 0 {
        return Err(RenderError::EmptyTarget(Size::square(target_diameter)));
    }

    let bounds = pixel_bounds(crop_rect, frame.size())?;
    let masked = masked_crop(frame, &bounds)?;

    let ratio = sanitize_ratio(device_pixel_ratio);
    let physical = ((target_diameter as f32 * ratio).round() as u32).max(1);
    let output = fit_within(masked.size(), physical);
    trace!(
        "overlay {}x{} crop -> {output} at ratio {ratio}",
        bounds.width,
        bounds.height
    );

    Ok(masked.resized(output)?.with_device_pixel_ratio(ratio))
}

/// Integer crop bounds inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelBounds {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

fn pixel_bounds(rect: Rect, frame: Size) -> Result<PixelBounds> {
    let invalid = || RenderError::InvalidCropRect { rect, frame };

    let edges = [rect.left, rect.top, rect.right, rect.bottom];
    if !edges.iter().all(|v| v.is_finite())
        || !Rect::from_size(frame).contains_rect(&rect)
        || rect.is_empty()
    {
        return Err(invalid());
    }

    let left = rect.left.round();
    let top = rect.top.round();
    let right = rect.right.round();
    let bottom = rect.bottom.round();
    if right <= left || bottom <= top {
        return Err(invalid());
    }

    Ok(PixelBounds {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}

/// Copy the crop into a transparent RGBA buffer, keeping only pixels whose
/// centre falls inside the inscribed ellipse.
fn masked_crop(frame: &Frame, bounds: &PixelBounds) -> Result<Pixmap> {
    let bpp = frame.format.bytes_per_pixel();
    let stride = frame.width as usize * bpp;
    let mut data = vec![0u8; Size::new(bounds.width, bounds.height).area() * 4];

    let radius_x = f64::from(bounds.width) / 2.0;
    let radius_y = f64::from(bounds.height) / 2.0;

    for row in 0..bounds.height as usize {
        let dy = (row as f64 + 0.5 - radius_y) / radius_y;
        let src_row = (bounds.y as usize + row) * stride;
        for col in 0..bounds.width as usize {
            let dx = (col as f64 + 0.5 - radius_x) / radius_x;
            if dx * dx + dy * dy > 1.0 {
                continue;
            }
            let src = src_row + (bounds.x as usize + col) * bpp;
            let dst = (row * bounds.width as usize + col) * 4;
            data[dst..dst + 3].copy_from_slice(&frame.data[src..src + 3]);
            data[dst + 3] = if bpp == 4 { frame.data[src + 3] } else { u8::MAX };
        }
    }

    Pixmap::new(bounds.width, bounds.height, data)
}

fn sanitize_ratio(ratio: f32) -> f32 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}

/// Largest size with the aspect ratio of `size` that fits a `side` square.
fn fit_within(size: Size, side: u32) -> Size {
    if size.width == size.height {
        return Size::square(side);
    }
    let scale = f64::from(side) / f64::from(size.width.max(size.height));
    let fit = |extent: u32| ((f64::from(extent) * scale).round() as u32).clamp(1, side);
    Size::new(fit(size.width), fit(size.height))
}
