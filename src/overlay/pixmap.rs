use std::path::Path;

use fast_image_resize as fr;
use fr::images::Image;

use crate::camera::types::Size;
use crate::overlay::error::{RenderError, Result};
use crate::preview::capture::{Frame, PixelFormat};

const BYTES_PER_PIXEL: usize = 4;

/// An RGBA8 image ready to be shown on a display surface.
///
/// Width and height are physical pixels; `device_pixel_ratio` records how many
/// physical pixels make up one logical pixel on the target surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    device_pixel_ratio: f32,
    data: Vec<u8>,
}

impl Pixmap {
    /// Wrap an RGBA buffer. The buffer must hold exactly `width * height` pixels.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = Size::new(width, height).area() * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(RenderError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            device_pixel_ratio: 1.0,
            data,
        })
    }

    /// A fully transparent pixmap.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: 1.0,
            data: vec![0; Size::new(width, height).area() * BYTES_PER_PIXEL],
        }
    }

    /// Copy a frame into an opaque RGBA pixmap of the same size.
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        if !frame.is_valid() {
            return Err(RenderError::InvalidFrame(frame.size()));
        }
        let data = match frame.format {
            PixelFormat::Rgba32 => frame.data.clone(),
            PixelFormat::Rgb24 => {
                let mut rgba = Vec::with_capacity(frame.size().area() * BYTES_PER_PIXEL);
                for pixel in frame.data.chunks_exact(3) {
                    rgba.extend_from_slice(pixel);
                    rgba.push(u8::MAX);
                }
                rgba
            }
        };
        Self::new(frame.width, frame.height, data)
    }

    /// Bilinear resample to `size`. Alpha is premultiplied during the resize so
    /// transparent pixels do not bleed colour into their neighbours.
    pub fn resized(&self, size: Size) -> Result<Self> {
        if size.is_empty() {
            return Err(RenderError::EmptyTarget(size));
        }
        if size == self.size() {
            return Ok(self.clone());
        }

        let src = Image::from_vec_u8(self.width, self.height, self.data.clone(), fr::PixelType::U8x4)?;
        let mut dst = Image::new(size.width, size.height, fr::PixelType::U8x4);
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear));
        fr::Resizer::new().resize(&src, &mut dst, &options)?;

        Ok(Self {
            width: size.width,
            height: size.height,
            device_pixel_ratio: self.device_pixel_ratio,
            data: dst.into_vec(),
        })
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f32) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    /// Size in logical pixels, rounded to the nearest pixel.
    pub fn logical_size(&self) -> Size {
        let scale = |physical: u32| (physical as f32 / self.device_pixel_ratio).round() as u32;
        Size::new(scale(self.width), scale(self.height))
    }

    /// RGBA value at `(x, y)`, or `None` outside the pixmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.data[offset..offset + BYTES_PER_PIXEL]);
        Some(rgba)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encode as PNG at `path`.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let image = image::RgbaImage::from_raw(self.width, self.height, self.data.clone()).ok_or(
            RenderError::BufferSize {
                expected: self.size().area() * BYTES_PER_PIXEL,
                actual: self.data.len(),
            },
        )?;
        image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}
