use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::camera::types::Size;
use crate::overlay::error::Result;
use crate::overlay::pixmap::Pixmap;
use crate::preview::capture::Frame;

/// Identity of a sink registered with a frame hub.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(String);

impl SinkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SinkId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A window or widget that shows whatever pixmap it is handed.
pub trait DisplaySurface {
    fn set_pixmap(&mut self, pixmap: Pixmap);

    /// Physical pixels per logical pixel on this surface.
    fn device_pixel_ratio(&self) -> f32 {
        1.0
    }
}

/// Turns a frame into a pixmap of the requested size.
pub type Transform = Box<dyn Fn(&Frame, Size) -> Result<Pixmap>>;

/// Frame to pixmap, stretched to the requested size when it differs from the
/// frame's own.
pub fn default_transform() -> Transform {
    Box::new(|frame: &Frame, size: Size| Pixmap::from_frame(frame)?.resized(size))
}

/// A registered consumer of frames.
pub struct Sink {
    surface: Box<dyn DisplaySurface>,
    transform: Transform,
    target_size: Option<Size>,
}

impl Sink {
    /// A sink using the default transform at the frame's natural size.
    pub fn new(surface: impl DisplaySurface + 'static) -> Self {
        Self {
            surface: Box::new(surface),
            transform: default_transform(),
            target_size: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Fix the size passed to the transform. Without one the frame's natural
    /// size is used.
    pub fn with_target_size(mut self, size: Size) -> Self {
        self.target_size = Some(size);
        self
    }

    pub fn effective_size(&self, natural: Size) -> Size {
        self.target_size.unwrap_or(natural)
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.surface.device_pixel_ratio()
    }

    /// Run the transform and hand the result to the surface.
    pub fn deliver(&mut self, frame: &Frame) -> Result<()> {
        let pixmap = (self.transform)(frame, self.effective_size(frame.size()))?;
        self.surface.set_pixmap(pixmap);
        Ok(())
    }
}

/// In-process surface that keeps the last pixmap it was given.
///
/// Clones share the same storage, so one clone can be registered with a hub
/// while another is read back by the owner.
#[derive(Debug, Clone)]
pub struct PixmapCell {
    latest: Rc<RefCell<Option<Pixmap>>>,
    received: Rc<Cell<u64>>,
    device_pixel_ratio: f32,
}

impl PixmapCell {
    pub fn new() -> Self {
        Self {
            latest: Rc::default(),
            received: Rc::default(),
            device_pixel_ratio: 1.0,
        }
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f32) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    pub fn latest(&self) -> Option<Pixmap> {
        self.latest.borrow().clone()
    }

    /// Number of pixmaps received so far.
    pub fn received(&self) -> u64 {
        self.received.get()
    }

    pub fn clear(&self) {
        self.latest.borrow_mut().take();
    }
}

impl Default for PixmapCell {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySurface for PixmapCell {
    fn set_pixmap(&mut self, pixmap: Pixmap) {
        *self.latest.borrow_mut() = Some(pixmap);
        self.received.set(self.received.get() + 1);
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }
}
