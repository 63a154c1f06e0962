// Overlay rendering: pixmaps and the circular compositor.

pub mod compositor;
pub mod error;
pub mod pixmap;

pub use compositor::render_circular_overlay;
pub use error::RenderError;
pub use pixmap::Pixmap;
