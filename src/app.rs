//! Application root: wires the frame hub, the crop editor, and persisted config.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;
use tracing::{info, warn};

use crate::camera::backend::CaptureBackend;
use crate::camera::error::CameraError;
use crate::camera::types::{CameraDescriptor, Size};
use crate::crop::{CropRegionController, CursorAffordance, MoveOutcome, Rect, RegionHandle, Vec2};
use crate::diagnostics::stats::DiagnosticSnapshot;
use crate::overlay::compositor::render_circular_overlay;
use crate::overlay::error::RenderError;
use crate::overlay::pixmap::Pixmap;
use crate::preview::capture::Frame;
use crate::preview::hub::FrameHub;
use crate::preview::sink::{PixmapCell, Sink, SinkId, Transform};
use crate::settings::error::SettingsError;
use crate::settings::store::ConfigStore;
use crate::settings::types::Config;
use crate::tray::MenuAction;

pub const OVERLAY_SINK: &str = "overlay";
pub const SETTINGS_PREVIEW_SINK: &str = "settings-preview";

/// Errors surfaced by the application root.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("overlay size must be positive, got {0}")]
    InvalidOverlaySize(u32),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// What a tray menu action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOutcome {
    /// The settings surface opened with a fresh camera list.
    SettingsOpened(Vec<CameraDescriptor>),
    /// The overlay was toggled; carries the new visibility.
    OverlayVisible(bool),
    /// Capture stopped; the host should exit its event loop.
    Exit,
}

type SharedEditor = Rc<RefCell<Option<CropRegionController>>>;

/// The running application, minus any windowing toolkit.
///
/// The overlay surface shows the circular crop at the configured size. The
/// settings surface shows the raw frame at its natural size while it is open;
/// the crop editor works in that frame's coordinates.
pub struct App {
    hub: FrameHub,
    store: ConfigStore,
    config: Config,
    editor: SharedEditor,
    region: RegionHandle,
    overlay: PixmapCell,
    settings_preview: PixmapCell,
    device_pixel_ratio: f32,
    overlay_visible: bool,
}

impl App {
    /// Load the config and bind the configured camera without opening it.
    ///
    /// Fails with [`CameraError::NoCameraAvailable`] when no camera exists. A
    /// configured camera that no longer exists falls back to the first one.
    pub fn new(backend: Box<dyn CaptureBackend>, store: ConfigStore) -> Result<Self> {
        let config = store.load().unwrap_or_else(|e| {
            warn!("ignoring unreadable config: {e}");
            Config::default()
        });

        let mut app = Self {
            hub: FrameHub::new(backend),
            store,
            config,
            editor: Rc::new(RefCell::new(None)),
            region: RegionHandle::new(),
            overlay: PixmapCell::new(),
            settings_preview: PixmapCell::new(),
            device_pixel_ratio: 1.0,
            overlay_visible: false,
        };

        // Capture only runs while the overlay is shown.
        match app.hub.bind_camera(app.config.camera_id) {
            Ok(()) => {}
            Err(CameraError::DeviceNotFound(e)) => {
                warn!("configured camera missing ({e}), falling back to camera 0");
                app.hub.bind_camera(0)?;
                app.config.camera_id = 0;
            }
            Err(e) => return Err(e.into()),
        }

        app.watch_frame_size();
        app.register_overlay_sink();
        info!(
            "kolo-face ready: camera {}, overlay {}px",
            app.config.camera_id, app.config.size
        );
        Ok(app)
    }

    /// Re-initialise the crop editor whenever the frame size changes.
    fn watch_frame_size(&mut self) {
        let editor = Rc::clone(&self.editor);
        let region = self.region.clone();
        self.hub.subscribe_size_changed(move |size| {
            let border = Rect::from_size(size);
            let next = match CropRegionController::with_handle(border, region.clone()) {
                Ok(controller) => Some(controller),
                Err(e) => {
                    warn!("crop editor disabled for {size} frames: {e}");
                    region.clear();
                    None
                }
            };
            *editor.borrow_mut() = next;
        });
    }

    fn register_overlay_sink(&mut self) {
        let surface = self.overlay.clone().with_device_pixel_ratio(self.device_pixel_ratio);
        let sink = Sink::new(surface)
            .with_transform(overlay_transform(self.region.clone(), self.device_pixel_ratio))
            .with_target_size(Size::square(self.config.size));
        self.hub.register_sink(OVERLAY_SINK, sink);
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn list_cameras(&self) -> Result<Vec<CameraDescriptor>> {
        Ok(self.hub.list_cameras()?)
    }

    /// Open the settings surface: start mirroring raw frames into it and
    /// return a freshly enumerated camera list.
    pub fn open_settings(&mut self) -> Result<Vec<CameraDescriptor>> {
        let cameras = self.list_cameras()?;
        self.hub
            .register_sink(SETTINGS_PREVIEW_SINK, Sink::new(self.settings_preview.clone()));
        Ok(cameras)
    }

    pub fn close_settings(&mut self) {
        self.hub.remove_sink(&SinkId::from(SETTINGS_PREVIEW_SINK));
        self.settings_preview.clear();
    }

    /// Switch camera. The config is updated (not saved) only on success.
    ///
    /// While the overlay is hidden the camera is only bound, not opened.
    pub fn change_camera(&mut self, index: usize) -> Result<()> {
        if self.overlay_visible {
            self.hub.select_camera(index)?;
        } else {
            self.hub.bind_camera(index)?;
        }
        self.config.camera_id = index;
        Ok(())
    }

    /// Change the overlay diameter. Takes effect on the next frame.
    pub fn set_overlay_size(&mut self, size: u32) -> Result<()> {
        if size == 0 {
            return Err(AppError::InvalidOverlaySize(size));
        }
        self.config.size = size;
        self.register_overlay_sink();
        Ok(())
    }

    /// Pixel ratio of the screen showing the overlay.
    pub fn set_device_pixel_ratio(&mut self, ratio: f32) {
        self.device_pixel_ratio = ratio;
        self.register_overlay_sink();
    }

    pub fn save_config(&self) -> Result<()> {
        Ok(self.store.save(&self.config)?)
    }

    /// Show or hide the overlay; capture runs only while it is shown.
    ///
    /// Returns the new visibility.
    pub fn toggle_overlay(&mut self) -> Result<bool> {
        if self.overlay_visible {
            self.hub.stop();
            self.overlay_visible = false;
        } else {
            self.hub.start()?;
            self.overlay_visible = true;
        }
        info!("overlay visible: {}", self.overlay_visible);
        Ok(self.overlay_visible)
    }

    pub fn is_overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    pub fn handle_menu(&mut self, action: MenuAction) -> Result<MenuOutcome> {
        match action {
            MenuAction::Settings => self.open_settings().map(MenuOutcome::SettingsOpened),
            MenuAction::ShowHide => self.toggle_overlay().map(MenuOutcome::OverlayVisible),
            MenuAction::Quit => {
                self.hub.stop();
                self.overlay_visible = false;
                Ok(MenuOutcome::Exit)
            }
        }
    }

    /// Dispatch a tray menu event by item id. Unknown ids are ignored.
    pub fn handle_menu_event(&mut self, id: &str) -> Result<Option<MenuOutcome>> {
        match MenuAction::from_id(id) {
            Some(action) => self.handle_menu(action).map(Some),
            None => {
                warn!("ignoring unknown menu id {id:?}");
                Ok(None)
            }
        }
    }

    /// Deliver the newest frame, if any. Returns whether one was delivered.
    pub fn tick(&mut self) -> Result<bool> {
        Ok(self.hub.pump()?)
    }

    pub fn pointer_press(&mut self, point: Vec2) -> bool {
        self.editor
            .borrow_mut()
            .as_mut()
            .is_some_and(|editor| editor.pointer_press(point))
    }

    pub fn pointer_move(&mut self, point: Vec2) -> Option<MoveOutcome> {
        self.editor.borrow_mut().as_mut()?.pointer_move(point)
    }

    pub fn pointer_release(&mut self) {
        if let Some(editor) = self.editor.borrow_mut().as_mut() {
            editor.pointer_release();
        }
    }

    pub fn hover(&self, point: Vec2) -> CursorAffordance {
        self.editor
            .borrow()
            .as_ref()
            .map_or(CursorAffordance::Default, |editor| editor.hover(point))
    }

    /// Committed crop region in frame coordinates, once a frame has arrived.
    pub fn crop_region(&self) -> Option<Rect> {
        self.region.get()
    }

    pub fn overlay_pixmap(&self) -> Option<Pixmap> {
        self.overlay.latest()
    }

    pub fn settings_pixmap(&self) -> Option<Pixmap> {
        self.settings_preview.latest()
    }

    pub fn diagnostics(&self) -> DiagnosticSnapshot {
        self.hub.diagnostics()
    }
}

/// Overlay transform reading the committed crop region once per frame.
/// Without one it crops the frame's centered square.
fn overlay_transform(region: RegionHandle, device_pixel_ratio: f32) -> Transform {
    Box::new(move |frame: &Frame, size: Size| {
        let crop = region
            .get()
            .unwrap_or_else(|| Rect::from_size(frame.size()).centered_square());
        render_circular_overlay(frame, size.width.min(size.height), crop, device_pixel_ratio)
    })
}
