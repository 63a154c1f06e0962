pub mod app;
pub mod camera;
pub mod crop;
pub mod diagnostics;
pub mod overlay;
pub mod preview;
pub mod settings;
pub mod tray;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use app::{App, AppError};
use camera::backend::CaptureBackend;
use settings::store::ConfigStore;
use tray::MenuAction;

/// Frames to deliver before a headless run writes its snapshot.
const HEADLESS_FRAMES: u32 = 30;
const HEADLESS_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_OUTPUT: &str = "kolo-face-overlay.png";

/// Create the capture backend for the current build.
///
/// When `KOLO_DUMMY_CAMERA=1` is set, a simulated camera is used instead.
pub fn create_capture_backend() -> Box<dyn CaptureBackend> {
    if camera::dummy::DummyBackend::is_enabled() {
        info!("using dummy camera");
        return Box::new(camera::dummy::DummyBackend::new());
    }

    #[cfg(feature = "nokhwa")]
    {
        Box::new(camera::device::DeviceBackend)
    }

    #[cfg(not(feature = "nokhwa"))]
    {
        warn!("built without device capture; set KOLO_DUMMY_CAMERA=1 for a test camera");
        Box::new(NullBackend)
    }
}

/// Backend used when no device capture is compiled in. It sees no cameras.
#[cfg(not(feature = "nokhwa"))]
struct NullBackend;

#[cfg(not(feature = "nokhwa"))]
impl CaptureBackend for NullBackend {
    fn enumerate_cameras(&self) -> camera::error::Result<Vec<camera::types::CameraDescriptor>> {
        Ok(vec![])
    }

    fn open_camera(
        &self,
        camera: &camera::types::CameraDescriptor,
    ) -> camera::error::Result<preview::capture::CaptureSession> {
        Err(camera::error::CameraError::DeviceNotFound(camera.to_string()))
    }
}

fn init_logging() {
    let default_level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();
}

/// Run the overlay headless: show it, deliver a burst of frames, and write the
/// last overlay pixmap as a PNG to the first argument (or the default path).
pub fn run() {
    init_logging();

    let output = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_OUTPUT), PathBuf::from);

    if let Err(e) = run_headless(&output) {
        error!("kolo-face failed: {e}");
        std::process::exit(1);
    }
}

fn run_headless(output: &Path) -> Result<(), AppError> {
    let mut app = App::new(create_capture_backend(), ConfigStore::at_default_location())?;
    app.handle_menu(MenuAction::ShowHide)?;

    let started = Instant::now();
    let mut frames = 0;
    while frames < HEADLESS_FRAMES && started.elapsed() < HEADLESS_TIMEOUT {
        if app.tick()? {
            frames += 1;
        } else {
            std::thread::sleep(Duration::from_millis(5));
        }
    }
    app.handle_menu(MenuAction::Quit)?;

    let diagnostics = app.diagnostics();
    info!(
        "delivered {} frames ({} dropped) at {:.1} fps",
        diagnostics.frames_delivered, diagnostics.frames_dropped, diagnostics.fps
    );

    match app.overlay_pixmap() {
        Some(pixmap) => {
            pixmap.save_png(output)?;
            info!("wrote {} overlay to {}", pixmap.size(), output.display());
        }
        None => warn!("no frame arrived within {HEADLESS_TIMEOUT:?}; nothing written"),
    }
    Ok(())
}
