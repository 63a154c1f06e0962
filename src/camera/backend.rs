use crate::camera::error::Result;
use crate::camera::types::CameraDescriptor;
use crate::preview::capture::CaptureSession;

/// Platform-agnostic capture backend.
///
/// Implemented by the dummy test-pattern camera and, with the `nokhwa`
/// feature, by the native device backend. Provides enumeration and opens
/// capture sessions; frames are delivered into the session's frame slot.
pub trait CaptureBackend: Send + Sync {
    /// Enumerate all currently connected cameras. Never cached.
    fn enumerate_cameras(&self) -> Result<Vec<CameraDescriptor>>;

    /// Open a capture session bound to `camera`.
    ///
    /// The session starts producing frames immediately and keeps doing so
    /// until it is stopped or dropped.
    fn open_camera(&self, camera: &CameraDescriptor) -> Result<CaptureSession>;
}
