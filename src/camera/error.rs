use thiserror::Error;

/// Camera subsystem errors.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("no camera available")]
    NoCameraAvailable,

    #[error("no camera selected")]
    NotSelected,

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("device enumeration failed: {0}")]
    Enumeration(String),

    #[error("failed to open camera: {0}")]
    Open(String),

    #[error("frame capture failed: {0}")]
    Stream(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CameraError>;
