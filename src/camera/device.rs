//! Native camera capture through nokhwa (V4L2, Media Foundation, AVFoundation).

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

use crate::camera::backend::CaptureBackend;
use crate::camera::error::{CameraError, Result};
use crate::camera::types::CameraDescriptor;
use crate::preview::capture::{CaptureSession, Frame, FrameProducer, PixelFormat};

/// Capture backend for physical cameras.
pub struct DeviceBackend;

impl CaptureBackend for DeviceBackend {
    fn enumerate_cameras(&self) -> Result<Vec<CameraDescriptor>> {
        let infos =
            nokhwa::query(ApiBackend::Auto).map_err(|e| CameraError::Enumeration(e.to_string()))?;
        Ok(infos
            .iter()
            .enumerate()
            .map(|(index, info)| CameraDescriptor::new(index, info.human_name()))
            .collect())
    }

    fn open_camera(&self, camera: &CameraDescriptor) -> Result<CaptureSession> {
        let index = u32::try_from(camera.index)
            .map_err(|_| CameraError::DeviceNotFound(camera.to_string()))?;
        // The nokhwa handle is created on the capture thread and never leaves it.
        CaptureSession::spawn(
            camera.clone(),
            Box::new(move || Ok(Box::new(DeviceProducer::open(index)?) as Box<dyn FrameProducer>)),
        )
    }
}

struct DeviceProducer {
    camera: Camera,
}

impl DeviceProducer {
    fn open(index: u32) -> Result<Self> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| CameraError::Open(format!("create camera {index}: {e}")))?;
        camera
            .open_stream()
            .map_err(|e| CameraError::Open(format!("open stream {index}: {e}")))?;

        let resolution = camera.resolution();
        tracing::info!(
            "camera {index} streaming at {}x{}",
            resolution.width(),
            resolution.height()
        );
        Ok(Self { camera })
    }
}

impl FrameProducer for DeviceProducer {
    fn next_frame(&mut self) -> Result<Frame> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CameraError::Stream(format!("fetch frame: {e}")))?;
        let image = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::Stream(format!("decode RGB: {e}")))?;
        let (width, height) = (image.width(), image.height());
        Ok(Frame::new(image.into_raw(), width, height, PixelFormat::Rgb24))
    }
}

impl Drop for DeviceProducer {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!("failed to stop camera stream: {e}");
        }
    }
}
