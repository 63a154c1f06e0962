use std::time::Duration;

use crate::camera::backend::CaptureBackend;
use crate::camera::error::{CameraError, Result};
use crate::camera::types::{CameraDescriptor, Size};
use crate::preview::capture::{CaptureSession, Frame, FrameProducer, PixelFormat};

const DUMMY_CAMERA_LABEL: &str = "Dummy Test Camera";
const DEFAULT_FRAME_SIZE: Size = Size::new(640, 480);
const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// A fake capture backend for running without real hardware.
///
/// Every camera produces a scrolling RGB gradient at a fixed cadence.
///
/// Enable via `KOLO_DUMMY_CAMERA=1` environment variable.
#[derive(Debug, Clone)]
pub struct DummyBackend {
    cameras: Vec<CameraDescriptor>,
    frame_size: Size,
    frame_interval: Duration,
}

impl DummyBackend {
    /// A backend exposing a single dummy camera.
    pub fn new() -> Self {
        Self::with_cameras(&[DUMMY_CAMERA_LABEL])
    }

    /// A backend exposing one camera per label, indexed in order.
    pub fn with_cameras(labels: &[&str]) -> Self {
        Self {
            cameras: labels
                .iter()
                .enumerate()
                .map(|(index, label)| CameraDescriptor::new(index, *label))
                .collect(),
            frame_size: DEFAULT_FRAME_SIZE,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }

    pub fn with_frame_size(mut self, size: Size) -> Self {
        self.frame_size = size;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Whether the dummy camera is enabled via environment variable.
    pub fn is_enabled() -> bool {
        std::env::var("KOLO_DUMMY_CAMERA").is_ok_and(|v| v == "1" || v == "true")
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for DummyBackend {
    fn enumerate_cameras(&self) -> Result<Vec<CameraDescriptor>> {
        Ok(self.cameras.clone())
    }

    fn open_camera(&self, camera: &CameraDescriptor) -> Result<CaptureSession> {
        if !self.cameras.contains(camera) {
            return Err(CameraError::DeviceNotFound(camera.to_string()));
        }

        let size = self.frame_size;
        let interval = self.frame_interval;
        CaptureSession::spawn(
            camera.clone(),
            Box::new(move || {
                Ok(Box::new(TestPatternProducer::new(size, interval)) as Box<dyn FrameProducer>)
            }),
        )
    }
}

/// Generates a gradient that shifts by one column per frame.
struct TestPatternProducer {
    size: Size,
    interval: Duration,
    tick: u32,
}

impl TestPatternProducer {
    fn new(size: Size, interval: Duration) -> Self {
        Self {
            size,
            interval,
            tick: 0,
        }
    }
}

impl FrameProducer for TestPatternProducer {
    fn next_frame(&mut self) -> Result<Frame> {
        std::thread::sleep(self.interval);
        let frame = test_pattern(self.size, self.tick);
        self.tick = self.tick.wrapping_add(1);
        Ok(frame)
    }
}

/// Synthetic RGB frame: red follows x (shifted by `tick`), green follows y.
pub fn test_pattern(size: Size, tick: u32) -> Frame {
    let mut data = Vec::with_capacity(size.area() * 3);
    for y in 0..size.height {
        for x in 0..size.width {
            data.push((x.wrapping_add(tick) % 256) as u8);
            data.push((y % 256) as u8);
            data.push(128);
        }
    }
    Frame::new(data, size.width, size.height, PixelFormat::Rgb24)
}
