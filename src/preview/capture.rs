use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info};

use crate::camera::error::{CameraError, Result};
use crate::camera::types::{CameraDescriptor, Size};

/// Pixel layout of a frame buffer. Frames are never colour-converted beyond
/// widening to RGBA for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Packed 8-bit R, G, B.
    Rgb24,
    /// Packed 8-bit R, G, B, A.
    Rgba32,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb24 => 3,
            Self::Rgba32 => 4,
        }
    }
}

/// A single captured frame from the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw pixel data, row-major, tightly packed.
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    pub format: PixelFormat,
    /// Capture timestamp in microseconds since the session started.
    pub timestamp_us: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
            timestamp_us: 0,
        }
    }

    pub fn with_timestamp(mut self, timestamp_us: u64) -> Self {
        self.timestamp_us = timestamp_us;
        self
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// A frame is valid when both dimensions are non-zero and the buffer holds
    /// exactly `width * height` pixels of its format.
    pub fn is_valid(&self) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(self.format.bytes_per_pixel()))
            .is_some_and(|expected| expected == self.data.len())
    }
}

/// Latest-frame slot shared between a capture thread and the event thread.
///
/// Only the newest frame is kept: the event thread never wants a stale frame
/// and the capture thread never waits for a slow consumer. Frames are wrapped
/// in `Arc` so readers get a cheap reference instead of a pixel copy.
pub struct FrameSlot {
    latest: Mutex<Option<Arc<Frame>>>,
    /// Monotonic counter incremented on each push. Camera timestamps are not
    /// trusted for change detection.
    sequence: AtomicU64,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            sequence: AtomicU64::new(0),
        }
    }

    /// Replace the held frame.
    pub fn push(&self, frame: Frame) {
        let mut latest = self.latest.lock();
        *latest = Some(Arc::new(frame));
        self.sequence.fetch_add(1, Ordering::Release);
    }

    /// Number of frames pushed so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// The newest frame together with its sequence number.
    pub fn latest(&self) -> Option<(u64, Arc<Frame>)> {
        let latest = self.latest.lock();
        latest
            .as_ref()
            .map(|frame| (self.sequence(), Arc::clone(frame)))
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that yields frames at the device's native cadence.
///
/// `next_frame` is expected to block until the next frame is ready. Producers
/// are created on the capture thread and never leave it, so they need not be
/// `Send`.
pub trait FrameProducer {
    fn next_frame(&mut self) -> Result<Frame>;
}

/// Builds a producer on the capture thread.
pub type ProducerFactory = Box<dyn FnOnce() -> Result<Box<dyn FrameProducer>> + Send>;

/// Active capture session for a single camera.
///
/// Owns the capture thread. Only one session may exist per physical device;
/// callers stop the previous session before opening a new one.
pub struct CaptureSession {
    camera: CameraDescriptor,
    slot: Arc<FrameSlot>,
    running: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CaptureSession {
    /// Spawn the capture thread for `camera`.
    ///
    /// The thread builds its producer with `factory`, then pushes every frame
    /// into the session's slot until the session is stopped or the producer
    /// fails.
    pub fn spawn(camera: CameraDescriptor, factory: ProducerFactory) -> Result<Self> {
        let slot = Arc::new(FrameSlot::new());
        let running = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(AtomicBool::new(false));

        let thread = {
            let label = camera.to_string();
            let slot = Arc::clone(&slot);
            let running = Arc::clone(&running);
            let shutdown = Arc::clone(&shutdown);

            std::thread::Builder::new()
                .name(format!("capture-{}", camera.index))
                .spawn(move || {
                    info!("capture thread starting for {label}");
                    Self::run_capture(&label, factory, &slot, &running, &shutdown);
                    info!("capture thread exiting for {label}");
                })
                .map_err(|e| CameraError::Open(format!("spawn capture thread: {e}")))?
        };

        Ok(Self {
            camera,
            slot,
            running,
            shutdown,
            thread: Some(thread),
        })
    }

    fn run_capture(
        label: &str,
        factory: ProducerFactory,
        slot: &FrameSlot,
        running: &AtomicBool,
        shutdown: &AtomicBool,
    ) {
        let mut producer = match factory() {
            Ok(producer) => producer,
            Err(e) => {
                error!("failed to start capture for {label}: {e}");
                return;
            }
        };

        let started = std::time::Instant::now();
        running.store(true, Ordering::Relaxed);
        while !shutdown.load(Ordering::Relaxed) {
            match producer.next_frame() {
                Ok(frame) => {
                    let timestamp_us = started.elapsed().as_micros() as u64;
                    slot.push(frame.with_timestamp(timestamp_us));
                }
                Err(e) => {
                    error!("capture failed for {label}: {e}");
                    break;
                }
            }
        }
        running.store(false, Ordering::Relaxed);
    }

    /// The slot this session writes into.
    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }

    /// Check if the capture thread is currently producing frames.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn camera(&self) -> &CameraDescriptor {
        &self.camera
    }

    /// Stop the session and join its thread. Idempotent.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
        self.running.store(false, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("camera", &self.camera)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn make_frame(value: u8) -> Frame {
        Frame::new(vec![value; 300], 10, 10, PixelFormat::Rgb24)
    }

    /// Producer that yields a fixed number of frames, then fails.
    struct CountingProducer {
        remaining: u32,
    }

    impl FrameProducer for CountingProducer {
        fn next_frame(&mut self) -> Result<Frame> {
            if self.remaining == 0 {
                return Err(CameraError::Stream("exhausted".to_string()));
            }
            self.remaining -= 1;
            std::thread::sleep(Duration::from_millis(1));
            Ok(make_frame(self.remaining as u8))
        }
    }

    fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn frame_validity_checks_dimensions_and_length() {
        assert!(make_frame(0).is_valid());
        assert!(!Frame::new(vec![], 0, 10, PixelFormat::Rgb24).is_valid());
        assert!(!Frame::new(vec![0; 299], 10, 10, PixelFormat::Rgb24).is_valid());
        assert!(!Frame::new(vec![0; 300], 10, 10, PixelFormat::Rgba32).is_valid());
        assert!(Frame::new(vec![0; 400], 10, 10, PixelFormat::Rgba32).is_valid());
    }

    #[test]
    fn frame_validity_rejects_overflowing_dimensions() {
        let frame = Frame::new(vec![0; 3], u32::MAX, u32::MAX, PixelFormat::Rgba32);
        assert!(!frame.is_valid());
    }

    #[test]
    fn frame_slot_returns_none_when_empty() {
        let slot = FrameSlot::new();
        assert!(slot.latest().is_none());
        assert_eq!(slot.sequence(), 0);
    }

    #[test]
    fn frame_slot_keeps_only_the_newest_frame() {
        let slot = FrameSlot::new();
        slot.push(make_frame(1));
        slot.push(make_frame(2));

        let (sequence, latest) = slot.latest().unwrap();
        assert_eq!(sequence, 2);
        assert_eq!(latest.data[0], 2);
    }

    #[test]
    fn frame_slot_latest_returns_arc_not_clone() {
        let slot = FrameSlot::new();
        slot.push(make_frame(42));

        let (_, a) = slot.latest().unwrap();
        let (_, b) = slot.latest().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn frame_slot_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FrameSlot>();
    }

    #[test]
    fn session_pushes_frames_into_slot() {
        let session = CaptureSession::spawn(
            CameraDescriptor::new(0, "counting"),
            Box::new(|| Ok(Box::new(CountingProducer { remaining: 5 }) as Box<dyn FrameProducer>)),
        )
        .unwrap();

        assert!(wait_until(Duration::from_secs(2), || session
            .slot()
            .sequence()
            >= 5));
        let (_, frame) = session.slot().latest().unwrap();
        assert_eq!(frame.size(), Size::new(10, 10));
    }

    #[test]
    fn session_stops_running_when_producer_fails() {
        let session = CaptureSession::spawn(
            CameraDescriptor::new(0, "counting"),
            Box::new(|| Ok(Box::new(CountingProducer { remaining: 1 }) as Box<dyn FrameProducer>)),
        )
        .unwrap();

        assert!(wait_until(Duration::from_secs(2), || session.slot().sequence() == 1
            && !session.is_running()));
    }

    #[test]
    fn session_with_failing_factory_never_runs() {
        let mut session = CaptureSession::spawn(
            CameraDescriptor::new(7, "broken"),
            Box::new(|| Err(CameraError::Open("device busy".to_string()))),
        )
        .unwrap();

        session.stop();
        assert!(!session.is_running());
        assert!(session.slot().latest().is_none());
    }

    #[test]
    fn session_stop_is_idempotent() {
        let mut session = CaptureSession::spawn(
            CameraDescriptor::new(0, "counting"),
            Box::new(|| Ok(Box::new(CountingProducer { remaining: 1000 }) as Box<dyn FrameProducer>)),
        )
        .unwrap();

        session.stop();
        session.stop(); // Should not panic
        assert!(!session.is_running());
    }

    #[test]
    fn session_debug_names_its_camera() {
        let mut session = CaptureSession::spawn(
            CameraDescriptor::new(7, "broken"),
            Box::new(|| Err(CameraError::Open("device busy".to_string()))),
        )
        .unwrap();
        session.stop();

        let debug = format!("{session:?}");
        assert!(debug.contains("broken"), "{debug}");
        assert!(debug.contains("running: false"), "{debug}");
    }
}
