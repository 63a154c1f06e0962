use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::camera::backend::CaptureBackend;
use crate::camera::error::{CameraError, Result as CameraResult};
use crate::camera::types::{CameraDescriptor, Size};
use crate::diagnostics::stats::{DiagnosticSnapshot, DiagnosticStats};
use crate::overlay::error::Result as RenderResult;
use crate::preview::capture::{CaptureSession, Frame};
use crate::preview::sink::{Sink, SinkId};

/// Called with the new frame size before any sink sees a frame of that size.
pub type SizeListener = Box<dyn FnMut(Size)>;

/// Hook run at the start of every frame pass, before any transform work.
/// Lets the host process pending UI events.
pub type EventPump = Box<dyn FnMut()>;

/// Owns the active camera and fans its frames out to every registered sink.
///
/// The capture thread only writes into the session's frame slot; all sink,
/// listener, and transform calls happen on the thread that calls
/// [`FrameHub::pump`] or [`FrameHub::on_frame`].
pub struct FrameHub {
    backend: Box<dyn CaptureBackend>,
    camera: Option<CameraDescriptor>,
    session: Option<CaptureSession>,
    delivering: bool,
    sinks: HashMap<SinkId, Sink>,
    size_listeners: Vec<SizeListener>,
    event_pump: Option<EventPump>,
    last_size: Option<Size>,
    last_sequence: u64,
    stats: DiagnosticStats,
}

impl FrameHub {
    pub fn new(backend: Box<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            camera: None,
            session: None,
            delivering: false,
            sinks: HashMap::new(),
            size_listeners: Vec::new(),
            event_pump: None,
            last_size: None,
            last_sequence: 0,
            stats: DiagnosticStats::new(),
        }
    }

    /// Enumerate the cameras the backend can see right now.
    pub fn list_cameras(&self) -> CameraResult<Vec<CameraDescriptor>> {
        self.backend.enumerate_cameras()
    }

    /// Install a sink, replacing any sink registered under the same id.
    pub fn register_sink(&mut self, id: impl Into<SinkId>, sink: Sink) {
        let id = id.into();
        if self.sinks.insert(id.clone(), sink).is_some() {
            debug!("replaced sink {id}");
        } else {
            debug!("registered sink {id}");
        }
    }

    /// Stop delivering to a sink. Returns whether it was registered.
    pub fn remove_sink(&mut self, id: &SinkId) -> bool {
        self.sinks.remove(id).is_some()
    }

    pub fn subscribe_size_changed(&mut self, listener: impl FnMut(Size) + 'static) {
        self.size_listeners.push(Box::new(listener));
    }

    pub fn set_event_pump(&mut self, hook: impl FnMut() + 'static) {
        self.event_pump = Some(Box::new(hook));
    }

    /// Switch to the camera at `index` of a fresh enumeration.
    ///
    /// On failure the previously selected camera stays selected. The next
    /// delivered frame always triggers a size-changed notification.
    pub fn select_camera(&mut self, index: usize) -> CameraResult<()> {
        let camera = self.resolve_camera(index)?;

        let previous = self.camera.take();
        self.close_session();

        match self.backend.open_camera(&camera) {
            Ok(session) => {
                info!("selected camera {camera}");
                self.session = Some(session);
                self.camera = Some(camera);
                self.last_size = None;
                self.last_sequence = 0;
                self.stats.reset();
                Ok(())
            }
            Err(e) => {
                error!("failed to open camera {camera}: {e}");
                if let Some(previous) = previous {
                    self.reopen(previous);
                }
                Err(e)
            }
        }
    }

    /// Make the camera at `index` current without opening it.
    ///
    /// Delivery stops and any open session is released; the next
    /// [`FrameHub::start`] opens the bound camera.
    pub fn bind_camera(&mut self, index: usize) -> CameraResult<()> {
        let camera = self.resolve_camera(index)?;
        self.stop();
        info!("bound camera {camera}");
        self.camera = Some(camera);
        self.last_size = None;
        self.last_sequence = 0;
        self.stats.reset();
        Ok(())
    }

    fn resolve_camera(&self, index: usize) -> CameraResult<CameraDescriptor> {
        let cameras = self.backend.enumerate_cameras()?;
        if cameras.is_empty() {
            warn!("camera {index} requested but no camera is available");
            return Err(CameraError::NoCameraAvailable);
        }
        cameras.get(index).cloned().ok_or_else(|| {
            CameraError::DeviceNotFound(format!("index {index} of {} cameras", cameras.len()))
        })
    }

    fn reopen(&mut self, camera: CameraDescriptor) {
        match self.backend.open_camera(&camera) {
            Ok(session) => {
                info!("restored camera {camera}");
                self.session = Some(session);
                self.last_sequence = 0;
            }
            Err(e) => error!("failed to restore camera {camera}: {e}"),
        }
        self.camera = Some(camera);
    }

    /// Begin delivering frames, opening the selected camera if needed.
    ///
    /// Opening a session restarts the diagnostic counters.
    pub fn start(&mut self) -> CameraResult<()> {
        if self.session.is_none() {
            let camera = self.camera.clone().ok_or(CameraError::NotSelected)?;
            self.session = Some(self.backend.open_camera(&camera)?);
            self.last_sequence = 0;
            self.stats.reset();
        }
        self.delivering = true;
        info!("frame delivery started");
        Ok(())
    }

    /// Stop delivering and release the capture session. Idempotent.
    pub fn stop(&mut self) {
        if self.delivering || self.session.is_some() {
            info!("frame delivery stopped");
        }
        self.delivering = false;
        self.close_session();
    }

    fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
    }

    pub fn is_delivering(&self) -> bool {
        self.delivering
    }

    pub fn current_camera(&self) -> Option<&CameraDescriptor> {
        self.camera.as_ref()
    }

    /// Size of the last delivered frame since the camera was selected.
    pub fn last_frame_size(&self) -> Option<Size> {
        self.last_size
    }

    /// Deliver the newest captured frame if it has not been delivered yet.
    ///
    /// Returns whether a frame was processed.
    pub fn pump(&mut self) -> RenderResult<bool> {
        if !self.delivering {
            return Ok(false);
        }
        let Some((sequence, frame)) = self.session.as_ref().and_then(|s| s.slot().latest()) else {
            return Ok(false);
        };
        if sequence == self.last_sequence {
            return Ok(false);
        }
        self.last_sequence = sequence;
        self.on_frame(&frame)?;
        Ok(true)
    }

    /// Hand one frame to every sink.
    ///
    /// Invalid frames are dropped without touching any sink. A failing sink
    /// aborts the pass; sinks after it do not see this frame.
    pub fn on_frame(&mut self, frame: &Frame) -> RenderResult<()> {
        if let Some(pump) = self.event_pump.as_mut() {
            pump();
        }

        if !frame.is_valid() {
            self.stats.record_drop();
            debug!(
                "dropping invalid {}x{} frame ({} bytes)",
                frame.width,
                frame.height,
                frame.data.len()
            );
            return Ok(());
        }

        let size = frame.size();
        if self.last_size != Some(size) {
            info!("frame size changed to {size}");
            self.stats.record_size_change();
            for listener in &mut self.size_listeners {
                listener(size);
            }
            self.last_size = Some(size);
        }

        for (id, sink) in &mut self.sinks {
            if let Err(e) = sink.deliver(frame) {
                warn!("sink {id} failed: {e}");
                return Err(e);
            }
        }
        self.stats.record_delivery(size);
        Ok(())
    }

    pub fn diagnostics(&self) -> DiagnosticSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for FrameHub {
    fn drop(&mut self) {
        self.stop();
    }
}
