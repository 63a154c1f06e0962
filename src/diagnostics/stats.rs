use serde::Serialize;
use std::time::Instant;

use crate::camera::types::Size;

/// Delivery counters for a frame hub.
pub struct DiagnosticStats {
    frames_delivered: u64,
    frames_dropped: u64,
    size_changes: u64,
    start_time: Instant,
    last_frame_size: Option<Size>,
}

/// Snapshot of diagnostic stats for logging and serialisation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSnapshot {
    pub fps: f64,
    pub frames_delivered: u64,
    pub frames_dropped: u64,
    pub size_changes: u64,
    pub last_frame_size: Option<Size>,
}

impl DiagnosticStats {
    /// Create new stats with zeroed counters.
    pub fn new() -> Self {
        Self {
            frames_delivered: 0,
            frames_dropped: 0,
            size_changes: 0,
            start_time: Instant::now(),
            last_frame_size: None,
        }
    }

    /// Record a frame handed to the sinks.
    pub fn record_delivery(&mut self, size: Size) {
        self.frames_delivered += 1;
        self.last_frame_size = Some(size);
    }

    /// Record a frame that failed validation.
    pub fn record_drop(&mut self) {
        self.frames_dropped += 1;
    }

    /// Record a change of the incoming frame size.
    pub fn record_size_change(&mut self) {
        self.size_changes += 1;
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    pub fn size_changes(&self) -> u64 {
        self.size_changes
    }

    /// Average delivery rate since the counters were last reset.
    pub fn fps(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed < 0.001 {
            return 0.0;
        }
        self.frames_delivered as f64 / elapsed
    }

    /// Reset all counters. Called whenever the hub opens a capture session.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Take a serialisable snapshot.
    pub fn snapshot(&self) -> DiagnosticSnapshot {
        DiagnosticSnapshot {
            fps: self.fps(),
            frames_delivered: self.frames_delivered,
            frames_dropped: self.frames_dropped,
            size_changes: self.size_changes,
            last_frame_size: self.last_frame_size,
        }
    }
}

impl Default for DiagnosticStats {
    fn default() -> Self {
        Self::new()
    }
}
