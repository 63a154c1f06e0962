// Preview pipeline: capture sessions, the frame hub, and display sinks.

pub mod capture;
pub mod hub;
pub mod sink;
