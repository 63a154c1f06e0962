// Diagnostics: frame delivery counters for the hub.

pub mod stats;
