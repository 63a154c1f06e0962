// Settings: persisted camera and overlay configuration.

pub mod error;
pub mod store;
pub mod types;
