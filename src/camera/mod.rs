// Camera domain: enumeration and capture backends.

pub mod backend;
#[cfg(feature = "nokhwa")]
pub mod device;
pub mod dummy;
pub mod error;
pub mod types;
