use std::path::PathBuf;

use thiserror::Error;

/// Config persistence errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("config I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config at {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, SettingsError>;
