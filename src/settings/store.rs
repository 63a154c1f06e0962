use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::settings::error::{Result, SettingsError};
use crate::settings::types::Config;

const APP_DIR: &str = "kolo-face";
const CONFIG_FILE: &str = "config.json";

/// JSON-backed config file. Only written on an explicit [`ConfigStore::save`].
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<user config dir>/kolo-face/config.json`, or relative to the
    /// working directory when the platform reports no config dir.
    pub fn at_default_location() -> Self {
        Self::new(Self::default_path())
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(CONFIG_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config, returning defaults when the file does not exist.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            debug!("no config at {}, using defaults", self.path.display());
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the config atomically (write .tmp then rename).
    pub fn save(&self, config: &Config) -> Result<()> {
        let io_error = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_string_pretty(config).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json).map_err(io_error)?;
        std::fs::rename(&tmp_path, &self.path).map_err(io_error)?;

        info!("saved config to {}", self.path.display());
        Ok(())
    }
}
