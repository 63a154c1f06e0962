use serde::{Deserialize, Serialize};

/// Default overlay diameter in logical pixels.
pub const DEFAULT_OVERLAY_SIZE: u32 = 300;

/// Persisted application configuration.
///
/// Missing keys fall back to their defaults so older files keep loading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Index of the camera to open at startup.
    pub camera_id: usize,
    /// Overlay diameter in logical pixels.
    pub size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_id: 0,
            size: DEFAULT_OVERLAY_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_first_camera_and_300px() {
        let config = Config::default();
        assert_eq!(config.camera_id, 0);
        assert_eq!(config.size, 300);
    }

    #[test]
    fn config_serialises_with_snake_case_keys() {
        let json = serde_json::to_value(Config {
            camera_id: 2,
            size: 240,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"camera_id": 2, "size": 240}));
    }

    #[test]
    fn missing_keys_take_defaults() {
        let config: Config = serde_json::from_str(r#"{"camera_id": 1}"#).unwrap();
        assert_eq!(
            config,
            Config {
                camera_id: 1,
                size: 300
            }
        );

        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config: Config =
            serde_json::from_str(r#"{"camera_id": 0, "size": 400, "theme": "dark"}"#).unwrap();
        assert_eq!(config.size, 400);
    }

    #[test]
    fn negative_camera_id_is_rejected() {
        let result: Result<Config, _> = serde_json::from_str(r#"{"camera_id": -1}"#);
        assert!(result.is_err());
    }
}
