//! Application configuration.
//!
//! [`AppConfig`] is read from JSON. Every field has a default, so an empty
//! object (or no file at all) yields a runnable configuration.
//!
//! ```
//! use hearth_app::config::AppConfig;
//!
//! let config = AppConfig::from_json(r#"{ "gameplay_scene": "arena" }"#).unwrap();
//! assert_eq!(config.gameplay_scene, "arena");
//! assert_eq!(config.ui_root_container, "ui-root");
//! ```

use std::path::Path;

use hearth_ui::collab::VisualTemplate;
use serde::{Deserialize, Serialize};

use crate::AppError;

/// Startup configuration for the game shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name of the container window visuals are parented to.
    pub ui_root_container: String,
    /// Scene that is active when the process starts.
    pub boot_scene: String,
    /// Scene the bootstrap state loads before entering gameplay.
    pub gameplay_scene: String,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Visual templates available to the asset provider.
    pub templates: Vec<VisualTemplate>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ui_root_container: "ui-root".to_owned(),
            boot_scene: "boot".to_owned(),
            gameplay_scene: "game".to_owned(),
            log_filter: "warn".to_owned(),
            templates: vec![VisualTemplate::new("Settings", "headless")],
        }
    }
}

impl AppConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AppError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }
}
