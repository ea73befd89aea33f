use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_SERVICE_URL};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Drawing parameters for box outlines and identity labels, in surface pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub box_line_width: u32,
    /// Text size of the `Name` and `Title` labels.
    pub big_font_size: u32,
    pub font_size: u32,
    pub padding: u32,
    pub box_color: [u8; 3],
    /// TrueType/OpenType font for label text. Without one, labels are
    /// drawn as empty rectangles.
    pub font_path: Option<PathBuf>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            box_line_width: 6,
            big_font_size: 40,
            font_size: 40,
            padding: 10,
            box_color: [0, 255, 0],
            font_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub service_url: String,
    pub request_timeout_ms: u64,
    pub render_interval_ms: u64,
    pub surface_width: u32,
    pub surface_height: u32,
    pub style: OverlayStyle,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            request_timeout_ms: 10_000,
            render_interval_ms: 16,
            surface_width: 1280,
            surface_height: 720,
            style: OverlayStyle::default(),
        }
    }
}

impl OverlayConfig {
    /// `<config dir>/FaceOverlay/overlay.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the config at the default path, falling back to defaults when
    /// it is missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            log::warn!("{e}; using default settings");
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Render cadence, never below one millisecond.
    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms.max(1))
    }
}
