use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::render::mapper::FlipMode;
use crate::render::pipeline::DEFAULT_PREVIEW_SIZES;

#[derive(Debug, Default, Serialize, Deserialize)]
/// Persisted UI/application settings for Portrait.
pub struct AppConfig {
    pub window_width: Option<f32>,
    pub window_height: Option<f32>,
    pub preview_sizes: Option<Vec<u32>>,
    /// Require Ctrl/Cmd for wheel zoom so plain scrolling is not hijacked.
    pub wheel_zoom_needs_modifier: Option<bool>,
    /// Whether the export/preview sampling un-mirrors flipped views.
    pub flip_mode: Option<FlipMode>,
}

impl AppConfig {
    /// Returns the user config file path, if a config directory is available.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("portrait").join("config.toml"))
    }

    /// Loads config from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_default()
    }

    /// Writes config to disk, ignoring filesystem/serialization errors.
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(s) = toml::to_string_pretty(self) {
            let _ = std::fs::write(&path, s);
        }
    }

    pub fn preview_sizes(&self) -> Vec<u32> {
        match &self.preview_sizes {
            Some(sizes) if !sizes.is_empty() => sizes.clone(),
            _ => DEFAULT_PREVIEW_SIZES.to_vec(),
        }
    }

    pub fn wheel_zoom_needs_modifier(&self) -> bool {
        self.wheel_zoom_needs_modifier.unwrap_or(true)
    }

    pub fn flip_mode(&self) -> FlipMode {
        self.flip_mode.unwrap_or_default()
    }
}
