// Configuration - load settings from config.toml
//
// Provides sensible defaults if the config file is missing or has errors.
// The defaults reproduce the hard-coded values of the original tutorial:
// an 800x600 window at (100, 100) cleared to yellow.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub graphics: GraphicsConfig,
    pub debug: DebugConfig,
}

/// Window settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub position: [i32; 2],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "My Shiny Vulkan Window".to_string(),
            width: 800,
            height: 600,
            position: [100, 100],
        }
    }
}

/// Graphics settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    pub clear_color: [f32; 4],
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            clear_color: [1.0, 1.0, 0.0, 1.0],
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub validation_layers: bool,
    pub show_fps: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            validation_layers: true,
            show_fps: true,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults if not found
    pub fn load() -> Self {
        Self::load_from_path("config.toml").unwrap_or_else(|e| {
            log::warn!("Failed to load config.toml: {}. Using defaults.", e);
            Config::default()
        })
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        log::info!("Loaded configuration from {:?}", path);
        log::debug!("Config: {:?}", config);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_values() {
        let config = Config::default();
        assert_eq!(config.window.title, "My Shiny Vulkan Window");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.window.position, [100, 100]);
        assert_eq!(config.graphics.clear_color, [1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let config: Config = toml::from_str(
            r#"
            [window]
            width = 1920
            height = 1080
            "#,
        )
        .unwrap();

        assert_eq!(config.window.width, 1920);
        assert_eq!(config.window.height, 1080);
        // Unspecified fields fall back to defaults
        assert_eq!(config.window.title, "My Shiny Vulkan Window");
        assert_eq!(config.graphics.clear_color, [1.0, 1.0, 0.0, 1.0]);
        assert!(config.debug.validation_layers);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from_path("does/not/exist.toml").unwrap();
        assert_eq!(config.window.width, 800);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = std::env::temp_dir().join("vk-triangle-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "[window\nwidth = oops").unwrap();

        assert!(Config::load_from_path(&path).is_err());

        let _ = std::fs::remove_file(&path);
    }
}
