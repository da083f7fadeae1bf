//! Window and camera configuration.
//!
//! Built in code with the builder methods, or loaded from TOML:
//!
//! ```toml
//! title = "Material showcase"
//! width = 1280
//! height = 720
//! clear_color = [0.4, 0.6, 0.75, 0.0]
//!
//! [camera]
//! fov_degrees = 80.0
//! movement_speed = 1.0
//! look_gating = "held"
//! ```
//!
//! Missing keys keep their defaults.

use std::path::Path;

use serde::Deserialize;

use crate::camera::CameraSettings;
use crate::error::ConfigError;
use crate::input::KeyBindings;

/// Configuration for the app window and its scene.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f32; 4],
    pub camera: CameraSettings,
    /// Not read from TOML; set in code.
    #[serde(skip)]
    pub key_bindings: KeyBindings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Vantage".to_string(),
            width: 1280,
            height: 720,
            clear_color: [0.4, 0.6, 0.75, 0.0],
            camera: CameraSettings::default(),
            key_bindings: KeyBindings::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn camera(mut self, camera: CameraSettings) -> Self {
        self.camera = camera;
        self
    }

    pub fn clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn key_bindings(mut self, bindings: KeyBindings) -> Self {
        self.key_bindings = bindings;
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Width over height, guarding against a zero height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::LookGating;
    use approx::assert_relative_eq;

    #[test]
    fn empty_toml_is_the_default() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.title, "Vantage");
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.camera, CameraSettings::default());
    }

    #[test]
    fn partial_camera_table_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            title = "Showcase"
            width = 800
            height = 600

            [camera]
            fov_degrees = 60.0
            look_gating = "held"
            "#,
        )
        .unwrap();

        assert_eq!(config.title, "Showcase");
        assert_relative_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.look_gating, LookGating::Held);
        assert_relative_eq!(
            config.camera.look_speed,
            CameraSettings::default().look_speed
        );
        assert_relative_eq!(config.aspect_ratio(), 800.0 / 600.0);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let result = AppConfig::from_toml_str("width = \"wide\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = AppConfig::load("no/such/vantage.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn builder() {
        let config = AppConfig::new()
            .title("Demo")
            .size(640, 0)
            .clear_color([0.0, 0.0, 0.0, 1.0]);
        assert_eq!(config.title, "Demo");
        assert_relative_eq!(config.aspect_ratio(), 640.0);
        assert_eq!(config.clear_color, [0.0, 0.0, 0.0, 1.0]);
    }
}
