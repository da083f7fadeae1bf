//! Error types.
//!
//! Per-frame drawing never fails: the backend logs and carries on. Errors only
//! surface from resource creation, configuration loading and scene setup.

use std::path::PathBuf;

/// Failures while creating or loading GPU resources.
#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    /// A cube-map image must be six square faces stacked vertically.
    #[error("cube map must be N x 6N pixels, got {width}x{height}")]
    InvalidCubeMap { width: u32, height: u32 },

    #[error("texture data has {actual} bytes, expected {expected}")]
    TextureSize { expected: usize, actual: usize },

    #[error("surface error: {0}")]
    Surface(String),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(String),

    #[error("failed to create device: {0}")]
    Device(String),
}

/// Failures while loading an [`AppConfig`](crate::AppConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failures while assembling a [`Scene`](crate::Scene).
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("too many {kind} lights (the lit shaders accept {max})")]
    TooManyLights { kind: &'static str, max: usize },
}

/// Failures that end [`run`](crate::run).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Graphics(#[from] GraphicsError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}
