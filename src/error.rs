//! Error types for Avaverse

use thiserror::Error;

/// Main error type for Avaverse
#[derive(Error, Debug)]
pub enum AvaverseError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Avatar error: {0}")]
    Avatar(#[from] AvatarError),

    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Avatar loading errors
#[derive(Error, Debug)]
pub enum AvatarError {
    #[error("Failed to read model file {path}: {message}")]
    ReadModel { path: String, message: String },

    #[error("Invalid glTF/VRM data: {0}")]
    InvalidModel(String),

    #[error("Model has no VRM humanoid bones")]
    NoHumanoid,

    #[error("Avatar loader task failed: {0}")]
    LoaderTask(String),
}

/// Detection source and tracker subprocess errors
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Detection source read error: {0}")]
    Read(String),

    #[error("Detection message parse error: {0}")]
    Parse(String),

    #[error("Tracker subprocess error: {0}")]
    Subprocess(String),
}

/// Renderer / browser output errors
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to bind to address: {0}")]
    Bind(String),

    #[error("HTTP server error: {0}")]
    Server(String),
}

/// Result type alias for Avaverse operations
pub type Result<T> = std::result::Result<T, AvaverseError>;
