//! Error types for the discord-archiver application.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::types::DiscordError;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid destination '{}': {reason}", path.display())]
    Destination { path: PathBuf, reason: String },

    // API errors
    #[error("API error: {0}")]
    Api(String),

    #[error("Discord error: {0}")]
    Discord(Box<DiscordError>),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Request queue is closed")]
    QueueClosed,

    // Download errors
    #[error("Download failed: {0}")]
    Download(String),

    // File system errors
    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<DiscordError> for Error {
    fn from(err: DiscordError) -> Self {
        Error::Discord(Box::new(err))
    }
}

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const API_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
    pub const SOME_CHANNELS_FAILED: i32 = 6;
}
