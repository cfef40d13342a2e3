//! Error types for the Mason core library

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MasonError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<toml::de::Error> for MasonError {
    fn from(error: toml::de::Error) -> Self {
        MasonError::Config(error.to_string())
    }
}

pub type MasonResult<T> = Result<T, MasonError>;
