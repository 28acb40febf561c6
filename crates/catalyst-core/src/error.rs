//! Unified Error Model
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalystError {
    #[error("CONFIG/{0}")]
    ConfigError(String),

    #[error("IO/{0}")]
    IoError(String),

    #[error("TEMPLATE/{0}")]
    TemplateError(String),

    #[error("MODEL/{0}")]
    ModelError(String),

    #[error("SERIALIZE/{0}")]
    SerializeError(String),
}

impl From<std::io::Error> for CatalystError {
    fn from(e: std::io::Error) -> Self {
        CatalystError::IoError(e.to_string())
    }
}

impl From<serde_json::Error> for CatalystError {
    fn from(e: serde_json::Error) -> Self {
        CatalystError::SerializeError(e.to_string())
    }
}
