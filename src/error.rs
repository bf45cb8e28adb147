use crate::updaters::BackendKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RescanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{kind} refresh failed: {message}")]
    Backend { kind: BackendKind, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl RescanError {
    pub fn backend(kind: BackendKind, message: impl Into<String>) -> Self {
        Self::Backend {
            kind,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RescanError>;
