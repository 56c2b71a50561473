//! Error types for histoseek

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to decode image '{id}': {reason}")]
    Decode { id: String, reason: String },

    #[error("Fingerprint length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Corpus source not found: {0}")]
    MissingCorpusSource(String),

    #[error("Image not in corpus: {0}")]
    UnknownImage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn decode(id: impl Into<String>, reason: impl ToString) -> Self {
        Error::Decode {
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}
