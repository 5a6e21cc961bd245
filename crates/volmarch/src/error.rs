//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! construction-time misconfiguration, unsupported or malformed volume input, geometry
//! compilation failures, IO, and generic errors. Per-pixel numeric edge cases never surface here.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("invalid volume: {0}")]
    InvalidVolume(String),

    #[error("geometry compile error: {0}")]
    Compile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
