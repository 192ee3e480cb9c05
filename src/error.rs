//! Error types for Pronounce

use std::time::Duration;

use thiserror::Error;

/// Result type alias using Pronounce's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in Pronounce
///
/// Provider errors never reach the learner: the adapter swaps in a simulated
/// transcript instead. They surface only from the providers themselves.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Provider not configured: {0}")]
    ProviderUnavailable(String),

    #[error("Provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("An attempt is already in progress")]
    AttemptInFlight,

    #[error("Session is closed")]
    SessionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => Error::Io(io),
            other => Error::Audio(other.to_string()),
        }
    }
}
