use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body (HTTP {status}): {source}")]
    Decode {
        status: StatusCode,
        source: reqwest::Error,
    },

    #[error("HTTP {status}: {message}")]
    Protocol { status: StatusCode, message: String },

    #[error("Device revoked by admin")]
    Revoked,

    #[error("Device was not activated after {0} attempts")]
    Timeout(u32),
}

impl Error {
    /// True when the server refused the device because it has been revoked.
    ///
    /// Only the status code is consulted, never the message text.
    pub fn is_revoked(&self) -> bool {
        match self {
            Error::Revoked => true,
            Error::Protocol { status, .. } => *status == StatusCode::FORBIDDEN,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
