//! Error taxonomy shared by the API clients and startup code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Network-level failure before a response could be read.
    #[error("network failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// A remote API answered with a non-success status.
    #[error("upstream API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// A response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Parse(String),

    /// A required configuration value is missing or invalid.
    #[error("configuration: {0}")]
    Config(String),

    /// The spreadsheet does not match the expected shape.
    #[error("validation: {0}")]
    Validation(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
