use std::path::PathBuf;
use thiserror::Error;

/// Result alias for materializer operations.
pub type Result<T> = std::result::Result<T, MaterializeError>;

/// Canonical materializer error surface.
///
/// Every variant is terminal for the startup sequence: the caller must not
/// start the application after any of these, and there is no retry policy.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// No variable name was supplied.
    #[error("a variable name must be provided")]
    Usage,
    /// The named variable is unset or empty. Only the name is surfaced; the
    /// rest of the environment is never echoed into logs.
    #[error("variable `{name}` is not set or is empty")]
    MissingVariable {
        /// Name of the variable that was looked up.
        name: String,
    },
    /// The variable's value is not valid base64.
    #[error("variable `{name}` does not hold valid base64: {source}")]
    Decode {
        /// Name of the variable that was decoded.
        name: String,
        /// Underlying decode failure.
        source: base64::DecodeError,
    },
    /// The decoded payload is not well-formed JSON.
    #[error("decoded payload is not well-formed JSON: {source}")]
    InvalidPayload {
        /// Underlying parse failure.
        source: serde_json::Error,
    },
    /// Writing or cleaning up the output file failed.
    #[error("output file `{path}`: {source}")]
    Io {
        /// Path being written or removed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
}

impl MaterializeError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            MaterializeError::Usage => "usage",
            MaterializeError::MissingVariable { .. } => "missing_variable",
            MaterializeError::Decode { .. } => "decode",
            MaterializeError::InvalidPayload { .. } => "invalid_payload",
            MaterializeError::Io { .. } => "io",
        }
    }
}
