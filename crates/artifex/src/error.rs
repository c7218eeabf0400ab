//! Error types for Artifex

use thiserror::Error;

/// Main error type for Artifex operations
///
/// The dividing line through this taxonomy: transport-level failures
/// (credentials, HTTP status, network) are errors; anything about the
/// *content* of a stream or response is absorbed by the relay and the
/// artifact decoder and never surfaces here.
#[derive(Error, Debug)]
pub enum ArtifexError {
    /// Missing or empty credentials, detected before any network call
    #[error("Authentication error: no API key available for provider '{provider}'")]
    Authentication { provider: &'static str },

    /// Upstream returned a non-success HTTP status
    #[error("Provider error: upstream returned {status}: {body}")]
    Provider { status: u16, body: String },

    /// Transport-level failure (connect, DNS, timeout, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server errors
    #[error("Server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Artifex operations
pub type Result<T> = std::result::Result<T, ArtifexError>;
