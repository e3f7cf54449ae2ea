//! Error types for the Grist client.
//!
//! # Design
//! Only non-200 responses become an `ApiError`; it carries the raw status
//! code and body text so callers can decide on their own retry policy. Every
//! other failure keeps the kind of the step that produced it: local
//! validation, JSON encoding, or the transport itself.

use thiserror::Error;

/// A non-200 response from the Grist API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("status: {status}, details: {details}")]
pub struct ApiError {
    pub status: u16,
    pub details: String,
}

/// Errors returned by `GristClient` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with a status other than 200.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A local precondition failed; no request was sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The request payload could not be encoded to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// DNS, connect, TLS or I/O failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// A 200 response whose body the endpoint could not post-process.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Missing or malformed client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Transport(err.into())
    }

    /// HTTP status of an `Api` error, `None` for every other kind.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(api) => Some(api.status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
