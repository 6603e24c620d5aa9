//! Error types for grouped HTTP service clients.
//!
//! # Design
//! Configuration failures (bad base URL, unknown group, malformed path
//! template) surface while the registry is being assembled and abort
//! startup. Everything else is raised by a proxy call and handed straight to
//! the caller: a 404 is an `HttpError` like any other non-2xx status, never
//! an empty result.

/// Errors returned while configuring groups or invoking service operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid or missing group, base URL, header, binding or descriptor.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The response body could not be decoded into the declared shape.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// A binding declared by the operation was not supplied by the caller.
    #[error("operation `{operation}` requires argument `{name}`")]
    MissingArgument { operation: String, name: String },

    /// The caller supplied an argument the operation does not declare.
    #[error("operation `{operation}` does not accept argument `{name}`")]
    UnexpectedArgument { operation: String, name: String },

    /// An argument was supplied with a value the request cannot carry.
    #[error("operation `{operation}` rejects argument `{name}`: {reason}")]
    InvalidArgument {
        operation: String,
        name: String,
        reason: String,
    },

    /// The underlying HTTP library failed before a response was received.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ApiError::Configuration(msg.into())
    }

    /// Status code of an `HttpError`, `None` for every other variant.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
