//! Error types for bucketgate-core

use crate::multipart::Malformed;
use crate::{Response, ResponseBuilder, StatusCode};
use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the bucketgate gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid HTTP method
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Empty or malformed object path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Body exceeds the configured limit
    #[error("Request body too large: limit is {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Content-Type carries no usable `boundary=` attribute
    #[error("Could not find the boundary.")]
    MissingBoundary,

    /// Single upload with a zero-length body
    #[error("No file uploaded")]
    EmptyUpload,

    /// Scan aborted mid-body; `stored` parts were already handed to the sink
    #[error("Malformed multipart body: {reason} ({stored} file(s) stored before abort)")]
    MalformedMultipart { reason: Malformed, stored: usize },

    /// The sink refused a part's key after `stored` earlier parts were kept
    #[error("Invalid path: {key} ({stored} file(s) stored before abort)")]
    RejectedPart { key: String, stored: usize },

    /// Download miss
    #[error("File not found: {0}")]
    ObjectNotFound(String),

    /// Sink `put`/`get` failed
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Hyper error
    #[error("HTTP error: {0}")]
    Hyper(String),
}

impl Error {
    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidPath(_)
            | Error::RejectedPart { .. }
            | Error::MissingBoundary
            | Error::EmptyUpload => StatusCode::BAD_REQUEST,
            Error::ObjectNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            Error::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::MalformedMultipart { .. }
            | Error::StorageFailure(_)
            | Error::Config(_)
            | Error::Io(_)
            | Error::Hyper(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text response carrying this error's status and message
    pub fn into_response(self) -> Response {
        ResponseBuilder::new(self.status())
            .header("content-type", "text/plain; charset=utf-8")
            .body(self.to_string())
            .build()
    }
}

impl From<hyper::Error> for Error {
    fn from(err: hyper::Error) -> Self {
        Error::Hyper(err.to_string())
    }
}
