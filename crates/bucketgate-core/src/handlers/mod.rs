//! Gateway endpoint handlers
//!
//! Each handler receives the sink explicitly and returns `Result<Response>`;
//! validation errors propagate with `?` and are rendered by the gateway.

pub mod download;
pub mod multi_upload;
pub mod upload;

pub use download::download;
pub use multi_upload::{multi_upload, store_parts};
pub use upload::upload;

use crate::{percent_decode, Error, Request, Response, Result};

/// Route parameter holding the object path
pub const PATH_PARAM: &str = "path";

/// `GET /`
pub fn index() -> Response {
    Response::text("Hello from bucketgate!")
}

/// Decoded object path captured by the route wildcard
fn object_path(req: &Request) -> String {
    req.param(PATH_PARAM).map(percent_decode).unwrap_or_default()
}

/// Keep path errors (client mistakes, including keys a sink refuses) and
/// turn everything else into a fixed 500 message
fn storage_error(err: Error, key: &str, message: &str) -> Result<Response> {
    match err {
        Error::InvalidPath(_) => Err(err),
        other => {
            tracing::error!(key, error = %other, "{message}");
            Ok(Response::internal_error(message))
        }
    }
}
