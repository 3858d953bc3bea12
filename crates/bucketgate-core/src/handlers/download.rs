//! `GET /download/{path...}`: return a stored object as an attachment

use super::{object_path, storage_error};
use crate::storage::Sink;
use crate::{encode_uri_component, Error, Request, Response, ResponseBuilder, Result, StatusCode};

/// Used when the stored object carries no content type
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// `Content-Disposition` value naming the key's last segment
pub fn attachment_disposition(key: &str) -> String {
    let basename = key.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or("download");
    format!("attachment; filename={}", encode_uri_component(basename))
}

pub async fn download(sink: &dyn Sink, req: &Request) -> Result<Response> {
    let key = object_path(req);
    if key.is_empty() {
        return Err(Error::InvalidPath("empty file path".to_string()));
    }

    let object = match sink.get(&key).await {
        Ok(Some(object)) => object,
        Ok(None) => return Err(Error::ObjectNotFound(key.clone())),
        Err(err) => return storage_error(err, &key, "Error retrieving file"),
    };

    let content_type = object.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
    tracing::debug!(key, size = object.body.len(), content_type, "serving download");

    Ok(ResponseBuilder::new(StatusCode::OK)
        .header("content-type", content_type)
        .header("content-disposition", attachment_disposition(&key))
        .body(object.body)
        .build())
}
