//! `PUT /upload/{path...}`: store the raw body under the path

use super::{object_path, storage_error};
use crate::storage::Sink;
use crate::{Error, Request, Response, Result};

/// Split an object path into folder and filename
///
/// The filename is the last `/`-separated segment and must be non-empty.
pub fn split_key(path: &str) -> Result<(&str, &str)> {
    let (folder, filename) = path.rsplit_once('/').unwrap_or(("", path));
    if filename.is_empty() {
        return Err(Error::InvalidPath(format!("no filename in {path:?}")));
    }
    Ok((folder, filename))
}

/// Join folder and filename; an empty folder yields the bare filename
pub fn join_key(folder: &str, filename: &str) -> String {
    if folder.is_empty() {
        filename.to_string()
    } else {
        format!("{folder}/{filename}")
    }
}

pub async fn upload(sink: &dyn Sink, req: &Request) -> Result<Response> {
    let path = object_path(req);
    let (folder, filename) = split_key(&path)?;
    let key = join_key(folder, filename);

    if req.body.is_empty() {
        return Err(Error::EmptyUpload);
    }

    let content_type = req.content_type();
    if let Err(err) = sink.put(&key, req.body.clone(), content_type).await {
        return storage_error(err, &key, "Error uploading file");
    }

    tracing::info!(key, size = req.body.len(), content_type, "stored upload");
    Ok(Response::text(format!("File uploaded to {key} successfully!")))
}
