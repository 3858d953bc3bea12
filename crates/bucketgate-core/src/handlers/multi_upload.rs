//! `PUT /multiupload/{path...}`: store every file part of a multipart body
//!
//! Parts are stored strictly in body order, one `put` at a time, before the
//! scanner looks for the next boundary. There is no rollback: when the scan
//! aborts or a `put` fails, parts stored earlier in the same request stay
//! stored; the failure is logged at `warn` with the stored count.

use super::{object_path, storage_error};
use crate::multipart::{extract_boundary, Scanner, Step};
use crate::storage::Sink;
use crate::{Error, Request, Response, Result};

/// Key for a part: `{storage_path}/{filename}`, or the bare filename when
/// the storage path is empty
pub fn part_key(storage_path: &str, filename: &str) -> String {
    let folder = storage_path.trim_end_matches('/');
    if folder.is_empty() {
        filename.to_string()
    } else {
        format!("{folder}/{filename}")
    }
}

/// Drive `scanner` to completion, storing each file part under
/// `storage_path`. Returns the stored keys in body order.
pub async fn store_parts(
    sink: &dyn Sink,
    scanner: &Scanner,
    storage_path: &str,
    content_type: &str,
) -> Result<Vec<String>> {
    let mut stored = Vec::new();
    let mut cursor = 0;

    loop {
        match scanner.step(cursor) {
            Step::Emit { part, next } => {
                let key = part_key(storage_path, &part.filename);
                let size = part.content.len();
                tracing::debug!(key, size, "found file");

                if let Err(err) = sink.put(&key, part.content, Some(content_type)).await {
                    tracing::warn!(
                        key,
                        stored = stored.len(),
                        error = %err,
                        "storing part failed; earlier parts remain stored"
                    );
                    return Err(match err {
                        Error::InvalidPath(_) => Error::RejectedPart {
                            key,
                            stored: stored.len(),
                        },
                        other => other,
                    });
                }

                tracing::info!(key, size, "stored part");
                stored.push(key);
                cursor = next;
            }
            Step::Skip { next } => cursor = next,
            Step::Done => return Ok(stored),
            Step::Aborted(reason) => {
                tracing::warn!(
                    %reason,
                    stored = stored.len(),
                    "multipart scan aborted; earlier parts remain stored"
                );
                return Err(Error::MalformedMultipart {
                    reason,
                    stored: stored.len(),
                });
            }
        }
    }
}

pub async fn multi_upload(sink: &dyn Sink, req: &Request, content_type: &str) -> Result<Response> {
    let boundary = extract_boundary(req.content_type())?;
    let storage_path = object_path(req);
    let scanner = Scanner::new(req.body.clone(), boundary);

    match store_parts(sink, &scanner, &storage_path, content_type).await {
        Ok(keys) => {
            tracing::info!(path = %storage_path, files = keys.len(), "multi upload complete");
            Ok(Response::text("Files uploaded successfully"))
        }
        Err(err @ (Error::MalformedMultipart { .. } | Error::RejectedPart { .. })) => Err(err),
        Err(err) => storage_error(err, &storage_path, "Error uploading file"),
    }
}
