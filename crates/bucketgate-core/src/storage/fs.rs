//! Directory-backed sink
//!
//! Layout under the root directory:
//! - `objects/<key>` - object bytes
//! - `meta/<key>` - declared content type (absent when none was given)

use super::{Sink, SinkFuture, StoredObject};
use crate::{Error, Result};
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Sink that keeps objects as files under a root directory
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a key to a relative path, refusing anything that could escape
    /// the root (`..`, absolute paths) and empty or `.` segments.
    fn sanitize_key(key: &str) -> Result<PathBuf> {
        let invalid = || Error::InvalidPath(key.to_string());

        if key.is_empty() || key.split('/').any(|s| s.is_empty() || s == "." || s == "..") {
            return Err(invalid());
        }

        let mut result = PathBuf::new();
        for component in Path::new(key).components() {
            match component {
                Component::Normal(c) => result.push(c),
                _ => return Err(invalid()),
            }
        }
        Ok(result)
    }

    fn paths(&self, key: &str) -> Result<(PathBuf, PathBuf)> {
        let relative = Self::sanitize_key(key)?;
        Ok((
            self.root.join("objects").join(&relative),
            self.root.join("meta").join(&relative),
        ))
    }
}

fn storage_failure(key: &str, err: std::io::Error) -> Error {
    Error::StorageFailure(format!("{key}: {err}"))
}

async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) => tokio::fs::create_dir_all(parent).await,
        None => Ok(()),
    }
}

impl Sink for FsStore {
    fn put<'a>(
        &'a self,
        key: &'a str,
        content: Bytes,
        content_type: Option<&'a str>,
    ) -> SinkFuture<'a, ()> {
        Box::pin(async move {
            let (object_path, meta_path) = self.paths(key)?;

            ensure_parent(&object_path)
                .await
                .map_err(|e| storage_failure(key, e))?;
            tokio::fs::write(&object_path, &content)
                .await
                .map_err(|e| storage_failure(key, e))?;

            match content_type {
                Some(content_type) => {
                    ensure_parent(&meta_path)
                        .await
                        .map_err(|e| storage_failure(key, e))?;
                    tokio::fs::write(&meta_path, content_type)
                        .await
                        .map_err(|e| storage_failure(key, e))?;
                }
                None => match tokio::fs::remove_file(&meta_path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(storage_failure(key, e)),
                },
            }

            Ok(())
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> SinkFuture<'a, Option<StoredObject>> {
        Box::pin(async move {
            let (object_path, meta_path) = self.paths(key)?;

            let body = match tokio::fs::read(&object_path).await {
                Ok(body) => body,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(storage_failure(key, e)),
            };

            let content_type = match tokio::fs::read_to_string(&meta_path).await {
                Ok(content_type) => Some(content_type),
                Err(e) if e.kind() == ErrorKind::NotFound => None,
                Err(e) => return Err(storage_failure(key, e)),
            };

            Ok(Some(StoredObject {
                body: Bytes::from(body),
                content_type,
            }))
        })
    }
}
