//! Key-addressed blob storage
//!
//! Handlers never reach a global store; they are given an `Arc<dyn Sink>`
//! when the [`Gateway`](crate::Gateway) is built.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use crate::Result;
use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`Sink`] operations
pub type SinkFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// An object as held by a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    /// Content type declared at upload time, if any
    pub content_type: Option<String>,
}

/// Blob store the gateway writes to and reads from
pub trait Sink: Send + Sync {
    /// Store `content` under `key`, replacing any existing object
    fn put<'a>(
        &'a self,
        key: &'a str,
        content: Bytes,
        content_type: Option<&'a str>,
    ) -> SinkFuture<'a, ()>;

    /// Fetch the object stored under `key`; `Ok(None)` when absent
    fn get<'a>(&'a self, key: &'a str) -> SinkFuture<'a, Option<StoredObject>>;
}
