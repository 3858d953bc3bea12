//! In-memory sink

use super::{Sink, SinkFuture, StoredObject};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Sink backed by a `HashMap`; contents are lost on restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Stored keys in lexical order
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Sink for MemoryStore {
    fn put<'a>(
        &'a self,
        key: &'a str,
        content: Bytes,
        content_type: Option<&'a str>,
    ) -> SinkFuture<'a, ()> {
        let object = StoredObject {
            body: content,
            content_type: content_type.map(str::to_string),
        };
        Box::pin(async move {
            self.objects.write().insert(key.to_string(), object);
            Ok(())
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> SinkFuture<'a, Option<StoredObject>> {
        Box::pin(async move { Ok(self.objects.read().get(key).cloned()) })
    }
}
