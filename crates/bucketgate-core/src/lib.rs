//! bucketgate-core: HTTP gateway in front of a key-addressed blob store
//!
//! Three operations are exposed over HTTP:
//! - `PUT /upload/{path...}` stores the raw request body under `path`
//! - `PUT /multiupload/{path...}` stores every file part of a
//!   `multipart/form-data` body under `path/{filename}`
//! - `GET /download/{path...}` returns a stored object as an attachment
//!
//! Storage is reached through the [`Sink`] trait so the same
//! [`Gateway`] runs against [`MemoryStore`], [`FsStore`] or a test double.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod request;
pub mod response;
pub mod server;
pub mod storage;

// Re-exports
pub use config::{ServerConfig, StoreConfig, DEFAULT_MULTIPART_CONTENT_TYPE};
pub use error::{Error, Result};
pub use gateway::{Gateway, Route};
pub use request::{encode_uri_component, percent_decode, Method, Request, RequestBuilder};
pub use response::{Response, ResponseBuilder, StatusCode};
pub use storage::{FsStore, MemoryStore, Sink, SinkFuture, StoredObject};

// Middleware re-exports
pub use middleware::{Middleware, MiddlewareChain};

pub use server::{
    bind, collect_body, create_optimized_socket, request_head, serve, to_hyper_response,
    ConnectionTracker,
};
