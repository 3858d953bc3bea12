//! Server configuration

use crate::middleware::BodyLimitConfig;
use crate::storage::{FsStore, MemoryStore, Sink};
use crate::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Content type stored for every part of a multi upload unless configured
pub const DEFAULT_MULTIPART_CONTENT_TYPE: &str = "application/pdf";

/// Where objects are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// In-process map, lost on restart
    Memory,
    /// Directory-backed store rooted at the given path
    Fs(PathBuf),
}

impl StoreConfig {
    /// `memory` selects the in-memory store; anything else is a directory
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "memory" | "mem" => StoreConfig::Memory,
            path => StoreConfig::Fs(PathBuf::from(path)),
        }
    }

    /// Instantiate the configured sink
    pub fn build(&self) -> Arc<dyn Sink> {
        match self {
            StoreConfig::Memory => Arc::new(MemoryStore::new()),
            StoreConfig::Fs(root) => Arc::new(FsStore::new(root.clone())),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub hostname: String,
    pub port: u16,
    /// Largest accepted request body in bytes
    pub max_body_size: usize,
    pub store: StoreConfig,
    /// Content type recorded for parts stored by the multi upload endpoint
    pub multipart_content_type: String,
    /// How long shutdown waits for open connections to finish
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "0.0.0.0".to_string(),
            port: 3000,
            max_body_size: 100 * 1024 * 1024, // 100MB
            store: StoreConfig::Fs(PathBuf::from("./data")),
            multipart_content_type: DEFAULT_MULTIPART_CONTENT_TYPE.to_string(),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    pub fn store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    pub fn multipart_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.multipart_content_type = content_type.into();
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Socket address string for binding
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// Build from `BUCKETGATE_*` environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup; unset variables keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("BUCKETGATE_HOST") {
            config.hostname = host;
        }
        if let Some(port) = lookup("BUCKETGATE_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("BUCKETGATE_PORT: invalid port {port:?}")))?;
        }
        if let Some(size) = lookup("BUCKETGATE_MAX_BODY") {
            config.max_body_size = BodyLimitConfig::parse(&size)
                .ok_or_else(|| Error::Config(format!("BUCKETGATE_MAX_BODY: invalid size {size:?}")))?
                .max_size;
        }
        if let Some(store) = lookup("BUCKETGATE_STORE") {
            if store.trim().is_empty() {
                return Err(Error::Config("BUCKETGATE_STORE: empty value".to_string()));
            }
            config.store = StoreConfig::parse(&store);
        }
        if let Some(content_type) = lookup("BUCKETGATE_MULTIPART_CONTENT_TYPE") {
            config.multipart_content_type = content_type;
        }
        if let Some(secs) = lookup("BUCKETGATE_SHUTDOWN_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Config(format!("BUCKETGATE_SHUTDOWN_TIMEOUT_SECS: invalid value {secs:?}"))
            })?;
            config.shutdown_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
