//! Body size limit middleware
//!
//! Uploads are buffered whole before decoding, so the limit bounds per-request
//! memory.

use super::Middleware;
use crate::{Request, Response, ResponseBuilder, StatusCode};

/// Body limit configuration
#[derive(Debug, Clone)]
pub struct BodyLimitConfig {
    /// Maximum body size in bytes
    pub max_size: usize,
}

impl BodyLimitConfig {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    /// Set limit in kilobytes
    pub fn kb(size: usize) -> Self {
        Self::new(size * 1024)
    }

    /// Set limit in megabytes
    pub fn mb(size: usize) -> Self {
        Self::new(size * 1024 * 1024)
    }

    /// Parse size from string (e.g., "10mb", "1gb", "500kb")
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();

        let (num_str, multiplier) = if let Some(n) = s.strip_suffix("gb") {
            (n, 1024 * 1024 * 1024)
        } else if let Some(n) = s.strip_suffix("mb") {
            (n, 1024 * 1024)
        } else if let Some(n) = s.strip_suffix("kb") {
            (n, 1024)
        } else if let Some(n) = s.strip_suffix('b') {
            (n, 1)
        } else {
            (s.as_str(), 1)
        };

        let num: usize = num_str.trim().parse().ok()?;
        Some(Self::new(num.checked_mul(multiplier)?))
    }
}

/// Format size for display
pub fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.1}GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{}B", bytes)
    }
}

/// Body limit middleware
pub struct BodyLimit {
    config: BodyLimitConfig,
}

impl BodyLimit {
    pub fn new(config: BodyLimitConfig) -> Self {
        Self { config }
    }

    pub fn max_size(&self) -> usize {
        self.config.max_size
    }

    fn too_large(&self) -> Response {
        ResponseBuilder::new(StatusCode::PAYLOAD_TOO_LARGE)
            .header("content-type", "text/plain")
            .body(format!(
                "Request body too large (limit {})",
                format_size(self.config.max_size)
            ))
            .build()
    }
}

impl Middleware for BodyLimit {
    fn before(&self, req: &mut Request) -> Option<Response> {
        let declared = req.content_length().unwrap_or(0);
        if declared > self.config.max_size || req.body.len() > self.config.max_size {
            tracing::warn!(
                path = %req.path,
                declared,
                received = req.body.len(),
                limit = self.config.max_size,
                "request body over limit"
            );
            return Some(self.too_large());
        }
        None
    }

    fn after(&self, _req: &Request, _res: &mut Response) {}
}
