//! Request id and access logging middleware

use super::Middleware;
use crate::{Request, Response};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Route-param slot the request id is stashed in between `before` and `after`
const REQUEST_ID_PARAM: &str = "_request_id";

/// Request log configuration
#[derive(Debug, Clone)]
pub struct RequestLogConfig {
    /// Header name for request ID
    pub header_name: String,
    /// Emit one `info` event per completed request
    pub log_requests: bool,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self {
            header_name: "X-Request-ID".to_string(),
            log_requests: true,
        }
    }
}

impl RequestLogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn log_requests(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }
}

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a 16-character request id
pub fn generate_request_id() -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut seed = nanos ^ count.wrapping_mul(0x9E37_79B9_7F4A_7C15);

    (0..16)
        .map(|_| {
            // xorshift64
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            ALPHABET[(seed % ALPHABET.len() as u64) as usize] as char
        })
        .collect()
}

/// Request log middleware
#[derive(Default)]
pub struct RequestLog {
    config: RequestLogConfig,
}

impl RequestLog {
    pub fn new(config: RequestLogConfig) -> Self {
        Self { config }
    }
}

impl Middleware for RequestLog {
    fn before(&self, req: &mut Request) -> Option<Response> {
        let id = req
            .header(&self.config.header_name)
            .map(str::to_string)
            .unwrap_or_else(generate_request_id);
        req.params.insert(REQUEST_ID_PARAM.to_string(), id);
        None
    }

    fn after(&self, req: &Request, res: &mut Response) {
        let id = req.param(REQUEST_ID_PARAM).unwrap_or("-");
        res.headers.push((self.config.header_name.clone(), id.to_string()));

        if self.config.log_requests {
            tracing::info!(
                request_id = id,
                method = %req.method,
                path = %req.path,
                status = res.status.as_u16(),
                elapsed_ms = req.received_at.elapsed().as_secs_f64() * 1000.0,
                "request"
            );
        }
    }
}
