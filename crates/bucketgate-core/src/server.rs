//! Native HTTP server
//!
//! hyper HTTP/1.1 on tokio with:
//! - One task per connection
//! - SO_REUSEADDR/SO_REUSEPORT and TCP_NODELAY on the listener
//! - Request bodies collected in full (bounded by `max_body_size`)
//! - Graceful shutdown that drains open connections

use crate::{Error, Gateway, Method, Request, Response, Result, ServerConfig};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

/// Create a TCP socket with optimizations
pub fn create_optimized_socket(addr: &SocketAddr) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEADDR - allow binding to address in TIME_WAIT
    socket.set_reuse_address(true)?;

    // SO_REUSEPORT - allow a replacement process to bind during restarts
    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    // TCP_NODELAY - disable Nagle's algorithm for lower latency
    socket.set_nodelay(true)?;

    socket.bind(&(*addr).into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;

    Ok(socket)
}

/// Resolve the configured address and bind a listener
pub async fn bind(config: &ServerConfig) -> Result<TcpListener> {
    let address = config.address();
    let addr = tokio::net::lookup_host(&address)
        .await?
        .next()
        .ok_or_else(|| Error::Config(format!("address {address} did not resolve")))?;

    let socket = create_optimized_socket(&addr)?;
    Ok(TcpListener::from_std(socket.into())?)
}

/// Build a body-less [`Request`] from a hyper request head
///
/// Fails with [`Error::InvalidMethod`] for methods outside [`Method`].
/// Header values that are not visible ASCII are skipped.
pub fn request_head(parts: &http::request::Parts) -> Result<Request> {
    let method: Method = parts.method.as_str().parse()?;

    let mut request = Request::new(method, parts.uri.path());
    request.query = parts.uri.query().map(str::to_string);

    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            request.headers.push((name.to_string(), v.to_string()));
        }
    }

    Ok(request)
}

/// Collect a body in full; more than `max_body` bytes fails with
/// [`Error::BodyTooLarge`].
pub async fn collect_body<B>(body: B, max_body: usize) -> Result<Bytes>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let collected = Limited::new(body, max_body).collect().await.map_err(|err| {
        if err.downcast_ref::<LengthLimitError>().is_some() {
            Error::BodyTooLarge { limit: max_body }
        } else {
            Error::Hyper(err.to_string())
        }
    })?;
    Ok(collected.to_bytes())
}

/// Convert our Response to a hyper Response
///
/// Headers that are not valid HTTP are dropped with a warning.
pub fn to_hyper_response(res: Response) -> hyper::Response<Full<Bytes>> {
    let mut response = hyper::Response::new(Full::new(res.body));
    *response.status_mut() = http::StatusCode::from_u16(res.status.as_u16())
        .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

    for (name, value) in &res.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().append(name, value);
            }
            _ => tracing::warn!(header = %name, "dropping invalid response header"),
        }
    }

    response
}

async fn handle_request(
    gateway: Arc<Gateway>,
    req: hyper::Request<hyper::body::Incoming>,
    max_body: usize,
) -> std::result::Result<hyper::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let mut request = match request_head(&parts) {
        Ok(request) => request,
        Err(_) => return Ok(to_hyper_response(gateway.reject_method(&parts))),
    };

    let response = match collect_body(body, max_body).await {
        Ok(bytes) => {
            request.body = bytes;
            gateway.handle(request).await
        }
        Err(err) => gateway.reject(request, err),
    };
    Ok(to_hyper_response(response))
}

/// Accept connections on `listener` until `shutdown` resolves, then wait up
/// to `config.shutdown_timeout` for open connections to finish.
pub async fn serve<F>(
    listener: TcpListener,
    gateway: Arc<Gateway>,
    config: &ServerConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let tracker = Arc::new(ConnectionTracker::new());
    let max_body = config.max_body_size;

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "listening");
    }

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(err) => {
                        tracing::debug!("failed to accept new connection: {err}");
                        continue;
                    }
                };
                let _ = stream.set_nodelay(true);

                let gateway = gateway.clone();
                let conn_tracker = tracker.clone();
                conn_tracker.increment();

                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| {
                        let gateway = gateway.clone();
                        handle_request(gateway, req, max_body)
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        if !err.is_incomplete_message() {
                            tracing::error!(%peer, "connection error: {err}");
                        }
                    }

                    conn_tracker.decrement();
                });
            }
            _ = &mut shutdown => break,
        }
    }

    drop(listener);
    tracing::info!(active = tracker.count(), "shutting down");

    if !tracker.drain(config.shutdown_timeout).await {
        tracing::warn!(
            active = tracker.count(),
            "shutdown timeout reached with connections still open"
        );
    }
    Ok(())
}

// ============================================================================
// Connection Tracking for Graceful Shutdown
// ============================================================================

/// Counts active connections so shutdown can wait for them
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    active: AtomicU64,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn decrement(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait until no connections remain; `false` if `timeout` elapsed first
    pub async fn drain(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.count() == 0 {
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
