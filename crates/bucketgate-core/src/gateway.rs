//! Request dispatch
//!
//! The gateway owns the route table, the middleware chain and the sink
//! capability. It works on fully buffered [`Request`]s, so it can be driven
//! by the hyper server or directly from tests.

use crate::handlers::{self, PATH_PARAM};
use crate::middleware::{
    generate_request_id, BodyLimit, BodyLimitConfig, MiddlewareChain, RequestLog,
    RequestLogConfig,
};
use crate::storage::Sink;
use crate::{Error, Request, Response, ServerConfig};
use bucketgate_router::Router;
use std::sync::Arc;

/// Gateway endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Index,
    Upload,
    MultiUpload,
    Download,
}

/// Route table, middleware and sink shared by all connections
pub struct Gateway {
    router: Router<Route>,
    middleware: MiddlewareChain,
    request_log: RequestLogConfig,
    sink: Arc<dyn Sink>,
    multipart_content_type: String,
}

impl Gateway {
    pub fn new(sink: Arc<dyn Sink>, config: &ServerConfig) -> Self {
        let mut router = Router::new();
        router.insert("GET", "/", Route::Index);
        router.insert("PUT", &format!("/upload/*{PATH_PARAM}"), Route::Upload);
        router.insert("PUT", &format!("/multiupload/*{PATH_PARAM}"), Route::MultiUpload);
        router.insert("GET", &format!("/download/*{PATH_PARAM}"), Route::Download);

        let request_log = RequestLogConfig::default();
        let mut middleware = MiddlewareChain::new();
        middleware.add(RequestLog::new(request_log.clone()));
        middleware.add(BodyLimit::new(BodyLimitConfig::new(config.max_body_size)));

        Self {
            router,
            middleware,
            request_log,
            sink,
            multipart_content_type: config.multipart_content_type.clone(),
        }
    }

    /// Handle one buffered request
    pub async fn handle(&self, mut req: Request) -> Response {
        if let Some(mut res) = self.middleware.run_before(&mut req) {
            self.middleware.run_after(&req, &mut res);
            return res;
        }

        let mut res = match self.router.find(req.method.as_str(), &req.path) {
            Some(matched) => {
                req.params.extend(matched.params);
                self.dispatch(matched.value, &req).await
            }
            None => Response::not_found(),
        };

        self.middleware.run_after(&req, &mut res);
        res
    }

    /// Answer a request whose body could not be read.
    ///
    /// `head` carries everything but the body; it still passes through the
    /// middleware so the response is tagged and logged like any other.
    pub fn reject(&self, mut head: Request, err: Error) -> Response {
        let mut res = self.middleware.run_before(&mut head).unwrap_or_else(|| {
            tracing::debug!(error = %err, "request body could not be read");
            err.into_response()
        });
        self.middleware.run_after(&head, &mut res);
        res
    }

    /// Answer a request whose method has no [`Method`](crate::Method)
    /// counterpart. No [`Request`] exists for it, so the request id and
    /// access log are applied here directly.
    pub fn reject_method(&self, head: &http::request::Parts) -> Response {
        let method = head.method.as_str();
        let path = head.uri.path();
        let id = head
            .headers
            .get(self.request_log.header_name.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(generate_request_id);

        let mut res = Error::InvalidMethod(method.to_string()).into_response();
        res.headers.push((self.request_log.header_name.clone(), id.clone()));

        if self.request_log.log_requests {
            tracing::info!(
                request_id = %id,
                method,
                path,
                status = res.status.as_u16(),
                "request"
            );
        }
        res
    }

    async fn dispatch(&self, route: Route, req: &Request) -> Response {
        let sink = self.sink.as_ref();
        let result = match route {
            Route::Index => Ok(handlers::index()),
            Route::Upload => handlers::upload(sink, req).await,
            Route::MultiUpload => {
                handlers::multi_upload(sink, req, &self.multipart_content_type).await
            }
            Route::Download => handlers::download(sink, req).await,
        };

        result.unwrap_or_else(|err| {
            tracing::debug!(?route, error = %err, "request rejected");
            err.into_response()
        })
    }
}
