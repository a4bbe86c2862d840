//! Rendering of request-time failures
//!
//! Every failure of the endpoint pipeline ends up in exactly one [`ErrorHandler`] call, whose
//! response is returned to the client in place of the encoded output.
//!
//! [`DefaultErrorHandler`] answers every failure with `500 Internal Server Error`, including
//! failures caused by the client such as an unknown `Content-Type`. Use [`StatusErrorHandler`]
//! or a custom handler to distinguish them:
//!
//! ```
//! use http::StatusCode;
//! use micro_api::{error_handler_fn, plain_text};
//!
//! # #[derive(Clone)] struct AppContext;
//! let handler = error_handler_fn(|_ctx: &AppContext, _req, error| {
//!     let status = if error.is_client_error() { StatusCode::BAD_REQUEST } else { StatusCode::INTERNAL_SERVER_ERROR };
//!     plain_text(status, error.to_string())
//! });
//! # let _ = handler;
//! ```

use crate::body::ResponseBody;
use crate::error::EndpointError;
use crate::request::RequestContext;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode};
use std::marker::PhantomData;
use tracing::{error, warn};

const TEXT_PLAIN_UTF_8: &str = "text/plain; charset=utf-8";

pub trait ErrorHandler<C>: Send + Sync {
    fn handle(&self, context: &C, req: &RequestContext<'_, '_>, error: EndpointError) -> Response<ResponseBody>;
}

/// A `text/plain` response carrying `message`.
pub fn plain_text<S: Into<String>>(status: StatusCode, message: S) -> Response<ResponseBody> {
    let mut response = Response::new(ResponseBody::from(message.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF_8));
    response
}

/// Always `500`, the error message as body.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorHandler;

impl<C> ErrorHandler<C> for DefaultErrorHandler {
    fn handle(&self, _context: &C, req: &RequestContext<'_, '_>, error: EndpointError) -> Response<ResponseBody> {
        error!(method = %req.method(), path = req.uri().path(), kind = ?error.kind(), "{}", error);
        plain_text(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    }
}

/// Uses [`EndpointError::suggested_status`]: `4xx` for client errors, `500` otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusErrorHandler;

impl<C> ErrorHandler<C> for StatusErrorHandler {
    fn handle(&self, _context: &C, req: &RequestContext<'_, '_>, error: EndpointError) -> Response<ResponseBody> {
        let status = error.suggested_status();
        if error.is_client_error() {
            warn!(method = %req.method(), path = req.uri().path(), %status, "{}", error);
        } else {
            error!(method = %req.method(), path = req.uri().path(), %status, "{}", error);
        }
        plain_text(status, error.to_string())
    }
}

/// An [`ErrorHandler`] backed by a closure, see [`error_handler_fn`].
pub struct FnErrorHandler<F, C> {
    f: F,
    _phantom: PhantomData<fn(&C)>,
}

impl<F, C> std::fmt::Debug for FnErrorHandler<F, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnErrorHandler").finish_non_exhaustive()
    }
}

pub fn error_handler_fn<F, C>(f: F) -> FnErrorHandler<F, C>
where
    F: Fn(&C, &RequestContext<'_, '_>, EndpointError) -> Response<ResponseBody> + Send + Sync,
{
    FnErrorHandler { f, _phantom: PhantomData }
}

impl<F, C> ErrorHandler<C> for FnErrorHandler<F, C>
where
    F: Fn(&C, &RequestContext<'_, '_>, EndpointError) -> Response<ResponseBody> + Send + Sync,
{
    fn handle(&self, context: &C, req: &RequestContext<'_, '_>, error: EndpointError) -> Response<ResponseBody> {
        (self.f)(context, req, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathParams;
    use http::Request;
    use http_body_util::BodyExt;
    use micro_format::FormatError;

    async fn render<H: ErrorHandler<()>>(handler: &H, error: EndpointError) -> (StatusCode, String) {
        let (parts, ()) = Request::post("/echo").body(()).unwrap().into_parts();
        let params = PathParams::empty();
        let req = RequestContext::new(&parts, &params);

        let response = handler.handle(&(), &req, error);
        assert_eq!(response.headers()[CONTENT_TYPE], TEXT_PLAIN_UTF_8);

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn no_decoder() -> EndpointError {
        EndpointError::DecodingFailed { source: FormatError::no_decoder("application/cats") }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_default_is_always_500() {
        let (status, body) = render(&DefaultErrorHandler, no_decoder()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "decoding failed: no decoder found matching type: application/cats");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_status_handler() {
        let (status, _) = render(&StatusErrorHandler, no_decoder()).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let (status, body) = render(&StatusErrorHandler, EndpointError::HandlerFailed { source: "database down".into() }).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "handler failed: database down");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_fn_handler() {
        let handler = error_handler_fn(|_ctx: &(), req, error| {
            plain_text(StatusCode::BAD_REQUEST, format!("{} {}: {:?}", req.method(), req.uri().path(), error.kind()))
        });

        let (status, body) = render(&handler, no_decoder()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "POST /echo: Decoding");
    }
}
