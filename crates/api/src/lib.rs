//! Typed HTTP endpoints with content negotiation
//!
//! `micro-api` binds plain async functions to HTTP routes. A handler receives a typed input
//! record and returns a typed output record; the endpoint wrapper around it takes care of the
//! rest of the exchange:
//!
//! - decoding the input from the query string (`GET`, `HEAD`) or the body (per `Content-Type`)
//! - validating the input and the output with field rules
//! - encoding the output in the format the client prefers (per `Accept`)
//! - routing every failure to one error handler
//!
//! Input records start out zero-valued: fields the request leaves out decode as `""`, `0`,
//! `false` or `None`, and payload keys match field names ignoring ASCII case. A missing field is
//! therefore reported by the field rules, not as a decoding failure.
//!
//! # Handler conventions
//!
//! A handler takes the input record, optionally preceded by the router context and optionally
//! followed by the request headers. It returns a `Result` of the output record, optionally
//! paired with a status code, or with a status code and response headers:
//!
//! ```text
//! async fn(I) -> Result<O, E>
//! async fn(C, I) -> Result<(O, StatusCode), E>
//! async fn(I, HeaderMap) -> Result<(O, StatusCode, HeaderMap), E>
//! async fn(C, I, HeaderMap) -> Result<O, E>
//! ```
//!
//! # Example
//!
//! ```
//! use http::{Request, StatusCode};
//! use micro_api::validate::{Rule, Rules, Validate, ValidationError};
//! use micro_api::{endpoint, BoxError, Router};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize)]
//! struct Echo {
//!     message: String,
//! }
//!
//! impl Validate for Echo {
//!     fn validate(&self) -> Result<(), ValidationError> {
//!         Rules::new().field("message", &self.message, &[Rule::Required]).finish()
//!     }
//! }
//!
//! #[derive(Serialize)]
//! struct Reply {
//!     message: String,
//! }
//!
//! impl Validate for Reply {}
//!
//! async fn echo(input: Echo) -> Result<Reply, BoxError> {
//!     Ok(Reply { message: input.message })
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut builder = Router::builder(());
//! builder.register("/echo", "GET", endpoint(echo)).unwrap();
//! let router = builder.build().unwrap();
//!
//! let request = Request::get("/echo?message=hi").body(String::new()).unwrap();
//! let response = router.handle(request).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # });
//! ```

mod body;
mod codec;
mod endpoint;
mod error;
mod error_handler;
mod handler;
mod hook;
mod request;
mod shape;

pub mod router;
pub mod validate;

pub use body::{ReqBody, ResponseBody};
pub use codec::{Decoder, Encoder, RequestDecoder};
pub use endpoint::{Endpoint, EndpointBuilder, RequestHandler, endpoint};
pub use error::{EndpointError, ErrorKind, RegisterError, ShapeError};
pub use error_handler::{
    DefaultErrorHandler, ErrorHandler, FnErrorHandler, StatusErrorHandler, error_handler_fn, plain_text,
};
pub use handler::{
    ContextInput, ContextInputHeaders, Handler, InputHeaders, InputOnly, Outcome, OutputOnly, Reply, WithHeaders,
    WithStatus,
};
pub use request::{PathParams, RequestContext};
pub use hook::{LogHook, RegisterHook};
pub use router::{EndpointInfo, Router, RouterBuilder, Scope};
pub use shape::{Param, Return, Shape, TypeInfo};

pub use micro_format::Formats;

/// The error type handlers may fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
