//! The endpoint wrapper: binds a typed [`Handler`] to the untyped request/response exchange.
//!
//! Each request runs through a fixed pipeline:
//!
//! ```text
//! collect body -> decode input -> validate input -> call handler -> validate output -> encode
//! ```
//!
//! The first failing stage stops the pipeline and its [`EndpointError`] goes to the endpoint's
//! [`ErrorHandler`]. Either way exactly one response comes out.

use crate::body::{ReqBody, ResponseBody};
use crate::codec::{Decoder, Encoder, RequestDecoder, accept_header};
use crate::error::{EndpointError, ShapeError};
use crate::error_handler::ErrorHandler;
use crate::handler::{Handler, Reply};
use crate::request::RequestContext;
use crate::shape::Shape;
use crate::validate::{FieldValidator, RuleValidator};
use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, Response};
use http_body_util::BodyExt;
use micro_format::{FormatError, Formats, Slot};
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

/// Type-erased endpoint logic, as stored by the router.
#[async_trait]
pub trait RequestHandler<C>: Send + Sync {
    async fn invoke<'server, 'req>(
        &self,
        context: &C,
        req: RequestContext<'server, 'req>,
        body: ReqBody,
    ) -> Response<ResponseBody>;
}

/// Creates an [`EndpointBuilder`] for `handler`.
pub fn endpoint<C, H, Args, M>(handler: H) -> EndpointBuilder<C, H, Args, M>
where
    H: Handler<C, Args, M>,
{
    EndpointBuilder {
        handler,
        error_handler: None,
        field_validator: None,
        decoder: None,
        encoder: None,
        _phantom: PhantomData,
    }
}

/// Per-endpoint overrides; anything left unset falls back to the router defaults.
pub struct EndpointBuilder<C, H, Args, M> {
    handler: H,
    error_handler: Option<Arc<dyn ErrorHandler<C>>>,
    field_validator: Option<Arc<dyn FieldValidator>>,
    decoder: Option<Arc<dyn Decoder>>,
    encoder: Option<Arc<dyn Encoder>>,
    _phantom: PhantomData<fn() -> (Args, M)>,
}

impl<C, H, Args, M> EndpointBuilder<C, H, Args, M>
where
    C: Clone + Send + Sync + 'static,
    H: Handler<C, Args, M>,
    Args: 'static,
    M: 'static,
{
    #[must_use]
    pub fn error_handler<E: ErrorHandler<C> + 'static>(mut self, error_handler: E) -> Self {
        self.error_handler = Some(Arc::new(error_handler));
        self
    }

    #[must_use]
    pub fn field_validator<V: FieldValidator + 'static>(mut self, field_validator: V) -> Self {
        self.field_validator = Some(Arc::new(field_validator));
        self
    }

    #[must_use]
    pub fn decoder<D: Decoder + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    #[must_use]
    pub fn encoder<E: Encoder + 'static>(mut self, encoder: E) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    pub fn shape(&self) -> Shape {
        self.handler.shape()
    }

    /// Validates the handler shape and erases the handler type.
    pub fn build(
        self,
        method: Method,
        formats: &Arc<Formats>,
        default_error_handler: &Arc<dyn ErrorHandler<C>>,
    ) -> Result<Endpoint<C>, ShapeError> {
        let shape = self.handler.shape();
        shape.validate()?;

        let pipeline = Pipeline {
            handler: self.handler,
            error_handler: self.error_handler.unwrap_or_else(|| Arc::clone(default_error_handler)),
            field_validator: self.field_validator.unwrap_or_else(|| Arc::new(RuleValidator)),
            decoder: self.decoder.unwrap_or_else(|| Arc::new(RequestDecoder::new(Arc::clone(formats)))),
            encoder: self.encoder.unwrap_or_else(|| Arc::clone(formats) as Arc<dyn Encoder>),
            _phantom: PhantomData,
        };

        Ok(Endpoint { method, shape, handler: Box::new(pipeline) })
    }
}

impl<C, H, Args, M> Debug for EndpointBuilder<C, H, Args, M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointBuilder")
            .field("error_handler", &self.error_handler.is_some())
            .field("field_validator", &self.field_validator.is_some())
            .field("decoder", &self.decoder.is_some())
            .field("encoder", &self.encoder.is_some())
            .finish_non_exhaustive()
    }
}

/// A registered endpoint: its method, its handler's shape and the erased pipeline.
pub struct Endpoint<C> {
    method: Method,
    shape: Shape,
    handler: Box<dyn RequestHandler<C>>,
}

impl<C> Endpoint<C> {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn handler(&self) -> &dyn RequestHandler<C> {
        self.handler.as_ref()
    }
}

impl<C> Debug for Endpoint<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint").field("method", &self.method).field("shape", &self.shape).finish_non_exhaustive()
    }
}

struct Pipeline<C, H, Args, M> {
    handler: H,
    error_handler: Arc<dyn ErrorHandler<C>>,
    field_validator: Arc<dyn FieldValidator>,
    decoder: Arc<dyn Decoder>,
    encoder: Arc<dyn Encoder>,
    _phantom: PhantomData<fn() -> (Args, M)>,
}

impl<C, H, Args, M> Pipeline<C, H, Args, M>
where
    C: Clone + Send + Sync + 'static,
    H: Handler<C, Args, M>,
{
    async fn process(
        &self,
        context: &C,
        req: &RequestContext<'_, '_>,
        body: ReqBody,
    ) -> Result<Response<ResponseBody>, EndpointError> {
        let raw = body
            .collect()
            .await
            .map_err(|e| EndpointError::DecodingFailed { source: FormatError::payload(e) })?
            .to_bytes();

        let mut slot = Slot::<H::Input>::empty();
        self.decoder
            .decode(req, &raw, &mut slot)
            .map_err(|source| EndpointError::DecodingFailed { source })?;
        let input = slot
            .into_inner()
            .ok_or_else(|| EndpointError::DecodingFailed { source: FormatError::payload("decoder produced no value") })?;
        trace!("input decoded");

        self.field_validator.validate(&input).map_err(|source| EndpointError::ValidationFailed { source })?;

        let reply = self
            .handler
            .call(context.clone(), input, req.headers())
            .await
            .map_err(|source| EndpointError::HandlerFailed { source })?;
        let (output, status, headers) = Reply::into_parts(reply);
        trace!(%status, "handler returned");

        self.field_validator
            .validate(&output)
            .map_err(|source| EndpointError::OutputValidationFailed { source })?;

        let accept = accept_header(req.headers()).map_err(|source| EndpointError::EncodingFailed { source })?;
        let encoded = self
            .encoder
            .encode(accept.as_deref(), &output)
            .map_err(|source| EndpointError::EncodingFailed { source })?;
        let (media_type, body) = encoded.into_parts();
        let content_type = HeaderValue::from_str(&media_type)
            .map_err(|e| EndpointError::EncodingFailed { source: FormatError::encode("HEADER", e) })?;
        trace!(%media_type, len = body.len(), "output encoded");

        let mut response = Response::new(ResponseBody::once(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response.headers_mut().insert(CONTENT_TYPE, content_type);
        Ok(response)
    }
}

#[async_trait]
impl<C, H, Args, M> RequestHandler<C> for Pipeline<C, H, Args, M>
where
    C: Clone + Send + Sync + 'static,
    H: Handler<C, Args, M>,
    Args: 'static,
    M: 'static,
{
    async fn invoke<'server, 'req>(
        &self,
        context: &C,
        req: RequestContext<'server, 'req>,
        body: ReqBody,
    ) -> Response<ResponseBody> {
        match self.process(context, &req, body).await {
            Ok(response) => response,
            Err(error) => self.error_handler.handle(context, &req, error),
        }
    }
}
