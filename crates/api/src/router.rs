use crate::body::{ReqBody, ResponseBody};
use crate::endpoint::{Endpoint, EndpointBuilder};
use crate::error::RegisterError;
use crate::error_handler::{DefaultErrorHandler, ErrorHandler, plain_text};
use crate::handler::Handler;
use crate::hook::{LogHook, RegisterHook};
use crate::request::{PathParams, RequestContext};
use crate::shape::{Shape, TypeInfo};
use crate::BoxError;
use bytes::Bytes;
use http::header::ALLOW;
use http::{HeaderValue, Method, Request, Response, StatusCode};
use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use micro_format::Formats;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::warn;

type InnerRouter<C> = matchit::Router<Vec<Endpoint<C>>>;

const SUPPORTED_METHODS: [Method; 7] =
    [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD, Method::OPTIONS];

/// A registered endpoint as listed by [`Router::endpoints`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInfo {
    path: String,
    method: Method,
    shape: Shape,
}

impl EndpointInfo {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn input(&self) -> Option<TypeInfo> {
        self.shape.input()
    }

    pub fn output(&self) -> Option<TypeInfo> {
        self.shape.output()
    }
}

/// Dispatches requests to the endpoints registered for their path and method.
///
/// `C` is the application context, cloned into every handler that asks for it.
pub struct Router<C> {
    context: C,
    formats: Arc<Formats>,
    inner_router: InnerRouter<C>,
    endpoints: Vec<EndpointInfo>,
}

impl<C> Router<C>
where
    C: Clone + Send + Sync + 'static,
{
    /// Creates a router builder with the built-in formats.
    pub fn builder(context: C) -> RouterBuilder<C> {
        Self::builder_with_formats(context, Arc::new(Formats::new()))
    }

    pub fn builder_with_formats(context: C, formats: Arc<Formats>) -> RouterBuilder<C> {
        RouterBuilder {
            context,
            formats,
            error_handler: Arc::new(DefaultErrorHandler),
            hooks: vec![Box::new(LogHook)],
            routes: BTreeMap::new(),
            endpoints: Vec::new(),
        }
    }

    /// Every registered endpoint, in registration order.
    pub fn endpoints(&self) -> &[EndpointInfo] {
        &self.endpoints
    }

    pub fn formats(&self) -> &Arc<Formats> {
        &self.formats
    }

    /// Runs `request` through the endpoint registered for its path and method.
    ///
    /// Unknown paths get `404 Not Found`, known paths without an endpoint for the method get
    /// `405 Method Not Allowed` with an `Allow` header.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<ResponseBody>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        let body: ReqBody = body.map_err(Into::into).boxed_unsync();

        let Ok(matched) = self.inner_router.at(parts.uri.path()) else {
            warn!(method = %parts.method, path = parts.uri.path(), "no route matched");
            return plain_text(StatusCode::NOT_FOUND, "not found");
        };

        let endpoints = matched.value;
        let Some(endpoint) = endpoints.iter().find(|endpoint| *endpoint.method() == parts.method) else {
            warn!(method = %parts.method, path = parts.uri.path(), "method not allowed");
            let mut response = plain_text(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
            let allow = endpoints.iter().map(|endpoint| endpoint.method().as_str()).collect::<Vec<_>>().join(", ");
            if let Ok(allow) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(ALLOW, allow);
            }
            return response;
        };

        let params = PathParams::from(matched.params);
        let req = RequestContext::new(&parts, &params);
        endpoint.handler().invoke(&self.context, req, body).await
    }
}

impl<C> Debug for Router<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").field("formats", &self.formats).field("endpoints", &self.endpoints).finish_non_exhaustive()
    }
}

pub struct RouterBuilder<C> {
    context: C,
    formats: Arc<Formats>,
    error_handler: Arc<dyn ErrorHandler<C>>,
    hooks: Vec<Box<dyn RegisterHook>>,
    routes: BTreeMap<String, Vec<Endpoint<C>>>,
    endpoints: Vec<EndpointInfo>,
}

impl<C> RouterBuilder<C>
where
    C: Clone + Send + Sync + 'static,
{
    /// The format registry shared by every endpoint of this router.
    pub fn formats(&self) -> &Arc<Formats> {
        &self.formats
    }

    /// Sets the error handler of endpoints registered from now on without their own.
    pub fn error_handler<E: ErrorHandler<C> + 'static>(&mut self, error_handler: E) -> &mut Self {
        self.error_handler = Arc::new(error_handler);
        self
    }

    /// Adds a hook called for every endpoint registered from now on.
    pub fn hook<R: RegisterHook + 'static>(&mut self, hook: R) -> &mut Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Removes every hook, including the [`LogHook`] a new builder starts with.
    pub fn clear_hooks(&mut self) -> &mut Self {
        self.hooks.clear();
        self
    }

    /// Starts a group of endpoints whose paths are prefixed with `prefix`.
    ///
    /// ```
    /// # use micro_api::{endpoint, BoxError, Router};
    /// # use micro_api::validate::Validate;
    /// # #[derive(serde::Deserialize, serde::Serialize)]
    /// # struct Ping { message: String }
    /// # impl Validate for Ping {}
    /// # async fn ping(input: Ping) -> Result<Ping, BoxError> { Ok(input) }
    /// let mut builder = Router::builder(());
    /// builder.scope("/api").scope("v1").register("/ping", "GET", endpoint(ping)).unwrap();
    ///
    /// let router = builder.build().unwrap();
    /// assert_eq!(router.endpoints()[0].path(), "/api/v1/ping");
    /// ```
    pub fn scope(&mut self, prefix: &str) -> Scope<'_, C> {
        Scope { prefix: join_path("", prefix.trim_end_matches('/')), builder: self }
    }

    /// Registers `endpoint` for `method` requests to `path`.
    ///
    /// `method` must be one of `GET`, `POST`, `PUT`, `DELETE`, `PATCH`, `HEAD` or `OPTIONS`.
    pub fn register<H, Args, M>(
        &mut self,
        path: &str,
        method: &str,
        endpoint: EndpointBuilder<C, H, Args, M>,
    ) -> Result<&mut Self, RegisterError>
    where
        H: Handler<C, Args, M>,
        Args: 'static,
        M: 'static,
    {
        let Some(method) = SUPPORTED_METHODS.into_iter().find(|supported| supported.as_str() == method) else {
            return Err(RegisterError::UnsupportedMethod(method.to_owned()));
        };

        if self.routes.get(path).is_some_and(|routes| routes.iter().any(|route| *route.method() == method)) {
            return Err(RegisterError::DuplicateRoute { path: path.to_owned(), method });
        }

        let endpoint = endpoint.build(method.clone(), &self.formats, &self.error_handler).map_err(|source| {
            RegisterError::InvalidHandlerShape { path: path.to_owned(), method: method.clone(), source }
        })?;

        let shape = endpoint.shape().clone();
        for hook in &self.hooks {
            hook.register(path, &method, shape.input(), shape.output());
        }

        self.routes.entry(path.to_owned()).or_default().push(endpoint);
        self.endpoints.push(EndpointInfo { path: path.to_owned(), method, shape });
        Ok(self)
    }

    pub fn build(self) -> Result<Router<C>, RegisterError> {
        let mut inner_router = InnerRouter::new();
        for (path, endpoints) in self.routes {
            inner_router
                .insert(path.clone(), endpoints)
                .map_err(|e| RegisterError::InvalidRoute { path, reason: e.to_string() })?;
        }

        Ok(Router { context: self.context, formats: self.formats, inner_router, endpoints: self.endpoints })
    }
}

impl<C> Debug for RouterBuilder<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("formats", &self.formats)
            .field("hooks", &self.hooks.len())
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

/// Endpoints registered under a common path prefix, see [`RouterBuilder::scope`].
pub struct Scope<'a, C> {
    builder: &'a mut RouterBuilder<C>,
    prefix: String,
}

impl<C> Scope<'_, C>
where
    C: Clone + Send + Sync + 'static,
{
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Registers `endpoint` for `method` requests to `path` below the prefix.
    pub fn register<H, Args, M>(
        &mut self,
        path: &str,
        method: &str,
        endpoint: EndpointBuilder<C, H, Args, M>,
    ) -> Result<&mut Self, RegisterError>
    where
        H: Handler<C, Args, M>,
        Args: 'static,
        M: 'static,
    {
        let path = join_path(&self.prefix, path);
        self.builder.register(&path, method, endpoint)?;
        Ok(self)
    }

    /// A nested group, prefixed with this prefix followed by `prefix`.
    pub fn scope(&mut self, prefix: &str) -> Scope<'_, C> {
        Scope { prefix: join_path(&self.prefix, prefix.trim_end_matches('/')), builder: &mut *self.builder }
    }
}

impl<C> Debug for Scope<'_, C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope").field("prefix", &self.prefix).finish_non_exhaustive()
    }
}

/// `/api/` + `users` -> `/api/users`
fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_owned(),
        (false, true) => prefix.to_owned(),
        _ => format!("{prefix}/{path}"),
    }
}
