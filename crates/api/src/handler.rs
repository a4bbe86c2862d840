//! Typed handlers
//!
//! A [`Handler`] is the application function behind an endpoint. Async functions implement it
//! automatically when they follow one of the supported conventions:
//!
//! ```
//! use http::{HeaderMap, StatusCode};
//! use micro_api::BoxError;
//! # use micro_api::validate::Validate;
//! # use serde::{Deserialize, Serialize};
//! # #[derive(Deserialize)] struct Request { message: String }
//! # #[derive(Serialize)] struct Response { message: String }
//! # impl Validate for Request {}
//! # impl Validate for Response {}
//! # #[derive(Clone)] struct AppContext;
//!
//! // input only
//! async fn echo(input: Request) -> Result<Response, BoxError> {
//!     Ok(Response { message: input.message })
//! }
//!
//! // context and input, returning a status code
//! async fn create(_ctx: AppContext, input: Request) -> Result<(Response, StatusCode), BoxError> {
//!     Ok((Response { message: input.message }, StatusCode::CREATED))
//! }
//!
//! // input and request headers, returning a status code and response headers
//! async fn tagged(input: Request, _headers: HeaderMap) -> Result<(Response, StatusCode, HeaderMap), BoxError> {
//!     Ok((Response { message: input.message }, StatusCode::OK, HeaderMap::new()))
//! }
//! ```
//!
//! The calling convention is picked by the compiler through the `Args` and `M` marker
//! parameters; no type inspection happens at runtime. The resulting [`Shape`] is still checked
//! once at registration, which matters for hand-written implementations.

use crate::BoxError;
use crate::shape::{Param, Return, Shape, TypeInfo};
use crate::validate::Validate;
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;

/// What a handler produced: the output record, the response status and extra response headers.
#[derive(Debug)]
pub struct Reply<O> {
    output: O,
    status: StatusCode,
    headers: HeaderMap,
}

impl<O> Reply<O> {
    /// A `200 OK` reply without extra headers.
    pub fn new(output: O) -> Self {
        Self { output, status: StatusCode::OK, headers: HeaderMap::new() }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn into_parts(self) -> (O, StatusCode, HeaderMap) {
        (self.output, self.status, self.headers)
    }
}

/// `async fn(input)`
#[derive(Debug)]
pub struct InputOnly;

/// `async fn(context, input)`
#[derive(Debug)]
pub struct ContextInput;

/// `async fn(input, headers)`
#[derive(Debug)]
pub struct InputHeaders;

/// `async fn(context, input, headers)`
#[derive(Debug)]
pub struct ContextInputHeaders;

/// `Result<O, E>`
#[derive(Debug)]
pub struct OutputOnly;

/// `Result<(O, StatusCode), E>`
#[derive(Debug)]
pub struct WithStatus;

/// `Result<(O, StatusCode, HeaderMap), E>`
#[derive(Debug)]
pub struct WithHeaders;

/// A handler return type that converts into a [`Reply`].
pub trait Outcome<M>: Send {
    type Output: Serialize + Validate + Send + 'static;

    fn returns() -> Vec<Return>;

    fn into_reply(self) -> Result<Reply<Self::Output>, BoxError>;
}

impl<O, E> Outcome<OutputOnly> for Result<O, E>
where
    O: Serialize + Validate + Send + 'static,
    E: Into<BoxError> + Send,
{
    type Output = O;

    fn returns() -> Vec<Return> {
        vec![Return::Output(TypeInfo::of::<O>()), Return::Error]
    }

    fn into_reply(self) -> Result<Reply<O>, BoxError> {
        self.map(Reply::new).map_err(Into::into)
    }
}

impl<O, E> Outcome<WithStatus> for Result<(O, StatusCode), E>
where
    O: Serialize + Validate + Send + 'static,
    E: Into<BoxError> + Send,
{
    type Output = O;

    fn returns() -> Vec<Return> {
        vec![Return::Output(TypeInfo::of::<O>()), Return::Status, Return::Error]
    }

    fn into_reply(self) -> Result<Reply<O>, BoxError> {
        self.map(|(output, status)| Reply::new(output).with_status(status)).map_err(Into::into)
    }
}

impl<O, E> Outcome<WithHeaders> for Result<(O, StatusCode, HeaderMap), E>
where
    O: Serialize + Validate + Send + 'static,
    E: Into<BoxError> + Send,
{
    type Output = O;

    fn returns() -> Vec<Return> {
        vec![Return::Output(TypeInfo::of::<O>()), Return::Status, Return::Headers, Return::Error]
    }

    fn into_reply(self) -> Result<Reply<O>, BoxError> {
        self.map(|(output, status, headers)| Reply::new(output).with_status(status).with_headers(headers))
            .map_err(Into::into)
    }
}

/// An endpoint's application logic, called once per request with the decoded input.
///
/// `C` is the router context, `Args` and `M` select the parameter and return conventions.
pub trait Handler<C, Args, M>: Send + Sync + 'static {
    type Input: DeserializeOwned + Validate + Send + 'static;
    type Output: Serialize + Validate + Send + 'static;

    fn shape(&self) -> Shape;

    fn call(
        &self,
        context: C,
        input: Self::Input,
        headers: &HeaderMap,
    ) -> impl Future<Output = Result<Reply<Self::Output>, BoxError>> + Send;
}

/// impl `Handler` for async functions of one parameter convention
///
/// for example, the `ContextInput` convention expands to:
///```text
/// impl<C, F, Fut, I, R, M> Handler<C, (ContextInput, I), M> for F
/// where
///     F: Fn(C, I) -> Fut + Send + Sync + 'static,
///     Fut: Future<Output = R> + Send,
///     I: DeserializeOwned + Validate + Send + 'static,
///     R: Outcome<M>,
/// {
///     type Input = I;
///     type Output = R::Output;
///
///     fn shape(&self) -> Shape {
///         Shape::new(vec![Param::Context, Param::Input(TypeInfo::of::<I>())], R::returns())
///     }
///
///     fn call(&self, context: C, input: I, _headers: &HeaderMap) -> impl Future<...> + Send {
///         let future = (self)(context, input);
///         async move { future.await.into_reply() }
///     }
/// }
///```
macro_rules! impl_handler_for_fn {
    ($form:ident, fn($($arg_ty:ty),*), [$($param:expr),*], |$context:ident, $input:ident, $headers:ident| ($($arg:expr),*)) => {
        impl<C, F, Fut, I, R, M> Handler<C, ($form, I), M> for F
        where
            F: Fn($($arg_ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send,
            I: DeserializeOwned + Validate + Send + 'static,
            R: Outcome<M>,
        {
            type Input = I;
            type Output = R::Output;

            fn shape(&self) -> Shape {
                Shape::new(vec![$($param),*], R::returns())
            }

            fn call(
                &self,
                $context: C,
                $input: I,
                $headers: &HeaderMap,
            ) -> impl Future<Output = Result<Reply<Self::Output>, BoxError>> + Send {
                let future = (self)($($arg),*);
                async move { future.await.into_reply() }
            }
        }
    };
}

impl_handler_for_fn! {
    InputOnly, fn(I),
    [Param::Input(TypeInfo::of::<I>())],
    |_context, input, _headers| (input)
}

impl_handler_for_fn! {
    ContextInput, fn(C, I),
    [Param::Context, Param::Input(TypeInfo::of::<I>())],
    |context, input, _headers| (context, input)
}

impl_handler_for_fn! {
    InputHeaders, fn(I, HeaderMap),
    [Param::Input(TypeInfo::of::<I>()), Param::Headers],
    |_context, input, headers| (input, headers.clone())
}

impl_handler_for_fn! {
    ContextInputHeaders, fn(C, I, HeaderMap),
    [Param::Context, Param::Input(TypeInfo::of::<I>()), Param::Headers],
    |context, input, headers| (context, input, headers.clone())
}
