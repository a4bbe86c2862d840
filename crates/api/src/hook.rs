use crate::shape::TypeInfo;
use http::Method;
use tracing::info;

/// Observes endpoint registration.
///
/// A [`RouterBuilder`](crate::RouterBuilder) calls every hook once per successfully registered
/// endpoint, with the full path, the method and the record types of the handler. Closures with
/// the same arguments are hooks too.
pub trait RegisterHook: Send + Sync {
    fn register(&self, path: &str, method: &Method, input: Option<TypeInfo>, output: Option<TypeInfo>);
}

/// Logs every registration at `INFO`, installed on new routers.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHook;

impl RegisterHook for LogHook {
    fn register(&self, path: &str, method: &Method, input: Option<TypeInfo>, output: Option<TypeInfo>) {
        info!(path, %method, input = input.map(|info| info.name()), output = output.map(|info| info.name()), "endpoint registered");
    }
}

impl<F> RegisterHook for F
where
    F: Fn(&str, &Method, Option<TypeInfo>, Option<TypeInfo>) + Send + Sync,
{
    fn register(&self, path: &str, method: &Method, input: Option<TypeInfo>, output: Option<TypeInfo>) {
        self(path, method, input, output);
    }
}
