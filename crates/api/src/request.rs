//! Request information handed to decoders, handlers and error handlers.
//!
//! - `RequestContext`: method, uri and headers of the request plus the matched path parameters
//! - `PathParams`: named segments captured by the route, e.g. `id` in `/users/{id}`

use http::request::Parts;
use http::{HeaderMap, Method, Uri, Version};
use matchit::Params;

/// A borrowed view of the request being processed.
///
/// The body is not part of the context: it is consumed once by the endpoint's decoder.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'server: 'req, 'req> {
    parts: &'req Parts,
    path_params: &'req PathParams<'server, 'req>,
}

impl<'server, 'req> RequestContext<'server, 'req> {
    pub fn new(parts: &'req Parts, path_params: &'req PathParams<'server, 'req>) -> Self {
        Self { parts, path_params }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// The raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    pub fn version(&self) -> Version {
        self.parts.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn path_params(&self) -> &PathParams<'server, 'req> {
        self.path_params
    }
}

/// Path parameters captured by the matched route.
#[derive(Debug, Clone)]
pub struct PathParams<'server, 'req> {
    kind: PathParamsKind<'server, 'req>,
}

#[derive(Debug, Clone)]
enum PathParamsKind<'server, 'req> {
    None,
    Params(Params<'server, 'req>),
}

impl<'server, 'req> PathParams<'server, 'req> {
    #[inline]
    fn new(params: Params<'server, 'req>) -> Self {
        if params.is_empty() { Self::empty() } else { Self { kind: PathParamsKind::Params(params) } }
    }

    #[inline]
    pub fn empty() -> Self {
        Self { kind: PathParamsKind::None }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            PathParamsKind::None => true,
            PathParamsKind::Params(params) => params.is_empty(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match &self.kind {
            PathParamsKind::None => 0,
            PathParamsKind::Params(params) => params.len(),
        }
    }

    /// Gets the value of a path parameter by its name.
    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&'req str> {
        match &self.kind {
            PathParamsKind::Params(params) => params.get(key),
            PathParamsKind::None => None,
        }
    }
}

impl<'server, 'req> From<Params<'server, 'req>> for PathParams<'server, 'req> {
    fn from(params: Params<'server, 'req>) -> Self {
        PathParams::new(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    #[test]
    fn test_request_parts() {
        let (parts, ()) = Request::builder()
            .method(Method::GET)
            .uri("/users/42?message=test")
            .header("accept", "application/yaml")
            .body(())
            .unwrap()
            .into_parts();

        let mut router = matchit::Router::new();
        router.insert("/users/{id}", ()).unwrap();
        let matched = router.at(parts.uri.path()).unwrap();
        let params = PathParams::from(matched.params);

        let req = RequestContext::new(&parts, &params);
        assert_eq!(*req.method(), Method::GET);
        assert_eq!(req.query(), Some("message=test"));
        assert_eq!(req.headers()["accept"], "application/yaml");
        assert_eq!(req.path_params().len(), 1);
        assert_eq!(req.path_params().get("id"), Some("42"));
        assert_eq!(req.path_params().get("name"), None);
    }

    #[test]
    fn test_empty_params() {
        let params = PathParams::empty();
        assert!(params.is_empty());
        assert_eq!(params.get("id"), None);
    }
}
