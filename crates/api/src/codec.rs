//! Request decoding and response encoding seams of an endpoint.
//!
//! Both are replaceable per endpoint. The defaults delegate to the router's [`Formats`].

use crate::RequestContext;
use http::header::ACCEPT;
use http::{HeaderMap, Method};
use micro_format::{DecodeTarget, Encoded, Form, FormatError, Formats, MalformedHeader};
use std::sync::Arc;
use tracing::trace;

pub trait Decoder: Send + Sync {
    fn decode(&self, req: &RequestContext<'_, '_>, body: &[u8], target: &mut dyn DecodeTarget) -> Result<(), FormatError>;
}

pub trait Encoder: Send + Sync {
    fn encode(&self, accept: Option<&str>, value: &dyn erased_serde::Serialize) -> Result<Encoded, FormatError>;
}

/// Decodes `GET` and `HEAD` requests from the query string, with form field matching, and every
/// other method from the body according to its `Content-Type`.
#[derive(Debug, Clone)]
pub struct RequestDecoder {
    formats: Arc<Formats>,
}

impl RequestDecoder {
    pub fn new(formats: Arc<Formats>) -> Self {
        Self { formats }
    }
}

impl Decoder for RequestDecoder {
    fn decode(&self, req: &RequestContext<'_, '_>, body: &[u8], target: &mut dyn DecodeTarget) -> Result<(), FormatError> {
        if is_query_method(req.method()) {
            let query = req.query().unwrap_or_default();
            trace!(query, "decoding query string");
            return Form::decode_query(query, target);
        }

        let content_type = match req.headers().get(http::header::CONTENT_TYPE) {
            Some(value) => Some(value.to_str().map_err(|_| FormatError::no_decoder(String::from_utf8_lossy(value.as_bytes())))?),
            None => None,
        };
        self.formats.decode_into(content_type, body, target)
    }
}

impl Encoder for Formats {
    fn encode(&self, accept: Option<&str>, value: &dyn erased_serde::Serialize) -> Result<Encoded, FormatError> {
        self.encode_erased(accept, value)
    }
}

fn is_query_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// Joins every `Accept` line of the request into one header value.
pub(crate) fn accept_header(headers: &HeaderMap) -> Result<Option<String>, FormatError> {
    let mut values = Vec::new();
    for value in headers.get_all(ACCEPT) {
        let value = value.to_str().map_err(|e| MalformedHeader::new(format!("accept header: {e}")))?;
        values.push(value);
    }

    Ok(if values.is_empty() { None } else { Some(values.join(", ")) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathParams;
    use http::{HeaderValue, Request};
    use micro_format::Slot;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Search {
        message: String,
    }

    fn decode(request: Request<()>, body: &[u8]) -> Result<Option<Search>, FormatError> {
        let (parts, ()) = request.into_parts();
        let params = PathParams::empty();
        let req = RequestContext::new(&parts, &params);

        let decoder = RequestDecoder::new(Arc::new(Formats::new()));
        let mut slot = Slot::empty();
        decoder.decode(&req, body, &mut slot)?;
        Ok(slot.into_inner())
    }

    fn search(message: &str) -> Option<Search> {
        Some(Search { message: message.into() })
    }

    #[test]
    fn test_get_decodes_query_and_ignores_body() {
        let request = Request::get("/?message=test").body(()).unwrap();
        assert_eq!(decode(request, br#"{"message":"body"}"#).unwrap(), search("test"));
    }

    #[test]
    fn test_head_decodes_query() {
        let request = Request::head("/?message=test").body(()).unwrap();
        assert_eq!(decode(request, b"").unwrap(), search("test"));
    }

    #[test]
    fn test_get_without_query_is_zero_valued() {
        let request = Request::get("/").body(()).unwrap();
        assert_eq!(decode(request, b"").unwrap(), search(""));
    }

    #[test]
    fn test_post_decodes_body_by_content_type() {
        let request = Request::post("/?message=query").header("content-type", "application/yaml").body(()).unwrap();
        assert_eq!(decode(request, b"message: body").unwrap(), search("body"));

        let request = Request::put("/").body(()).unwrap();
        assert_eq!(decode(request, br#"{"message":"default"}"#).unwrap(), search("default"));
    }

    #[test]
    fn test_unknown_content_type() {
        let request = Request::post("/").header("content-type", "application/cats").body(()).unwrap();
        let error = decode(request, b"meow").unwrap_err();
        assert_eq!(error.to_string(), "no decoder found matching type: application/cats");
    }

    #[test]
    fn test_accept_lines_are_joined() {
        let mut headers = HeaderMap::new();
        assert_eq!(accept_header(&headers).unwrap(), None);

        headers.append(ACCEPT, HeaderValue::from_static("text/html"));
        headers.append(ACCEPT, HeaderValue::from_static("application/yaml;q=0.5"));
        assert_eq!(accept_header(&headers).unwrap().as_deref(), Some("text/html, application/yaml;q=0.5"));
    }

    #[test]
    fn test_accept_not_ascii() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_bytes("text/ü".as_bytes()).unwrap());

        assert!(matches!(accept_header(&headers), Err(FormatError::MalformedAcceptHeader { .. })));
    }
}
