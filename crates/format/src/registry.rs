//! Media type registry
//!
//! [`Formats`] owns the mapping from media types to adapters and performs the negotiation
//! for both directions:
//!
//! - request side: the essence of `Content-Type` selects the decoder, an absent header falls
//!   back to the default request type
//! - response side: the first entry of the `Accept` preference list that resolves to an adapter
//!   selects the encoder, an absent header falls back to the default response type
//!
//! `*/*` resolves to the default response type. `type/*` resolves to the default response type
//! when its main type matches, otherwise to the first registered adapter of that main type in
//! media type order. Wildcards never resolve to an adapter that cannot encode, such as the form
//! adapter. Ranges with `q=0` are never chosen.

use crate::accept::parse_media_ranges;
use crate::adapter::{Form, Format, Json, Xml, Yaml};
use crate::target::{DecodeTarget, Slot};
use crate::{APPLICATION_JSON, APPLICATION_WWW_FORM_URLENCODED, APPLICATION_XML, APPLICATION_YAML, FormatError};
use arc_swap::ArcSwap;
use bytes::Bytes;
use mime::Mime;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::{debug, trace};

/// An encoded response payload and the media type it was encoded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    media_type: String,
    body: Bytes,
}

impl Encoded {
    pub fn new<S: Into<String>>(media_type: S, body: Bytes) -> Self {
        Self { media_type: media_type.into(), body }
    }

    /// Value for the `Content-Type` response header.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_parts(self) -> (String, Bytes) {
        (self.media_type, self.body)
    }
}

#[derive(Clone)]
struct Table {
    adapters: BTreeMap<String, Arc<dyn Format>>,
    default_request: String,
    default_response: String,
}

impl Table {
    fn lookup(&self, media_type: &str) -> Option<(&str, &dyn Format)> {
        self.adapters.get_key_value(media_type).map(|(key, format)| (key.as_str(), format.as_ref()))
    }

    fn resolve(&self, range: &str) -> Option<(&str, &dyn Format)> {
        let encoder = |media_type: &str| self.lookup(media_type).filter(|(_, format)| format.can_encode());
        match range.split_once('/') {
            Some(("*", "*")) => encoder(&self.default_response),
            Some((main, "*")) => {
                if main_type(&self.default_response) == main {
                    if let Some(found) = encoder(&self.default_response) {
                        return Some(found);
                    }
                }
                self.adapters
                    .iter()
                    .find(|(key, format)| main_type(key) == main && format.can_encode())
                    .map(|(key, format)| (key.as_str(), format.as_ref()))
            }
            _ => self.lookup(range),
        }
    }
}

/// The set of adapters known to a router, keyed by lower-cased media type.
///
/// [`Formats::new`] registers JSON, XML, YAML and url-encoded forms, with JSON as the default
/// for both directions. Lookups run against a snapshot of the table, registration swaps in a
/// new one.
pub struct Formats {
    table: ArcSwap<Table>,
}

impl Formats {
    pub fn new() -> Self {
        let formats = Self::empty();
        formats.register(APPLICATION_JSON, Json);
        formats.register(APPLICATION_XML, Xml);
        formats.register(APPLICATION_YAML, Yaml);
        formats.register(APPLICATION_WWW_FORM_URLENCODED, Form);
        formats
    }

    /// A registry without adapters, defaults still point at `application/json`.
    pub fn empty() -> Self {
        let table = Table {
            adapters: BTreeMap::new(),
            default_request: APPLICATION_JSON.to_owned(),
            default_response: APPLICATION_JSON.to_owned(),
        };
        Self { table: ArcSwap::from_pointee(table) }
    }

    /// Registers `format` for `media_type`, replacing any adapter registered before.
    pub fn register<F: Format + 'static>(&self, media_type: &str, format: F) {
        let media_type = media_type.trim().to_ascii_lowercase();
        let format: Arc<dyn Format> = Arc::new(format);

        self.table.rcu(|table| {
            let mut table = Table::clone(table);
            table.adapters.insert(media_type.clone(), Arc::clone(&format));
            table
        });
        debug!(%media_type, "format registered");
    }

    /// Removes the adapter for `media_type`, absent types are ignored.
    pub fn unregister(&self, media_type: &str) {
        let media_type = media_type.trim().to_ascii_lowercase();
        if !self.contains(&media_type) {
            return;
        }

        self.table.rcu(|table| {
            let mut table = Table::clone(table);
            table.adapters.remove(&media_type);
            table
        });
        debug!(%media_type, "format unregistered");
    }

    /// Sets the media type used to decode requests without a `Content-Type`.
    pub fn set_default_request(&self, media_type: &str) {
        let media_type = media_type.trim().to_ascii_lowercase();
        self.table.rcu(|table| Table { default_request: media_type.clone(), ..Table::clone(table) });
    }

    /// Sets the media type used to encode responses when the request has no `Accept`.
    pub fn set_default_response(&self, media_type: &str) {
        let media_type = media_type.trim().to_ascii_lowercase();
        self.table.rcu(|table| Table { default_response: media_type.clone(), ..Table::clone(table) });
    }

    pub fn default_request(&self) -> String {
        self.table.load().default_request.clone()
    }

    pub fn default_response(&self) -> String {
        self.table.load().default_response.clone()
    }

    pub fn contains(&self, media_type: &str) -> bool {
        self.table.load().adapters.contains_key(&media_type.trim().to_ascii_lowercase())
    }

    /// Registered media types in lexicographic order.
    pub fn media_types(&self) -> Vec<String> {
        self.table.load().adapters.keys().cloned().collect()
    }

    /// Decodes `raw` as `T` using the adapter selected by `content_type`.
    pub fn decode<T: DeserializeOwned>(&self, content_type: Option<&str>, raw: &[u8]) -> Result<T, FormatError> {
        let mut slot = Slot::empty();
        self.decode_into(content_type, raw, &mut slot)?;
        slot.into_inner().ok_or_else(|| FormatError::payload("decoder produced no value"))
    }

    pub fn decode_into(
        &self,
        content_type: Option<&str>,
        raw: &[u8],
        target: &mut dyn DecodeTarget,
    ) -> Result<(), FormatError> {
        let table = self.table.load();
        let media_type = match content_type.map(str::trim).filter(|value| !value.is_empty()) {
            Some(content_type) => essence(content_type),
            None => table.default_request.clone(),
        };

        let (_, format) = table.lookup(&media_type).ok_or_else(|| FormatError::no_decoder(&media_type))?;
        trace!(%media_type, len = raw.len(), "decoding payload");
        format.decode(raw, target)
    }

    /// Encodes `value` for the first acceptable media type of `accept`.
    pub fn encode<T: Serialize>(&self, accept: Option<&str>, value: &T) -> Result<Encoded, FormatError> {
        self.encode_erased(accept, value)
    }

    pub fn encode_erased(
        &self,
        accept: Option<&str>,
        value: &dyn erased_serde::Serialize,
    ) -> Result<Encoded, FormatError> {
        let ranges = match accept.map(str::trim).filter(|value| !value.is_empty()) {
            Some(accept) => parse_media_ranges(accept)?,
            None => Vec::new(),
        };

        let table = self.table.load();
        let (media_type, format) = if ranges.is_empty() {
            table
                .lookup(&table.default_response)
                .ok_or_else(|| FormatError::no_encoder(vec![table.default_response.clone()]))?
        } else {
            ranges
                .iter()
                .filter(|range| range.weight() > 0.0)
                .find_map(|range| table.resolve(range.essence()))
                .ok_or_else(|| FormatError::no_encoder(ranges.iter().map(|range| range.essence().to_owned()).collect()))?
        };

        trace!(media_type, "encoding payload");
        let body = format.encode(value)?;
        Ok(Encoded::new(media_type, body))
    }
}

impl Default for Formats {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Formats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let table = self.table.load();
        f.debug_struct("Formats")
            .field("media_types", &table.adapters.keys().collect::<Vec<_>>())
            .field("default_request", &table.default_request)
            .field("default_response", &table.default_response)
            .finish()
    }
}

/// `Application/JSON; charset=utf-8` -> `application/json`
fn essence(content_type: &str) -> String {
    match content_type.parse::<Mime>() {
        Ok(mime) => mime.essence_str().to_ascii_lowercase(),
        Err(_) => content_type.split(';').next().unwrap_or(content_type).trim().to_ascii_lowercase(),
    }
}

fn main_type(media_type: &str) -> &str {
    media_type.split_once('/').map_or(media_type, |(main, _)| main)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::thread;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Message {
        message: String,
    }

    fn message() -> Message {
        Message { message: "test".into() }
    }

    struct Fixed(&'static str);

    impl Format for Fixed {
        fn decode(&self, _raw: &[u8], _target: &mut dyn DecodeTarget) -> Result<(), FormatError> {
            Err(FormatError::decode("FIXED", self.0))
        }

        fn encode(&self, _value: &dyn erased_serde::Serialize) -> Result<Bytes, FormatError> {
            Ok(Bytes::from_static(self.0.as_bytes()))
        }
    }

    #[test]
    fn test_builtin_formats() {
        let formats = Formats::new();
        assert_eq!(
            formats.media_types(),
            vec![APPLICATION_JSON, APPLICATION_WWW_FORM_URLENCODED, APPLICATION_XML, APPLICATION_YAML]
        );
        assert_eq!(formats.default_request(), APPLICATION_JSON);
        assert_eq!(formats.default_response(), APPLICATION_JSON);
    }

    #[test]
    fn test_register_replaces() {
        let formats = Formats::empty();
        formats.register("Text/Plain", Fixed("a"));
        formats.register("text/plain", Fixed("b"));

        assert_eq!(formats.media_types(), vec!["text/plain"]);
        let encoded = formats.encode(Some("text/plain"), &message()).unwrap();
        assert_eq!(encoded.body().as_ref(), b"b");
    }

    #[test]
    fn test_unregister() {
        let formats = Formats::new();
        formats.unregister("application/xml");
        formats.unregister("application/not-there");

        assert!(!formats.contains(APPLICATION_XML));
        assert!(formats.contains(APPLICATION_JSON));

        let error = formats.encode(Some("application/xml"), &message()).unwrap_err();
        assert!(matches!(error, FormatError::NoEncoderForTypes { media_types } if media_types == vec![APPLICATION_XML]));
    }

    #[test]
    fn test_decode_by_content_type() {
        let formats = Formats::new();

        let json: Message = formats.decode(Some("application/json; charset=utf-8"), br#"{"message":"test"}"#).unwrap();
        let yaml: Message = formats.decode(Some("Application/YAML"), b"message: test").unwrap();
        let form: Message = formats.decode(Some(APPLICATION_WWW_FORM_URLENCODED), b"message=test").unwrap();

        assert_eq!(json, message());
        assert_eq!(yaml, message());
        assert_eq!(form, message());
    }

    #[test]
    fn test_decode_without_content_type() {
        let formats = Formats::new();
        let decoded: Message = formats.decode(None, br#"{"message":"test"}"#).unwrap();
        assert_eq!(decoded, message());

        formats.set_default_request(APPLICATION_YAML);
        let decoded: Message = formats.decode(Some(""), b"message: test").unwrap();
        assert_eq!(decoded, message());
    }

    #[test]
    fn test_decode_unknown_content_type() {
        let formats = Formats::new();
        let error = formats.decode::<Message>(Some("application/cats"), b"meow").unwrap_err();

        assert!(matches!(&error, FormatError::NoDecoderForType { media_type } if media_type == "application/cats"));
        assert_eq!(error.to_string(), "no decoder found matching type: application/cats");
        assert!(error.is_client_error());
    }

    #[test]
    fn test_encode_default() {
        let formats = Formats::new();
        for accept in [None, Some(""), Some("  ")] {
            let encoded = formats.encode(accept, &message()).unwrap();
            assert_eq!(encoded.media_type(), APPLICATION_JSON);
            assert_eq!(encoded.body().as_ref(), br#"{"message":"test"}"#);
        }
    }

    #[test]
    fn test_encode_first_resolvable_preference() {
        let formats = Formats::new();
        let encoded = formats.encode(Some("text/html, application/xml;q=0.5, application/yaml;q=0.8"), &message()).unwrap();

        assert_eq!(encoded.media_type(), APPLICATION_YAML);
        assert_eq!(encoded.body().as_ref(), b"message: test\n");
    }

    #[test]
    fn test_encode_wildcards() {
        let formats = Formats::new();
        formats.register("text/plain", Fixed("plain"));

        let any = formats.encode(Some("*/*"), &message()).unwrap();
        assert_eq!(any.media_type(), APPLICATION_JSON);

        let application = formats.encode(Some("application/*"), &message()).unwrap();
        assert_eq!(application.media_type(), APPLICATION_JSON);

        let text = formats.encode(Some("text/*"), &message()).unwrap();
        assert_eq!(text.media_type(), "text/plain");
        assert_eq!(text.body().as_ref(), b"plain");

        assert!(formats.encode(Some("image/*"), &message()).is_err());
    }

    #[test]
    fn test_encode_wildcard_skips_form() {
        let formats = Formats::new();
        formats.unregister(APPLICATION_JSON);

        let encoded = formats.encode(Some("application/*"), &message()).unwrap();
        assert_eq!(encoded.media_type(), APPLICATION_XML);
    }

    #[test]
    fn test_encode_wildcard_without_encoder() {
        let formats = Formats::empty();
        formats.register(APPLICATION_WWW_FORM_URLENCODED, Form);

        let error = formats.encode(Some("application/*"), &message()).unwrap_err();
        assert!(matches!(error, FormatError::NoEncoderForTypes { media_types } if media_types == vec!["application/*"]));
    }

    #[test]
    fn test_encode_skips_zero_weight() {
        let formats = Formats::new();

        let encoded = formats.encode(Some("application/json;q=0, application/yaml;q=0.1"), &message()).unwrap();
        assert_eq!(encoded.media_type(), APPLICATION_YAML);

        let error = formats.encode(Some("application/xml;q=0"), &message()).unwrap_err();
        assert!(matches!(error, FormatError::NoEncoderForTypes { media_types } if media_types == vec![APPLICATION_XML]));
    }

    #[test]
    fn test_encode_no_match() {
        let formats = Formats::new();
        let error = formats.encode(Some("application/cats, text/html;q=0.1"), &message()).unwrap_err();

        assert!(
            matches!(error, FormatError::NoEncoderForTypes { media_types } if media_types == vec!["application/cats", "text/html"])
        );
    }

    #[test]
    fn test_encode_missing_default() {
        let formats = Formats::new();
        formats.set_default_response("text/csv");

        let error = formats.encode(None, &message()).unwrap_err();
        assert!(matches!(error, FormatError::NoEncoderForTypes { media_types } if media_types == vec!["text/csv"]));
    }

    #[test]
    fn test_encode_malformed_accept() {
        let formats = Formats::new();
        let error = formats.encode(Some("nonsense"), &message()).unwrap_err();
        assert!(matches!(error, FormatError::MalformedAcceptHeader { .. }));
    }

    #[test]
    fn test_encode_form_unsupported() {
        let formats = Formats::new();
        let error = formats.encode(Some(APPLICATION_WWW_FORM_URLENCODED), &message()).unwrap_err();
        assert!(matches!(error, FormatError::FormEncodingUnsupported));
        assert!(!error.is_client_error());
    }

    #[test]
    fn test_register_while_reading() {
        let formats = Formats::new();

        thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..100 {
                    formats.register(&format!("text/x-{i}"), Fixed("x"));
                }
            });

            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        let encoded = formats.encode(Some("application/json"), &message()).unwrap();
                        assert_eq!(encoded.media_type(), APPLICATION_JSON);
                    }
                });
            }
        });

        assert_eq!(formats.media_types().len(), 104);
    }
}
