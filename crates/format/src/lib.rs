//! Content negotiation and pluggable wire formats
//!
//! This crate provides the serialization side of `micro-api`: it turns request payloads into
//! typed records and typed records back into response payloads, choosing the wire format from
//! the `Content-Type` and `Accept` request headers.
//!
//! # Components
//!
//! - [`accept`]: parses a weighted `Accept` header into an ordered preference list
//! - [`Formats`]: a registry mapping media types to [`Format`] adapters, holding the default
//!   request and response media types
//! - [`adapter`]: the built-in adapters for JSON, XML, YAML and url-encoded forms
//! - [`DecodeTarget`] / [`Slot`]: the typed destination an adapter decodes into
//!
//! # Example
//!
//! ```
//! use micro_format::{Formats, APPLICATION_YAML};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Greeting {
//!     message: String,
//! }
//!
//! let formats = Formats::new();
//!
//! let greeting: Greeting = formats.decode(Some("application/json"), br#"{"message":"hi"}"#).unwrap();
//! assert_eq!(greeting, Greeting { message: "hi".into() });
//!
//! let encoded = formats.encode(Some("application/yaml; q=0.9, text/html"), &greeting).unwrap();
//! assert_eq!(encoded.media_type(), APPLICATION_YAML);
//! assert_eq!(encoded.body().as_ref(), b"message: hi\n");
//! ```
//!
//! # Thread Safety
//!
//! [`Formats`] is meant to be built once at startup and shared behind an `Arc`. Registering or
//! removing an adapter while requests are served is allowed: the adapter table is replaced
//! copy-on-write, so readers always see either the old or the new table, never a mix.

pub mod accept;
pub mod adapter;

mod error;
mod registry;
mod target;

pub use accept::{parse_accept, parse_media_ranges, MediaRange};
pub use adapter::{Form, Format, Json, Xml, Yaml};
pub use error::{FormatError, MalformedHeader};
pub use registry::{Encoded, Formats};
pub use target::{DecodeTarget, Slot};

/// `application/json`
pub const APPLICATION_JSON: &str = "application/json";

/// `application/xml`
pub const APPLICATION_XML: &str = "application/xml";

/// `application/yaml`
pub const APPLICATION_YAML: &str = "application/yaml";

/// `application/x-www-form-urlencoded`, decode only
pub const APPLICATION_WWW_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
