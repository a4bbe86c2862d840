//! Wire format adapters
//!
//! A [`Format`] converts between raw payload bytes and typed values. Adapters are stateless and
//! shared between requests; the [`Formats`](crate::Formats) registry maps media types onto them.
//!
//! Decoding goes through a [`DecodeTarget`] so that adapters stay object safe: the adapter
//! builds its own `serde` deserializer and hands an erased version of it to the target, which
//! knows the concrete record type.

mod form;
mod json;
mod xml;
mod yaml;

pub use form::Form;
pub use json::Json;
pub use xml::Xml;
pub use yaml::Yaml;

use crate::{DecodeTarget, FormatError};
use bytes::Bytes;

pub trait Format: Send + Sync {
    /// Decodes `raw` into `target`. Failures are reported as [`FormatError::Decode`].
    fn decode(&self, raw: &[u8], target: &mut dyn DecodeTarget) -> Result<(), FormatError>;

    fn encode(&self, value: &dyn erased_serde::Serialize) -> Result<Bytes, FormatError>;

    /// Whether [`encode`](Format::encode) can succeed at all. Wildcard `Accept` ranges skip
    /// adapters that cannot.
    fn can_encode(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Slot;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Message {
        message: String,
        count: u32,
    }

    fn message() -> Message {
        Message { message: "hello".into(), count: 3 }
    }

    fn decode<F: Format>(format: &F, raw: &[u8]) -> Result<Message, FormatError> {
        let mut slot = Slot::empty();
        format.decode(raw, &mut slot)?;
        Ok(slot.into_inner().unwrap())
    }

    #[test]
    fn test_formats_read_back_what_they_write() {
        let formats: [&dyn Format; 3] = [&Json, &Xml, &Yaml];
        for format in formats {
            let body = format.encode(&message()).unwrap();

            let mut slot = Slot::<Message>::empty();
            format.decode(&body, &mut slot).unwrap();
            assert_eq!(slot.into_inner(), Some(message()));
        }
    }

    #[test]
    fn test_decode_failure_leaves_slot_empty() {
        let mut slot = Slot::<Message>::empty();
        let error = Json.decode(br#"{"message": 1}"#, &mut slot).unwrap_err();

        assert!(matches!(error, FormatError::Decode { format: "JSON", .. }));
        assert_eq!(slot.into_inner(), None);
    }

    #[test]
    fn test_every_adapter_reports_its_name() {
        assert!(matches!(decode(&Xml, b"<Message><message>a</Message>"), Err(FormatError::Decode { format: "XML", .. })));
        assert!(matches!(decode(&Yaml, b"- a\n- b\n"), Err(FormatError::Decode { format: "YAML", .. })));
        assert!(matches!(decode(&Form, b"count=many"), Err(FormatError::Decode { format: "FORM", .. })));
    }

    #[test]
    fn test_only_form_cannot_encode() {
        assert!(Json.can_encode() && Xml.can_encode() && Yaml.can_encode());
        assert!(!Form.can_encode());
    }
}
