use crate::{DecodeTarget, Format, FormatError};
use bytes::Bytes;

const NAME: &str = "FORM";

/// `application/x-www-form-urlencoded`, decode only.
///
/// Fields map flat onto the record: a key may appear once and values are scalars. Nested
/// records and repeated keys are decode errors. Encoding always fails with
/// [`FormatError::FormEncodingUnsupported`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Form;

impl Form {
    /// Decodes a raw query string, without the leading `?`, with the same rules as a form body.
    pub fn decode_query(query: &str, target: &mut dyn DecodeTarget) -> Result<(), FormatError> {
        decode_pairs(query.as_bytes(), target)
    }
}

fn decode_pairs(raw: &[u8], target: &mut dyn DecodeTarget) -> Result<(), FormatError> {
    let deserializer = serde_urlencoded::Deserializer::new(form_urlencoded::parse(raw));
    target
        .deserialize_from(&mut <dyn erased_serde::Deserializer>::erase(deserializer))
        .map_err(|e| FormatError::decode(NAME, e))
}

impl Format for Form {
    fn decode(&self, raw: &[u8], target: &mut dyn DecodeTarget) -> Result<(), FormatError> {
        decode_pairs(raw, target)
    }

    fn encode(&self, _value: &dyn erased_serde::Serialize) -> Result<Bytes, FormatError> {
        Err(FormatError::FormEncodingUnsupported)
    }

    fn can_encode(&self) -> bool {
        false
    }
}
