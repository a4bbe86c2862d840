use crate::{DecodeTarget, Format, FormatError};
use bytes::Bytes;

const NAME: &str = "JSON";

/// `application/json`, backed by `serde_json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Json;

impl Format for Json {
    fn decode(&self, raw: &[u8], target: &mut dyn DecodeTarget) -> Result<(), FormatError> {
        let mut deserializer = serde_json::Deserializer::from_slice(raw);
        target
            .deserialize_from(&mut <dyn erased_serde::Deserializer>::erase(&mut deserializer))
            .map_err(|e| FormatError::decode(NAME, e))?;

        // only whitespace may follow the value
        deserializer.end().map_err(|e| FormatError::decode(NAME, e))
    }

    fn encode(&self, value: &dyn erased_serde::Serialize) -> Result<Bytes, FormatError> {
        serde_json::to_vec(value).map(Bytes::from).map_err(|e| FormatError::encode(NAME, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Slot;
    use indoc::indoc;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Message {
        #[serde(rename = "Message")]
        message: String,
    }

    fn decode(raw: &[u8]) -> Result<Option<Message>, FormatError> {
        let mut slot = Slot::empty();
        Json.decode(raw, &mut slot)?;
        Ok(slot.into_inner())
    }

    #[test]
    fn test_encode() {
        let body = Json.encode(&Message { message: "test".into() }).unwrap();
        assert_eq!(body.as_ref(), br#"{"Message":"test"}"#);
    }

    #[test]
    fn test_decode_pretty() {
        let raw = indoc! {r#"
            {
                "message": "test"
            }
        "#};

        assert_eq!(decode(raw.as_bytes()).unwrap(), Some(Message { message: "test".into() }));
    }

    #[test]
    fn test_trailing_characters() {
        let error = decode(br#"{"message":"test"} {}"#).unwrap_err();
        assert!(error.to_string().starts_with("JSON decoding error"));
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(decode(b"{}").unwrap(), Some(Message { message: String::new() }));
    }

    #[test]
    fn test_empty_body() {
        assert!(decode(b"").is_err());
    }
}
