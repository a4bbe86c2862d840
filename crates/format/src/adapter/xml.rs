use crate::{DecodeTarget, Format, FormatError};
use bytes::Bytes;

const NAME: &str = "XML";

/// `application/xml`, backed by `quick-xml`.
///
/// The root element is named after the serialized type, so a `struct Message` is written as
/// `<Message>...</Message>`. Values without a name, such as a bare string, cannot be encoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct Xml;

impl Format for Xml {
    fn decode(&self, raw: &[u8], target: &mut dyn DecodeTarget) -> Result<(), FormatError> {
        let text = std::str::from_utf8(raw).map_err(|e| FormatError::decode(NAME, e))?;
        let mut deserializer = quick_xml::de::Deserializer::from_str(text);
        target
            .deserialize_from(&mut <dyn erased_serde::Deserializer>::erase(&mut deserializer))
            .map_err(|e| FormatError::decode(NAME, e))
    }

    fn encode(&self, value: &dyn erased_serde::Serialize) -> Result<Bytes, FormatError> {
        quick_xml::se::to_string(&value).map(Bytes::from).map_err(|e| FormatError::encode(NAME, e))
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
        message: String,
    }

    #[test]
    fn test_encode_uses_type_name_as_root() {
        let body = Xml.encode(&Message { message: "test".into() }).unwrap();
        assert_eq!(body.as_ref(), b"<Message><message>test</message></Message>");
    }

    #[test]
    fn test_decode_indented() {
        let raw = indoc! {r"
            <Message>
                <message>test</message>
            </Message>
        "};

        let mut slot = Slot::<Message>::empty();
        Xml.decode(raw.as_bytes(), &mut slot).unwrap();
        assert_eq!(slot.into_inner(), Some(Message { message: "test".into() }));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut slot = Slot::<Message>::empty();
        let error = Xml.decode(&[0xff, 0xfe], &mut slot).unwrap_err();
        assert!(matches!(error, FormatError::Decode { format: "XML", .. }));
    }

    #[test]
    fn test_encode_unnamed_value() {
        let error = Xml.encode(&"plain").unwrap_err();
        assert!(matches!(error, FormatError::Encode { format: "XML", .. }));
    }
}
