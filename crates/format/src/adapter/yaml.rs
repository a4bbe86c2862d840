mod fields;

use crate::{DecodeTarget, Format, FormatError};
use bytes::Bytes;
use fields::LowerFields;

const NAME: &str = "YAML";

/// `application/yaml`, backed by `serde_yaml`.
///
/// Record field names are written lower-cased, so a field serialized as `Message` in JSON reads
/// `message` here. Decoding matches keys against field names ignoring case, which reads both
/// spellings back.
#[derive(Debug, Default, Clone, Copy)]
pub struct Yaml;

impl Format for Yaml {
    fn decode(&self, raw: &[u8], target: &mut dyn DecodeTarget) -> Result<(), FormatError> {
        let deserializer = serde_yaml::Deserializer::from_slice(raw);
        target
            .deserialize_from(&mut <dyn erased_serde::Deserializer>::erase(deserializer))
            .map_err(|e| FormatError::decode(NAME, e))
    }

    fn encode(&self, value: &dyn erased_serde::Serialize) -> Result<Bytes, FormatError> {
        serde_yaml::to_string(&LowerFields(value)).map(Bytes::from).map_err(|e| FormatError::encode(NAME, e))
    }
}
