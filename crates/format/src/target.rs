mod zero;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use zero::ZeroFill;

/// A typed destination a [`Format`](crate::Format) decodes into.
///
/// Adapters only see an erased deserializer, the target knows the concrete type and is
/// responsible for driving it.
pub trait DecodeTarget {
    fn deserialize_from(&mut self, deserializer: &mut dyn erased_serde::Deserializer<'_>) -> Result<(), erased_serde::Error>;
}

/// Holds the value produced by a decode, empty until a decode succeeds.
///
/// A record decoded into a slot starts out with every field at its zero value: payload keys
/// overwrite the fields they name, matched exactly or ignoring ASCII case, and fields the payload
/// leaves out keep their zero value. A request without any field therefore still produces a
/// record, and field rules decide whether the missing values are acceptable.
#[derive(Debug)]
pub struct Slot<T> {
    value: Option<T>,
}

impl<T> Slot<T> {
    pub fn empty() -> Self {
        Self { value: None }
    }

    pub fn into_inner(self) -> Option<T> {
        self.value
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: DeserializeOwned> DecodeTarget for Slot<T> {
    fn deserialize_from(&mut self, deserializer: &mut dyn erased_serde::Deserializer<'_>) -> Result<(), erased_serde::Error> {
        self.value = Some(T::deserialize(ZeroFill(deserializer))?);
        Ok(())
    }
}
