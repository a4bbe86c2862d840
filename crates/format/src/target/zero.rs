//! Field matching and zero values for decoded records
//!
//! [`ZeroFill`] wraps the deserializer of a format while a record is decoded:
//!
//! - a payload key names a field when it equals the field name, or failing that, when it equals
//!   the field name ignoring ASCII case
//! - a field the payload leaves out decodes from its zero value: `false`, `0`, `""`, `None`, an
//!   empty sequence or map, or a record of zero values
//!
//! Records nested in fields, options, sequences and maps are handled the same way. Enums have no
//! zero value, a missing enum field is still a decode error. Missing fields are found by name, so
//! a field present under a `#[serde(alias)]` is not recognised, and a `#[serde(default = ..)]`
//! function is never called.

use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{self, DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer, MapAccess, SeqAccess, Visitor};
use std::fmt::Formatter;
use std::marker::PhantomData;
use std::slice;

pub(crate) struct ZeroFill<D>(pub(crate) D);

macro_rules! forward_deserialize {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
            self.0.$method(visitor)
        }
    )*};
}

impl<'de, D: Deserializer<'de>> Deserializer<'de> for ZeroFill<D> {
    type Error = D::Error;

    forward_deserialize! {
        deserialize_any deserialize_bool
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64 deserialize_i128
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64 deserialize_u128
        deserialize_f32 deserialize_f64 deserialize_char deserialize_str deserialize_string
        deserialize_bytes deserialize_byte_buf deserialize_unit deserialize_identifier deserialize_ignored_any
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.0.deserialize_option(Nested(visitor))
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, name: &'static str, visitor: V) -> Result<V::Value, Self::Error> {
        self.0.deserialize_unit_struct(name, visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_newtype_struct(name, Nested(visitor))
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.0.deserialize_seq(Nested(visitor))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, Self::Error> {
        self.0.deserialize_tuple(len, Nested(visitor))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_tuple_struct(name, len, Nested(visitor))
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.0.deserialize_map(Nested(visitor))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_struct(name, fields, Record { visitor, fields })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_enum(name, variants, visitor)
    }

    fn is_human_readable(&self) -> bool {
        self.0.is_human_readable()
    }
}

/// Re-wraps whatever a container hands to the visitor.
struct Nested<V>(V);

macro_rules! forward_visit {
    ($($method:ident($ty:ty))*) => {$(
        fn $method<E: de::Error>(self, v: $ty) -> Result<Self::Value, E> {
            self.0.$method(v)
        }
    )*};
}

impl<'de, V: Visitor<'de>> Visitor<'de> for Nested<V> {
    type Value = V::Value;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.expecting(f)
    }

    forward_visit! {
        visit_bool(bool) visit_i64(i64) visit_i128(i128) visit_u64(u64) visit_u128(u128)
        visit_f64(f64) visit_char(char) visit_str(&str) visit_borrowed_str(&'de str) visit_string(String)
        visit_bytes(&[u8]) visit_borrowed_bytes(&'de [u8]) visit_byte_buf(Vec<u8>)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        self.0.visit_none()
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        self.0.visit_unit()
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        self.0.visit_some(ZeroFill(deserializer))
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        self.0.visit_newtype_struct(ZeroFill(deserializer))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
        self.0.visit_seq(Elements(seq))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        self.0.visit_map(Entries(map))
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Self::Value, A::Error> {
        self.0.visit_enum(data)
    }
}

struct Wrap<S>(S);

impl<'de, S: DeserializeSeed<'de>> DeserializeSeed<'de> for Wrap<S> {
    type Value = S::Value;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        self.0.deserialize(ZeroFill(deserializer))
    }
}

struct Elements<A>(A);

impl<'de, A: SeqAccess<'de>> SeqAccess<'de> for Elements<A> {
    type Error = A::Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error> {
        self.0.next_element_seed(Wrap(seed))
    }

    fn size_hint(&self) -> Option<usize> {
        self.0.size_hint()
    }
}

struct Entries<A>(A);

impl<'de, A: MapAccess<'de>> MapAccess<'de> for Entries<A> {
    type Error = A::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error> {
        self.0.next_key_seed(seed)
    }

    fn next_value_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<T::Value, Self::Error> {
        self.0.next_value_seed(Wrap(seed))
    }

    fn size_hint(&self) -> Option<usize> {
        self.0.size_hint()
    }
}

/// Visitor of a record, knows the field names the record expects.
struct Record<V> {
    visitor: V,
    fields: &'static [&'static str],
}

impl<'de, V: Visitor<'de>> Visitor<'de> for Record<V> {
    type Value = V::Value;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.visitor.expecting(f)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
        self.visitor.visit_seq(Elements(seq))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        self.visitor.visit_map(Fields { map, fields: self.fields, seen: Vec::new(), missing: None })
    }
}

/// Entries of a record payload followed by the zero value of every field it left out.
struct Fields<A> {
    map: A,
    fields: &'static [&'static str],
    seen: Vec<&'static str>,
    // set once the payload is exhausted
    missing: Option<slice::Iter<'static, &'static str>>,
}

impl<'de, A: MapAccess<'de>> MapAccess<'de> for Fields<A> {
    type Error = A::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error> {
        if self.missing.is_none() {
            if let Some(key) = self.map.next_key::<String>()? {
                return match field_name(self.fields, &key) {
                    Some(field) => {
                        self.seen.push(field);
                        seed.deserialize(<&str as IntoDeserializer<'de, A::Error>>::into_deserializer(field)).map(Some)
                    }
                    None => seed.deserialize(<String as IntoDeserializer<'de, A::Error>>::into_deserializer(key)).map(Some),
                };
            }
            self.missing = Some(self.fields.iter());
        }

        let seen = &self.seen;
        let missing = self.missing.as_mut().and_then(|fields| fields.find(|field| !seen.contains(*field)));
        match missing {
            Some(field) => seed.deserialize(<&str as IntoDeserializer<'de, A::Error>>::into_deserializer(*field)).map(Some),
            None => Ok(None),
        }
    }

    fn next_value_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<T::Value, Self::Error> {
        if self.missing.is_some() {
            seed.deserialize(Zero::new())
        } else {
            self.map.next_value_seed(Wrap(seed))
        }
    }
}

fn field_name(fields: &'static [&'static str], key: &str) -> Option<&'static str> {
    fields
        .iter()
        .find(|field| **field == key)
        .or_else(|| fields.iter().find(|field| field.eq_ignore_ascii_case(key)))
        .copied()
}

/// Deserializes the zero value of whatever type asks for it.
struct Zero<E>(PhantomData<E>);

impl<E> Zero<E> {
    fn new() -> Self {
        Self(PhantomData)
    }
}

macro_rules! zero_scalar {
    ($($method:ident => $visit:ident($value:expr))*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
            visitor.$visit($value)
        }
    )*};
}

impl<'de, E: de::Error> Deserializer<'de> for Zero<E> {
    type Error = E;

    zero_scalar! {
        deserialize_bool => visit_bool(false)
        deserialize_i8 => visit_i8(0)
        deserialize_i16 => visit_i16(0)
        deserialize_i32 => visit_i32(0)
        deserialize_i64 => visit_i64(0)
        deserialize_u8 => visit_u8(0)
        deserialize_u16 => visit_u16(0)
        deserialize_u32 => visit_u32(0)
        deserialize_u64 => visit_u64(0)
        deserialize_f32 => visit_f32(0.0)
        deserialize_f64 => visit_f64(0.0)
        deserialize_char => visit_char('\0')
        deserialize_str => visit_str("")
        deserialize_string => visit_str("")
        deserialize_identifier => visit_str("")
        deserialize_bytes => visit_bytes(&[])
        deserialize_byte_buf => visit_bytes(&[])
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_none()
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(SeqDeserializer::new(std::iter::empty::<()>()))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_map(MapDeserializer::new(std::iter::empty::<((), ())>()))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_map(Zeros { fields: fields.iter(), marker: PhantomData })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(E::custom(format_args!("enum {name} has no zero value")))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }
}

/// A record where every field holds its zero value.
struct Zeros<E> {
    fields: slice::Iter<'static, &'static str>,
    marker: PhantomData<E>,
}

impl<'de, E: de::Error> MapAccess<'de> for Zeros<E> {
    type Error = E;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error> {
        match self.fields.next() {
            Some(field) => seed.deserialize(<&str as IntoDeserializer<'de, E>>::into_deserializer(*field)).map(Some),
            None => Ok(None),
        }
    }

    fn next_value_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<T::Value, Self::Error> {
        seed.deserialize(Zero::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde::de::value::{Error, MapDeserializer};
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Inner {
        name: String,
        flag: bool,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Outer {
        #[serde(rename = "Message")]
        message: String,
        count: u32,
        tags: Vec<String>,
        note: Option<String>,
        inner: Inner,
    }

    fn decode<T: for<'de> Deserialize<'de>>(pairs: &[(&'static str, &'static str)]) -> Result<T, Error> {
        let map = MapDeserializer::<_, Error>::new(pairs.iter().copied());
        T::deserialize(ZeroFill(map))
    }

    #[test]
    fn test_missing_fields_are_zero() {
        let outer: Outer = decode(&[]).unwrap();
        assert_eq!(
            outer,
            Outer {
                message: String::new(),
                count: 0,
                tags: Vec::new(),
                note: None,
                inner: Inner { name: String::new(), flag: false },
            }
        );
    }

    #[test]
    fn test_keys_match_ignoring_case() {
        let outer: Outer = decode(&[("message", "hi")]).unwrap();
        assert_eq!(outer.message, "hi");
        assert_eq!(outer.count, 0);
    }

    #[test]
    fn test_exact_name_wins() {
        #[derive(Debug, Deserialize)]
        struct Pair {
            a: String,
            #[serde(rename = "A")]
            upper: String,
        }

        let pair: Pair = decode(&[("A", "upper"), ("a", "lower")]).unwrap();
        assert_eq!(pair.a, "lower");
        assert_eq!(pair.upper, "upper");
    }

    #[test]
    fn test_present_field_is_not_filled_twice() {
        let inner: Inner = decode(&[("Name", "x")]).unwrap();
        assert_eq!(inner, Inner { name: "x".into(), flag: false });
    }

    #[test]
    fn test_maps_keep_their_keys() {
        let map: BTreeMap<String, String> = decode(&[("Upper", "x")]).unwrap();
        assert_eq!(map.into_iter().collect::<Vec<_>>(), vec![("Upper".to_owned(), "x".to_owned())]);
    }

    #[test]
    fn test_enum_has_no_zero_value() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code, reason = "only decoded")]
        enum Kind {
            A,
        }

        #[derive(Debug, Deserialize)]
        #[allow(dead_code, reason = "only decoded")]
        struct Tagged {
            kind: Kind,
        }

        let error = decode::<Tagged>(&[]).unwrap_err();
        assert_eq!(error.to_string(), "enum Kind has no zero value");
    }
}
