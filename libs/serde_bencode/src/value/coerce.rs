//! Fills typed destinations from a [`Value`].
//!
//! The destination's [`Deserialize`] implementation describes its shape by
//! calling exactly one `deserialize_*` method; each of those accepts only the
//! value kinds that shape can hold. Integers are range-checked into the
//! requested width rather than truncated.

use std::collections::btree_map;
use std::vec;

use serde_core::de;
use serde_core::Deserializer;

use super::{Dict, Kind, Value};
use crate::error::Error;

/// Decodes a typed value from an already decoded [`Value`].
///
/// # Errors
///
/// Returns an error if the value's shape doesn't fit `T`.
///
/// # Examples
///
/// ```
/// # use serde_bencode::value::{Value, from_value};
/// let list = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
/// let nums: Vec<u8> = from_value(list).expect("must fit");
/// assert_eq!(nums, [1, 2, 3], "list must be copied in order");
/// ```
pub fn from_value<T>(value: Value) -> Result<T, Error>
where
    T: de::DeserializeOwned,
{
    T::deserialize(value)
}

impl Value {
    fn mismatch(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    fn into_int(self, expected: &'static str) -> Result<i64, Error> {
        match self {
            Self::Int(v) => Ok(v),
            _ => Err(self.mismatch(expected)),
        }
    }

    fn into_unsigned(self, expected: &'static str) -> Result<u64, Error> {
        let value = self.into_int(expected)?;
        u64::try_from(value).map_err(|_| Error::NegativeToUnsigned {
            value,
            target: expected,
        })
    }

    fn into_byte_buf(self, expected: &'static str) -> Result<Vec<u8>, Error> {
        match self {
            Self::Str(v) => Ok(v),
            _ => Err(self.mismatch(expected)),
        }
    }

    fn into_string(self) -> Result<String, Error> {
        let v = self.into_byte_buf("string")?;
        String::from_utf8(v).map_err(|_| Error::InvalidUtf8)
    }
}

macro_rules! deserialize_signed {
    ($($method:ident => $visit:ident($ty:ty);)*) => {$(
        fn $method<V>(self, visitor: V) -> Result<V::Value, Self::Error>
        where
            V: de::Visitor<'de>,
        {
            let value = self.into_int(stringify!($ty))?;
            let v = <$ty>::try_from(value).map_err(|_| Error::IntegerOverflow {
                value,
                target: stringify!($ty),
            })?;
            visitor.$visit(v)
        }
    )*};
}

macro_rules! deserialize_unsigned {
    ($($method:ident => $visit:ident($ty:ty);)*) => {$(
        fn $method<V>(self, visitor: V) -> Result<V::Value, Self::Error>
        where
            V: de::Visitor<'de>,
        {
            let value = self.into_unsigned(stringify!($ty))?;
            let v = <$ty>::try_from(value).map_err(|_| Error::IntegerOverflow {
                // fits, since it was just converted from an i64
                value: value.cast_signed(),
                target: stringify!($ty),
            })?;
            visitor.$visit(v)
        }
    )*};
}

macro_rules! deserialize_unsupported {
    ($($method:ident => $name:literal;)*) => {$(
        fn $method<V>(self, _visitor: V) -> Result<V::Value, Self::Error>
        where
            V: de::Visitor<'de>,
        {
            Err(Error::UnsupportedShape($name))
        }
    )*};
}

impl<'de> Deserializer<'de> for Value {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Self::Str(v) => match String::from_utf8(v) {
                Ok(v) => visitor.visit_string(v),
                Err(err) => visitor.visit_byte_buf(err.into_bytes()),
            },
            Self::Int(v) => visitor.visit_i64(v),
            Self::List(v) => visit_list(v, visitor),
            Self::Dict(v) => visit_dict(v, visitor),
        }
    }

    deserialize_signed! {
        deserialize_i8 => visit_i8(i8);
        deserialize_i16 => visit_i16(i16);
        deserialize_i32 => visit_i32(i32);
        deserialize_i64 => visit_i64(i64);
    }

    deserialize_unsigned! {
        deserialize_u8 => visit_u8(u8);
        deserialize_u16 => visit_u16(u16);
        deserialize_u32 => visit_u32(u32);
        deserialize_u64 => visit_u64(u64);
    }

    deserialize_unsupported! {
        deserialize_bool => "bool";
        deserialize_f32 => "f32";
        deserialize_f64 => "f64";
        deserialize_char => "char";
    }

    fn deserialize_i128<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        let value = self.into_int("i128")?;
        visitor.visit_i128(value.into())
    }

    fn deserialize_u128<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        let value = self.into_unsigned("u128")?;
        visitor.visit_u128(value.into())
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(self.into_string()?)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_byte_buf(self.into_byte_buf("bytes")?)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        // the format has no null, so anything present is `Some`
        visitor.visit_some(self)
    }

    fn deserialize_unit<V>(self, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::InvalidDestination("()"))
    }

    fn deserialize_unit_struct<V>(
        self,
        name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::InvalidDestination(name))
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Self::List(v) => visit_list(v, visitor),
            _ => Err(self.mismatch("sequence")),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Self::Dict(v) => visit_dict(v, visitor),
            _ => Err(self.mismatch("map")),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        // unknown keys are skipped by the visitor via `deserialize_ignored_any`
        match self {
            Self::Dict(v) => visit_dict(v, visitor),
            _ => Err(self.mismatch("struct")),
        }
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        let (variant, value) = match self {
            Self::Str(variant) => (variant, None),
            Self::Dict(mut v) => match v.pop_first() {
                Some((variant, value)) if v.is_empty() => (variant, Some(value)),
                _ => {
                    return Err(Error::TypeMismatch {
                        expected: "enum",
                        found: Kind::Dict,
                    });
                },
            },
            _ => return Err(self.mismatch("enum")),
        };

        visitor.visit_enum(EnumDeserializer { variant, value })
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Self::Str(v) => KeyDeserializer(v).deserialize_any(visitor),
            _ => Err(self.mismatch("identifier")),
        }
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

impl de::IntoDeserializer<'_, Error> for Value {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

fn visit_list<'de, V>(list: Vec<Value>, visitor: V) -> Result<V::Value, Error>
where
    V: de::Visitor<'de>,
{
    let len = list.len();
    let mut seq = SeqDeserializer {
        iter: list.into_iter(),
    };

    let out = visitor.visit_seq(&mut seq)?;
    if seq.iter.len() == 0 {
        Ok(out)
    } else {
        Err(de::Error::invalid_length(len, &"fewer elements in list"))
    }
}

fn visit_dict<'de, V>(dict: Dict, visitor: V) -> Result<V::Value, Error>
where
    V: de::Visitor<'de>,
{
    let mut map = MapDeserializer {
        iter: dict.into_iter(),
        value: None,
    };

    visitor.visit_map(&mut map)
}

struct SeqDeserializer {
    iter: vec::IntoIter<Value>,
}

impl<'de> de::SeqAccess<'de> for &mut SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(value).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: btree_map::IntoIter<Vec<u8>, Value>,
    value: Option<Value>,
}

impl<'de> de::MapAccess<'de> for &mut MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(KeyDeserializer(key)).map(Some)
            },
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(value),
            None => Err(de::Error::custom("value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// Deserializes a dictionary key or enum variant name.
///
/// Keys are always byte strings, so only string-like destinations accept
/// them.
struct KeyDeserializer(Vec<u8>);

impl<'de> Deserializer<'de> for KeyDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        match String::from_utf8(self.0) {
            Ok(v) => visitor.visit_string(v),
            Err(err) => visitor.visit_byte_buf(err.into_bytes()),
        }
    }

    deserialize_unsupported! {
        deserialize_bool => "map key of type bool";
        deserialize_i8 => "map key of type i8";
        deserialize_i16 => "map key of type i16";
        deserialize_i32 => "map key of type i32";
        deserialize_i64 => "map key of type i64";
        deserialize_i128 => "map key of type i128";
        deserialize_u8 => "map key of type u8";
        deserialize_u16 => "map key of type u16";
        deserialize_u32 => "map key of type u32";
        deserialize_u64 => "map key of type u64";
        deserialize_u128 => "map key of type u128";
        deserialize_f32 => "map key of type f32";
        deserialize_f64 => "map key of type f64";
        deserialize_char => "map key of type char";
        deserialize_unit => "map key of type ()";
        deserialize_seq => "sequence map key";
        deserialize_map => "map map key";
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        let v = String::from_utf8(self.0).map_err(|_| Error::InvalidUtf8)?;
        visitor.visit_string(v)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_byte_buf(self.0)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_byte_buf(self.0)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_unit_struct<V>(
        self,
        _name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::UnsupportedShape("unit struct map key"))
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_tuple<V>(self, _len: usize, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::UnsupportedShape("tuple map key"))
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::UnsupportedShape("tuple struct map key"))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::UnsupportedShape("struct map key"))
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_enum(EnumDeserializer {
            variant: self.0,
            value: None,
        })
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_any(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

/// Externally tagged enum: either a bare variant name, or a dictionary with
/// the variant name as its only key.
struct EnumDeserializer {
    variant: Vec<u8>,
    value: Option<Value>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant), Self::Error>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(KeyDeserializer(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Self::Error> {
        match self.value {
            None => Ok(()),
            Some(value) => Err(value.mismatch("unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, Self::Error>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(value),
            None => Err(de::Error::invalid_type(
                de::Unexpected::UnitVariant,
                &"newtype variant",
            )),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(value) => value.deserialize_seq(visitor),
            None => Err(de::Error::invalid_type(
                de::Unexpected::UnitVariant,
                &"tuple variant",
            )),
        }
    }

    fn struct_variant<V>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(value) => value.deserialize_struct("", fields, visitor),
            None => Err(de::Error::invalid_type(
                de::Unexpected::UnitVariant,
                &"struct variant",
            )),
        }
    }
}
