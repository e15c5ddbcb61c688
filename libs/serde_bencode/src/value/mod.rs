//! The untyped value tree produced by the [`Decoder`](crate::Decoder).
//!
//! A [`Value`] mirrors the four kinds of the format and nothing else. It is
//! both the input to typed decoding (it implements [`Deserializer`]) and the
//! natural representation for destinations that don't know their shape
//! upfront (it implements [`Deserialize`]).
//!
//! [`Deserializer`]: serde_core::Deserializer

use std::collections::BTreeMap;
use std::fmt;

use serde_core::de;
use serde_core::{Deserialize, Deserializer};

use crate::error::{Error, Result};

mod coerce;

pub use coerce::from_value;

/// Key-value storage of a [`Value::Dict`].
///
/// Keys are raw bytes, since the format doesn't require them to be UTF-8.
pub type Dict = BTreeMap<Vec<u8>, Value>;

/// A decoded value of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A byte string. It may or may not be valid UTF-8.
    Str(Vec<u8>),
    /// A signed integer.
    Int(i64),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A dictionary with unique byte string keys.
    Dict(Dict),
}

/// The kind of a [`Value`], without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// [`Value::Str`]
    Str,
    /// [`Value::Int`]
    Int,
    /// [`Value::List`]
    List,
    /// [`Value::Dict`]
    Dict,
}

impl Kind {
    /// A human-readable name for the kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Int => "integer",
            Self::List => "list",
            Self::Dict => "dictionary",
        }
    }

    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::Str),
            "integer" => Some(Self::Int),
            "list" => Some(Self::List),
            "dictionary" => Some(Self::Dict),
            _ => None,
        }
    }

    pub(crate) fn from_unexpected(unexp: &de::Unexpected<'_>) -> Option<Self> {
        use de::Unexpected as U;

        match unexp {
            U::Str(_) | U::Bytes(_) => Some(Self::Str),
            U::Signed(_) | U::Unsigned(_) => Some(Self::Int),
            U::Seq => Some(Self::List),
            U::Map => Some(Self::Dict),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl de::Expected for Kind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl Value {
    /// Gets the kind of this value.
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Str(_) => Kind::Str,
            Self::Int(_) => Kind::Int,
            Self::List(_) => Kind::List,
            Self::Dict(_) => Kind::Dict,
        }
    }

    /// Gets the raw bytes if this is a string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Gets the contents if this is a string holding valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Gets the integer if this is one.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Gets the elements if this is a list.
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Gets the entries if this is a dictionary.
    pub const fn as_dict(&self) -> Option<&Dict> {
        match self {
            Self::Dict(v) => Some(v),
            _ => None,
        }
    }

    /// Looks up a key if this is a dictionary.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&Self> {
        self.as_dict().and_then(|d| d.get(key.as_ref()))
    }

    fn unexpected(&self) -> de::Unexpected<'_> {
        match self {
            Self::Str(v) => de::Unexpected::Bytes(v),
            Self::Int(v) => de::Unexpected::Signed(*v),
            Self::List(_) => de::Unexpected::Seq,
            Self::Dict(_) => de::Unexpected::Map,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value.into_bytes())
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Str(value.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::List(value)
    }
}

impl From<Dict> for Value {
    fn from(value: Dict) -> Self {
        Self::Dict(value)
    }
}

/// Stores a value into a dynamically typed slot.
///
/// An empty slot accepts any value. A slot that already holds a value only
/// accepts a value of the same [`Kind`], so decoding into it again can never
/// silently change what it holds. On error, the slot is left unchanged.
///
/// # Errors
///
/// Returns [`Error::TypeMismatch`] if the slot holds a value of a different
/// kind.
///
/// # Examples
///
/// ```
/// # use serde_bencode::value::{self, Value};
/// let mut slot = None;
/// value::assign(&mut slot, Value::Int(1)).expect("empty slot accepts anything");
/// value::assign(&mut slot, Value::Int(2)).expect("same kind is accepted");
/// assert!(
///     value::assign(&mut slot, Value::from("spam")).is_err(),
///     "kind must not change"
/// );
/// assert_eq!(slot, Some(Value::Int(2)), "slot must keep the last integer");
/// ```
pub fn assign(slot: &mut Option<Value>, value: Value) -> Result<()> {
    if let Some(current) = slot
        && current.kind() != value.kind()
    {
        return Err(Error::TypeMismatch {
            expected: current.kind().name(),
            found: value.kind(),
        });
    }

    *slot = Some(value);
    Ok(())
}

/// A dynamically typed slot that may be empty.
///
/// This is the field-sized counterpart to [`assign`]. Decoding into a filled
/// slot in place, f.e. via [`Decoder::decode_into`] or as a field of a
/// struct decoded in place, only accepts a value of the kind it already
/// holds. An [`Option<Value>`] field is always replaced as a whole instead.
///
/// [`Decoder::decode_into`]: crate::Decoder::decode_into
///
/// # Examples
///
/// ```
/// # use serde_bencode::{Decoder, Value, value::Slot};
/// let mut slot = Slot::new();
/// let mut decoder = Decoder::from_slice(b"i1ei2e4:spam");
/// decoder.decode_into(&mut slot).expect("empty slot accepts anything");
/// decoder.decode_into(&mut slot).expect("same kind is accepted");
/// assert!(decoder.decode_into(&mut slot).is_err(), "kind must not change");
/// assert_eq!(slot.get(), Some(&Value::Int(2)), "slot must keep the last integer");
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Slot(Option<Value>);

impl Slot {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self(None)
    }

    /// Gets the held value, if any.
    pub const fn get(&self) -> Option<&Value> {
        self.0.as_ref()
    }

    /// Unwraps the slot into its value.
    pub fn into_inner(self) -> Option<Value> {
        self.0
    }

    /// Stores a value into this slot by the rules of [`assign`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the slot holds a value of a
    /// different kind.
    pub fn assign(&mut self, value: Value) -> Result<()> {
        assign(&mut self.0, value)
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Self(Some(value))
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from)
    }

    fn deserialize_in_place<D>(
        deserializer: D,
        place: &mut Self,
    ) -> std::result::Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        match &mut place.0 {
            Some(current) => Value::deserialize_in_place(deserializer, current),
            None => {
                place.0 = Some(Value::deserialize(deserializer)?);
                Ok(())
            },
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }

    /// Replaces `place` only with a value of the same [`Kind`].
    fn deserialize_in_place<D>(
        deserializer: D,
        place: &mut Self,
    ) -> std::result::Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Self::deserialize(deserializer)?;
        if value.kind() != place.kind() {
            return Err(de::Error::invalid_type(value.unexpected(), &place.kind()));
        }

        *place = value;
        Ok(())
    }
}

struct ValueVisitor;

impl<'de> de::Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string, integer, list, or dictionary")
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(v))
    }

    fn visit_string<E>(self, v: String) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(v))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(v))
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Str(v))
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        // don't trust the size hint too much
        let mut list = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(0x100));
        while let Some(item) = seq.next_element()? {
            list.push(item);
        }

        Ok(Value::List(list))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        let mut dict = Dict::new();
        while let Some((KeyBuf(key), value)) = map.next_entry()? {
            dict.insert(key, value);
        }

        Ok(Value::Dict(dict))
    }
}

/// A dictionary key as raw bytes, accepting both string and byte keys.
struct KeyBuf(Vec<u8>);

impl<'de> Deserialize<'de> for KeyBuf {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor;

        impl de::Visitor<'_> for KeyVisitor {
            type Value = KeyBuf;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a string key")
            }

            fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(KeyBuf(v.as_bytes().to_vec()))
            }

            fn visit_string<E>(self, v: String) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(KeyBuf(v.into_bytes()))
            }

            fn visit_bytes<E>(self, v: &[u8]) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(KeyBuf(v.to_vec()))
            }

            fn visit_byte_buf<E>(self, v: Vec<u8>) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(KeyBuf(v))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}
