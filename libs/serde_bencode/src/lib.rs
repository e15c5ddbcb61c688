//! # Bencode Decoding
//!
//! Decodes [bencoded][bencode] data into Rust values via [`serde`][serde].
//!
//! The format is self-delimiting and knows only four kinds of values:
//!
//! | Kind       | Encoding                  | Example         |
//! |------------|---------------------------|-----------------|
//! | string     | `<length>:<bytes>`        | `4:spam`        |
//! | integer    | `i<decimal>e`             | `i-42e`         |
//! | list       | `l<value>*e`              | `li1ei2ee`      |
//! | dictionary | `d(<string><value>)*e`    | `d3:fooi1ee`    |
//!
//! Strings are byte strings with an explicit length and may hold arbitrary
//! binary data. Integers fit into an [`i64`].
//!
//! Decoding happens in two steps. The [`Decoder`] first parses exactly one
//! value into an untyped [`Value`] tree, then the destination type is filled
//! from that tree. The second step only knows about [`Value`], never about
//! bytes, and is also available on its own as [`value::from_value`].
//!
//! Rust types are filled as follows:
//!
//! - strings: [`String`] and [`str`] (requiring UTF-8), and byte buffers
//!   requesting [`Deserializer::deserialize_byte_buf`].
//! - integers: all integer types. Values that don't fit are errors, not
//!   truncated, and negative values never fit unsigned types.
//! - lists: [`Vec`], slices, arrays, and tuples. Fixed-length destinations
//!   require the list to have exactly that length.
//! - dictionaries: structs and maps with string keys, f.e.
//!   [`HashMap<String, T>`](std::collections::HashMap). A struct field is
//!   looked up by its name or its `#[serde(rename)]`. Keys without a matching
//!   field are ignored. Missing fields are [`None`] for [`Option`] fields.
//!   Any other missing field is an error unless the struct or field is marked
//!   `#[serde(default)]`, so add that to decode a subset of the keys.
//! - enums: a unit variant is a string holding its name; other variants are a
//!   dictionary with the variant name as its only key.
//! - any kind: [`Value`], which keeps the data as-is, and [`value::Slot`],
//!   which may also be empty. When decoding in place with
//!   [`Decoder::decode_into`], both keep the kind of what they already hold.
//!
//! [`bool`], floats, and [`char`] have no representation in this format.
//! There is no encoder.
//!
//! # Examples
//!
//! With `#[serde(default)]`, keys missing from the data keep their default:
//!
//! ```
//! # use serde::Deserialize;
//! #[derive(Debug, Default, PartialEq, Deserialize)]
//! #[serde(default)]
//! struct Torrent {
//!     #[serde(rename = "announce")]
//!     tracker: String,
//!     #[serde(rename = "piece length")]
//!     piece_length: u32,
//!     comment: Option<String>,
//! }
//!
//! let data = b"d8:announce13:example.com:112:piece lengthi16384ee";
//! let torrent: Torrent = serde_bencode::from_slice(data).expect("must decode");
//!
//! assert_eq!(
//!     torrent,
//!     Torrent {
//!         tracker: "example.com:1".to_owned(),
//!         piece_length: 16384,
//!         comment: None,
//!     },
//!     "all fields must be decoded"
//! );
//! ```
//!
//! [bencode]: <https://www.bittorrent.org/beps/bep_0003.html#bencoding>
//! [serde]: <https://serde.rs/>
//! [`Deserializer::deserialize_byte_buf`]: serde_core::Deserializer::deserialize_byte_buf

pub mod de;
mod error;
mod options;
pub mod read;
pub mod value;

pub use de::{Decoder, from_reader, from_slice, from_slice_dynamic};
pub use error::{Error, Result};
pub use options::DecoderOptions;
pub use value::Value;

#[cfg(test)]
mod tests;
