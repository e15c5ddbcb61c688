//! Exposes the decoder and decoding helper methods.
//!
//! Decoding is split in two steps: the [`Decoder`] parses exactly one value
//! off its input into a [`Value`] without knowing the destination type, then
//! [`from_value`] fills the destination from that tree.

use std::io;

use serde_core::de;

use crate::error::{Error, Result};
use crate::options::DecoderOptions;
use crate::read::{IoRead, Read, SliceRead};
use crate::value::{self, Dict, Value, from_value};

/// Decodes a value from a byte slice.
///
/// Only the first value is decoded. Excess bytes in the slice are ignored; if
/// you need to handle them, use [`Decoder::from_slice`] and
/// [`Decoder::remainder`].
///
/// # Errors
///
/// Returns an error if the data is malformed or doesn't fit `T`.
///
/// # Examples
///
/// ```
/// # use serde_bencode::from_slice;
/// let s: String = from_slice(b"4:spam").expect("must decode");
/// assert_eq!(s, "spam", "string must be decoded");
/// ```
pub fn from_slice<T>(buf: &[u8]) -> Result<T>
where
    T: de::DeserializeOwned,
{
    Decoder::from_slice(buf).decode()
}

/// Decodes a value from a [`io::Read`].
///
/// The reader is left positioned right after the decoded value.
///
/// # Errors
///
/// Returns an error if reading fails, the data is malformed, or it doesn't
/// fit `T`.
pub fn from_reader<T, R>(reader: R) -> Result<T>
where
    T: de::DeserializeOwned,
    R: io::Read,
{
    Decoder::from_reader(reader).decode()
}

/// Decodes a value from a byte slice into a dynamically typed slot.
///
/// See [`value::assign`] for the rules.
///
/// # Errors
///
/// Returns an error if the data is malformed or the slot holds a value of a
/// different kind.
pub fn from_slice_dynamic(buf: &[u8], slot: &mut Option<Value>) -> Result<()> {
    Decoder::from_slice(buf).decode_dynamic(slot)
}

/// A decoder for bencoded data.
///
/// Each call to one of the `decode` methods reads exactly one value and
/// leaves the input positioned after it, so the same decoder can be used to
/// read consecutive values. Once the input is exhausted, those methods return
/// [`Error::Eof`].
///
/// After any other error, the position of the input is unspecified.
///
/// # Examples
///
/// ```
/// # use serde_bencode::{Decoder, Error};
/// let mut decoder = Decoder::from_slice(b"i1e4:spam");
/// assert_eq!(decoder.decode::<u32>().expect("first value"), 1, "first value must be 1");
/// assert_eq!(decoder.decode::<String>().expect("second value"), "spam", "second value must be spam");
/// assert!(decoder.decode::<u32>().is_err_and(|e| e.is_eof()), "input must be exhausted");
/// ```
#[derive(Debug)]
pub struct Decoder<R> {
    reader: R,
    options: DecoderOptions,
    depth: usize,
}

impl<R: Read> Decoder<R> {
    /// Creates a new decoder that reads values from a [`Read`].
    ///
    /// When reading from a slice, using [`Self::from_slice`] may be clearer.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            options: DecoderOptions::new(),
            depth: 0,
        }
    }

    /// Replaces the limits applied while parsing.
    #[must_use]
    pub fn with_options(mut self, options: DecoderOptions) -> Self {
        self.options = options;
        self
    }

    /// Decodes the next value into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Eof`] if the input has no further values, otherwise an
    /// error if the data is malformed or doesn't fit `T`.
    pub fn decode<T>(&mut self) -> Result<T>
    where
        T: de::DeserializeOwned,
    {
        from_value(self.decode_value()?)
    }

    /// Decodes the next value into an existing destination.
    ///
    /// The destination is filled in place, so a [`Value`] or
    /// [`Slot`](value::Slot) it holds keeps its [`Kind`](value::Kind): a value
    /// of another kind is rejected rather than replacing it. Derived structs
    /// pass this on to their fields when `serde_derive` has its
    /// `deserialize_in_place` feature enabled; otherwise they are replaced as
    /// a whole.
    ///
    /// If the data is malformed, `place` is left unchanged. If it is
    /// well-formed but doesn't fit `T`, `place` may have been partially
    /// updated.
    ///
    /// # Errors
    ///
    /// Same as [`Self::decode`]. Additionally returns [`Error::TypeMismatch`]
    /// if a held value would change its kind.
    ///
    /// # Examples
    ///
    /// ```
    /// # use serde_bencode::{Decoder, Value};
    /// let mut place = Value::Int(1);
    /// let mut decoder = Decoder::from_slice(b"i2e4:spam");
    /// decoder.decode_into(&mut place).expect("same kind is accepted");
    /// assert!(decoder.decode_into(&mut place).is_err(), "kind must not change");
    /// assert_eq!(place, Value::Int(2), "place must keep the last integer");
    /// ```
    pub fn decode_into<T>(&mut self, place: &mut T) -> Result<()>
    where
        T: de::DeserializeOwned,
    {
        let value = self.decode_value()?;
        T::deserialize_in_place(value, place)
    }

    /// Decodes the next value into a dynamically typed slot.
    ///
    /// See [`value::assign`] for the rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Eof`] if the input has no further values, otherwise an
    /// error if the data is malformed or the slot holds a value of a different
    /// kind.
    pub fn decode_dynamic(&mut self, slot: &mut Option<Value>) -> Result<()> {
        value::assign(slot, self.decode_value()?)
    }

    /// Returns an iterator over the remaining values in the input.
    ///
    /// The iterator ends when the input is exhausted. It yields at most one
    /// error, after which it is fused.
    pub fn values(&mut self) -> Values<'_, R> {
        Values {
            decoder: self,
            done: false,
        }
    }

    /// Parses the next value without interpreting it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Eof`] if the input has no further values, otherwise an
    /// error if the data is malformed.
    pub fn decode_value(&mut self) -> Result<Value> {
        self.depth = 0;
        match self.reader.peek_byte()? {
            None => Err(Error::Eof),
            Some(_) => {
                let value = self.parse_value().inspect_err(|err| {
                    log::debug!("Failed to decode value: {err}");
                })?;

                log::trace!("Decoded {} value.", value.kind());
                Ok(value)
            },
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        let Some(b) = self.reader.peek_byte()? else {
            // only reachable inside of a list or dictionary
            return Err(Error::UnterminatedContainer);
        };

        match b {
            b'0'..=b'9' => self.parse_str().map(Value::Str),
            b'i' => self.parse_int().map(Value::Int),
            b'l' => self.parse_list().map(Value::List),
            b'd' => self.parse_dict().map(Value::Dict),
            _ => Err(Error::InvalidLeadByte(b)),
        }
    }

    /// Format: `<length>:<contents>`
    fn parse_str(&mut self) -> Result<Vec<u8>> {
        let mut len = 0usize;
        let mut digits = 0usize;

        loop {
            match self.reader.next_byte()? {
                Some(b':') if digits != 0 => break,
                Some(b @ b'0'..=b'9') => {
                    len = len
                        .checked_mul(10)
                        .and_then(|l| l.checked_add(usize::from(b - b'0')))
                        .ok_or(Error::MalformedLength)?;
                    digits += 1;
                },
                _ => return Err(Error::MalformedLength),
            }
        }

        if let Some(limit) = self.options.max_string_len
            && len > limit
        {
            log::debug!("Rejected string of length {len}, limit is {limit}.");
            return Err(Error::StringTooLong { len, limit });
        }

        self.reader.read_byte_vec(len)
    }

    /// Format: `i<integer>e`
    fn parse_int(&mut self) -> Result<i64> {
        self.expect_byte(b'i')?;

        let negative = self.reader.peek_byte()? == Some(b'-');
        if negative {
            self.reader.next_byte()?;
        }

        // accumulate towards the sign so i64::MIN doesn't overflow
        let mut value = 0i64;
        let mut digits = 0usize;

        loop {
            match self.reader.next_byte()? {
                Some(b'e') if digits != 0 => break Ok(value),
                Some(b @ b'0'..=b'9') => {
                    let digit = i64::from(b - b'0');
                    value = value
                        .checked_mul(10)
                        .and_then(|v| {
                            if negative {
                                v.checked_sub(digit)
                            } else {
                                v.checked_add(digit)
                            }
                        })
                        .ok_or(Error::MalformedInteger)?;
                    digits += 1;
                },
                _ => break Err(Error::MalformedInteger),
            }
        }
    }

    /// Format: `l<value>*e`
    fn parse_list(&mut self) -> Result<Vec<Value>> {
        self.expect_byte(b'l')?;
        self.enter()?;

        let mut list = Vec::new();
        while !self.try_end()? {
            list.push(self.parse_value()?);
        }

        self.depth -= 1;
        Ok(list)
    }

    /// Format: `d(<string><value>)*e`
    fn parse_dict(&mut self) -> Result<Dict> {
        self.expect_byte(b'd')?;
        self.enter()?;

        let mut dict = Dict::new();
        while !self.try_end()? {
            if !self.reader.peek_byte()?.is_some_and(|b| b.is_ascii_digit()) {
                return Err(Error::NonStringKey);
            }

            let key = self.parse_str()?;
            let value = self.parse_value()?;

            if self.options.reject_duplicate_keys && dict.contains_key(&key) {
                let key = String::from_utf8_lossy(&key).into_owned();
                log::debug!("Rejected duplicate dictionary key {key:?}.");
                return Err(Error::DuplicateKey(key));
            }

            // last write wins
            dict.insert(key, value);
        }

        self.depth -= 1;
        Ok(dict)
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        match self.reader.next_byte()? {
            Some(b) if b == expected => Ok(()),
            Some(b) => Err(Error::InvalidLeadByte(b)),
            None => Err(Error::UnterminatedContainer),
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if let Some(limit) = self.options.max_depth
            && self.depth > limit
        {
            log::debug!("Rejected nesting deeper than {limit}.");
            return Err(Error::DepthLimitExceeded(limit));
        }

        Ok(())
    }

    /// Consumes the end marker of a list or dictionary if it is next.
    fn try_end(&mut self) -> Result<bool> {
        match self.reader.peek_byte()? {
            Some(b'e') => {
                self.reader.next_byte()?;
                Ok(true)
            },
            Some(_) => Ok(false),
            None => Err(Error::UnterminatedContainer),
        }
    }
}

impl<'a> Decoder<SliceRead<'a>> {
    /// Creates a new decoder that reads values from a slice.
    ///
    /// This is useful over [`from_slice`] when you want the remainder of the
    /// slice or want to decode a sequence of values manually.
    ///
    /// # Examples
    ///
    /// Decode all values concatenated in a slice:
    ///
    /// ```
    /// # use serde_bencode::{Decoder, Error};
    /// # fn example() -> Result<Vec<i64>, Error> {
    /// # let buf = b"i1ei2ei3e";
    /// let mut out = Vec::new();
    /// let mut decoder = Decoder::from_slice(buf);
    /// while !decoder.remainder().is_empty() {
    ///     out.push(decoder.decode()?);
    /// }
    /// # Ok(out)
    /// # }
    /// # assert_eq!(example().expect("must succeed"), vec![1, 2, 3], "all values must be decoded");
    /// ```
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self::new(SliceRead::new(buf))
    }

    /// Gets the remaining unread part of the slice.
    pub fn remainder(&self) -> &'a [u8] {
        self.reader.slice
    }
}

impl<R: io::Read> Decoder<IoRead<R>> {
    /// Creates a new decoder that reads values from a [`io::Read`].
    ///
    /// If you're working with a byte slice, it is more efficient to use
    /// [`Self::from_slice`].
    pub fn from_reader(reader: R) -> Self {
        Self::new(IoRead::new(reader))
    }

    /// Unwraps the decoder into its inner reader.
    ///
    /// The decoder may hold one byte of lookahead past the last decoded value
    /// after a failed decode. It is lost when unwrapping.
    pub fn into_reader(self) -> R {
        self.reader.inner
    }

    /// Gets a reference to the inner reader.
    pub fn as_reader(&mut self) -> &mut R {
        &mut self.reader.inner
    }
}

/// Iterator over the values of a [`Decoder`].
///
/// Created by [`Decoder::values`].
#[derive(Debug)]
pub struct Values<'a, R> {
    decoder: &'a mut Decoder<R>,
    done: bool,
}

impl<R: Read> Iterator for Values<'_, R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.decoder.decode_value() {
            Ok(value) => Some(Ok(value)),
            Err(Error::Eof) => {
                self.done = true;
                None
            },
            Err(err) => {
                self.done = true;
                Some(Err(err))
            },
        }
    }
}

impl<R: Read> std::iter::FusedIterator for Values<'_, R> {}
