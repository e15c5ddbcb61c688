//! Error handling types.
//!
//! Decoding happens in two stages, but a caller only ever sees one of them
//! fail, so both stages share this error type. [`Error::is_structural`] tells
//! the two families apart.

use std::{fmt, io};

use serde_core::de;

use crate::value::Kind;

pub type Result<T> = std::result::Result<T, Error>;

/// Potential errors to encounter when decoding bencoded data.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Another reason provided by the [`de::Deserialize`] implementation.
    #[error("{0}")]
    Custom(String),
    /// The error originated from the [`io::Read`] implementation.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The input ended cleanly before the start of the next value.
    ///
    /// This is the expected way for a stream of values to end.
    #[error("end of input")]
    Eof,

    /// The first byte of a value is not a digit, `i`, `l`, or `d`.
    #[error("invalid lead byte {0:#04x} for a value")]
    InvalidLeadByte(u8),
    /// The length prefix of a string is not a decimal number followed by `:`.
    #[error("malformed string length prefix")]
    MalformedLength,
    /// The body of an integer is not a base-10 `i64` terminated by `e`.
    #[error("malformed integer")]
    MalformedInteger,
    /// The input ended before all bytes of a string could be read.
    #[error("input ended {missing} bytes short of the declared string length")]
    TruncatedInput {
        /// How many of the declared bytes were missing.
        missing: usize,
    },
    /// The input ended inside a list or dictionary.
    #[error("input ended before the end of a list or dictionary")]
    UnterminatedContainer,
    /// A dictionary key did not start like a string.
    #[error("dictionary keys must be strings")]
    NonStringKey,

    /// Containers were nested deeper than [`DecoderOptions::with_max_depth`].
    ///
    /// [`DecoderOptions::with_max_depth`]: crate::DecoderOptions::with_max_depth
    #[error("nesting exceeds the limit of {0}")]
    DepthLimitExceeded(usize),
    /// A string declared more bytes than [`DecoderOptions::with_max_string_len`].
    ///
    /// [`DecoderOptions::with_max_string_len`]: crate::DecoderOptions::with_max_string_len
    #[error("string length {len} exceeds the limit of {limit}")]
    StringTooLong {
        /// The declared length.
        len: usize,
        /// The configured limit.
        limit: usize,
    },
    /// A dictionary contained the same key twice while
    /// [`DecoderOptions::with_reject_duplicate_keys`] was set.
    ///
    /// [`DecoderOptions::with_reject_duplicate_keys`]: crate::DecoderOptions::with_reject_duplicate_keys
    #[error("duplicate dictionary key {0:?}")]
    DuplicateKey(String),

    /// The value's kind cannot be stored in the destination.
    #[error("cannot decode {found} into {expected}")]
    TypeMismatch {
        /// What the destination asked for.
        expected: &'static str,
        /// What the data held.
        found: Kind,
    },
    /// The integer does not fit into the destination's width.
    ///
    /// [`usize`] and [`isize`] destinations are requested as [`u64`] and
    /// [`i64`], so `target` names those. On targets where they are narrower,
    /// a value that fits 64 bits but not the pointer width is reported as
    /// [`Error::Custom`] by their [`de::Deserialize`] implementation instead.
    #[error("integer {value} overflows {target}")]
    IntegerOverflow {
        /// The decoded integer.
        value: i64,
        /// The destination type.
        target: &'static str,
    },
    /// A negative integer was decoded into an unsigned destination.
    ///
    /// As with [`Error::IntegerOverflow`], a [`usize`] destination is named
    /// `u64`.
    #[error("negative integer {value} cannot be stored in {target}")]
    NegativeToUnsigned {
        /// The decoded integer.
        value: i64,
        /// The destination type.
        target: &'static str,
    },
    /// The destination asked for a shape the format has no representation
    /// for, f.e. floats or booleans.
    #[error("{0} is not supported by this format")]
    UnsupportedShape(&'static str),
    /// The destination cannot hold a value at all.
    #[error("{0} cannot be used as a destination")]
    InvalidDestination(&'static str),
    /// A string destination received bytes that aren't valid UTF-8.
    #[error("invalid utf-8 in data for string")]
    InvalidUtf8,
}

impl Error {
    /// Whether this is the end-of-stream sentinel returned when no further
    /// value is available.
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Whether the error was raised while parsing the byte stream, as opposed
    /// to while filling the destination.
    ///
    /// After a structural error, the position of the underlying reader is
    /// unspecified.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Eof
                | Self::InvalidLeadByte(_)
                | Self::MalformedLength
                | Self::MalformedInteger
                | Self::TruncatedInput { .. }
                | Self::UnterminatedContainer
                | Self::NonStringKey
                | Self::DepthLimitExceeded(_)
                | Self::StringTooLong { .. }
                | Self::DuplicateKey(_)
        )
    }
}

impl de::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self::Custom(msg.to_string())
    }

    fn invalid_type(unexp: de::Unexpected<'_>, exp: &dyn de::Expected) -> Self {
        // kind-locked values name their kind as the expectation
        match (Kind::from_unexpected(&unexp), Kind::from_name(&exp.to_string())) {
            (Some(found), Some(expected)) => Self::TypeMismatch {
                expected: expected.name(),
                found,
            },
            _ => Self::custom(format_args!("invalid type: {unexp}, expected {exp}")),
        }
    }
}
