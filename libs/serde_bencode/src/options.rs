//! Configuration for the [`Decoder`](crate::Decoder).

/// Limits applied while parsing the byte stream.
///
/// The format itself bounds neither nesting depth nor string length, so the
/// default options don't either. Decoding untrusted input with the defaults
/// can exhaust the stack or memory; set limits where that matters.
///
/// # Examples
///
/// ```
/// # use serde_bencode::{Decoder, DecoderOptions, Error};
/// let options = DecoderOptions::new()
///     .with_max_depth(Some(1))
///     .with_reject_duplicate_keys(true);
///
/// let mut decoder = Decoder::from_slice(b"llee").with_options(options);
/// assert!(
///     matches!(decoder.decode_value(), Err(Error::DepthLimitExceeded(1))),
///     "nested list must exceed the limit"
/// );
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    pub(crate) max_depth: Option<usize>,
    pub(crate) max_string_len: Option<usize>,
    pub(crate) reject_duplicate_keys: bool,
}

impl DecoderOptions {
    /// Creates the default, fully permissive options.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: None,
            max_string_len: None,
            reject_duplicate_keys: false,
        }
    }

    /// Sets how many lists and dictionaries may be nested inside each other.
    ///
    /// A top-level list has a depth of 1. [`None`] means unbounded.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the largest string length, in bytes, that will be read.
    ///
    /// The declared length is checked before anything is allocated.
    /// [`None`] means unbounded.
    #[must_use]
    pub const fn with_max_string_len(mut self, max_string_len: Option<usize>) -> Self {
        self.max_string_len = max_string_len;
        self
    }

    /// Sets whether a repeated key within one dictionary is an error.
    ///
    /// When unset, the last occurrence of a key wins.
    #[must_use]
    pub const fn with_reject_duplicate_keys(mut self, reject: bool) -> Self {
        self.reject_duplicate_keys = reject;
        self
    }
}
