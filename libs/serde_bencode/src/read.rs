//! Exposes a specialized reader trait.

use std::io;

use crate::error::{Error, Result};

/// Specialized reader trait for use with [`Decoder`](crate::Decoder).
///
/// The decoder dispatches on the first byte of every value before consuming
/// it, so readers need to support looking ahead by exactly one byte.
///
/// By default, this is implemented for [`SliceRead`], [`IoRead`] and mutable
/// references to [`Read`] implementations.
pub trait Read {
    /// Returns the next byte without consuming it.
    ///
    /// Returns [`None`] at the end of the input.
    fn peek_byte(&mut self) -> Result<Option<u8>>;

    /// Consumes and returns the next byte.
    ///
    /// Returns [`None`] at the end of the input.
    fn next_byte(&mut self) -> Result<Option<u8>>;

    /// Reads exactly `len` bytes, returning them as a newly allocated [`Vec`].
    ///
    /// If the input ends early, returns [`Error::TruncatedInput`].
    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>>;
}

// this implementation is required so the reader can be reborrowed
impl<R: Read> Read for &mut R {
    fn peek_byte(&mut self) -> Result<Option<u8>> {
        (**self).peek_byte()
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        (**self).next_byte()
    }

    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        (**self).read_byte_vec(len)
    }
}

/// Wraps a slice so it can be used as a [`Read`].
///
/// You cannot directly construct this type. Instead use
/// [`Decoder::from_slice`](crate::Decoder::from_slice).
#[derive(Debug)]
pub struct SliceRead<'a> {
    pub(crate) slice: &'a [u8],
}

impl<'a> SliceRead<'a> {
    pub(crate) fn new(slice: &'a [u8]) -> Self {
        Self { slice }
    }
}

impl Read for SliceRead<'_> {
    fn peek_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.slice.first().copied())
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let Some((&b, rem)) = self.slice.split_first() else {
            return Ok(None);
        };

        self.slice = rem;
        Ok(Some(b))
    }

    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let Some((out, rem)) = self.slice.split_at_checked(len) else {
            return Err(Error::TruncatedInput {
                missing: len - self.slice.len(),
            });
        };

        self.slice = rem;
        Ok(out.to_vec())
    }
}

/// Wraps a [`io::Read`] implementation so it can be used as a [`Read`].
///
/// The wrapper holds at most one byte of lookahead and never reads past the
/// end of the value being decoded, so the inner reader is positioned exactly
/// after it once decoding returns. Reads are issued one byte at a time; wrap
/// unbuffered sources like files or sockets in an [`io::BufReader`].
///
/// You cannot directly construct this type. Instead use
/// [`Decoder::from_reader`](crate::Decoder::from_reader).
#[derive(Debug)]
pub struct IoRead<R> {
    pub(crate) inner: R,
    peeked: Option<u8>,
}

impl<R> IoRead<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            peeked: None,
        }
    }
}

impl<R: io::Read> IoRead<R> {
    fn fill_peek(&mut self) -> Result<Option<u8>> {
        if self.peeked.is_none() {
            let mut buf = [0u8];
            self.peeked = loop {
                match self.inner.read(&mut buf) {
                    Ok(0) => break None,
                    Ok(_) => break Some(buf[0]),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
                    Err(e) => return Err(e.into()),
                }
            };
        }

        Ok(self.peeked)
    }
}

impl<R: io::Read> Read for IoRead<R> {
    fn peek_byte(&mut self) -> Result<Option<u8>> {
        self.fill_peek()
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        self.fill_peek()?;
        Ok(self.peeked.take())
    }

    #[inline(never)]
    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        use std::io::Read as _;

        // don't allocate too much or incorrect data could lead to a DoS
        let capacity = len.min(0x1000);
        let mut buf = Vec::with_capacity(capacity);

        if len != 0
            && let Some(b) = self.peeked.take()
        {
            buf.push(b);
        }

        let rest = len - buf.len();
        let limit = u64::try_from(rest).map_err(|_| Error::TruncatedInput { missing: rest })?;
        self.inner.by_ref().take(limit).read_to_end(&mut buf)?;

        if buf.len() == len {
            Ok(buf)
        } else {
            Err(Error::TruncatedInput {
                missing: len - buf.len(),
            })
        }
    }
}
