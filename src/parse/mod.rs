//! Low level parsing utilities: a byte buffer abstraction that parsers pull
//! data from and helpers built on top of it.

use std::fmt;

use crate::Error;


mod buf;


pub(crate) use self::buf::{Buffer, LookaheadExceeded};


/// A buffer of bytes that parsers can pull data from.
///
/// The buffer only holds a window of the input. Parsers request bytes via
/// [`prepare`][ParseBuf::prepare], inspect them via
/// [`raw_buf`][ParseBuf::raw_buf] and then remove them via
/// [`consume`][ParseBuf::consume].
pub(crate) trait ParseBuf {
    /// Makes sure that at least `num_bytes` bytes are available in
    /// `raw_buf()`. Returns `Error::TruncatedInput` if the input ends before
    /// that.
    fn prepare(&mut self, num_bytes: usize) -> Result<(), Error>;

    /// Like `prepare`, but reaching the end of the input is not an error. If
    /// the input ends early, fewer than `num_bytes` bytes are available
    /// afterwards.
    fn saturating_prepare(&mut self, num_bytes: usize) -> Result<(), Error>;

    /// Removes the first `num_bytes` bytes from the buffer. Panics if fewer
    /// than `num_bytes` bytes are prepared.
    fn consume(&mut self, num_bytes: usize);

    /// Returns `true` if all input has been consumed.
    fn is_eof(&mut self) -> Result<bool, Error>;

    /// The absolute byte offset of the first byte in `raw_buf()`.
    fn offset(&self) -> usize;

    /// All bytes that are currently prepared.
    fn raw_buf(&self) -> &[u8];


    /// Returns the next byte without consuming it or `None` on EOF.
    fn peek(&mut self) -> Result<Option<u8>, Error> {
        self.saturating_prepare(1)?;
        Ok(self.raw_buf().first().copied())
    }

    fn spanned_data(&self, num_bytes: usize) -> SpannedData<'_> {
        SpannedData {
            data: &self.raw_buf()[..num_bytes],
            span: Span::new(self.offset(), self.offset() + num_bytes),
        }
    }

    /// Prepares exactly `num_bytes` bytes, passes them to `func` and consumes
    /// them afterwards.
    fn with_bytes<F, O>(&mut self, num_bytes: usize, func: F) -> Result<O, Error>
    where
        F: FnOnce(&[u8]) -> O,
    {
        self.prepare(num_bytes)?;
        let out = func(&self.raw_buf()[..num_bytes]);
        self.consume(num_bytes);

        Ok(out)
    }

    /// Consumes bytes until `stopper` says stop or the input ends. The byte
    /// the stopper stopped at is not consumed.
    fn skip_until(&mut self, stopper: impl Stopper) -> Result<(), Error> {
        while let Some(b) = self.peek()? {
            if stopper.should_stop(b) {
                break;
            }
            self.consume(1);
        }

        Ok(())
    }

    /// Collects all bytes until `stopper` says stop or the input ends, passes
    /// them to `func` and consumes them. The stop byte is not consumed.
    fn take_until<F, O>(&mut self, stopper: impl Stopper, func: F) -> Result<O, Error>
    where
        F: FnOnce(SpannedData<'_>) -> Result<O, Error>,
    {
        let mut pos = 0;
        loop {
            if self.raw_buf().len() <= pos {
                self.saturating_prepare(pos + 1)?;
                if self.raw_buf().len() <= pos {
                    break;
                }
            }

            if stopper.should_stop(self.raw_buf()[pos]) {
                break;
            }

            pos += 1;
        }

        let out = func(self.spanned_data(pos))?;
        self.consume(pos);

        Ok(out)
    }
}

/// Some bytes of the input together with their position.
#[derive(Debug)]
pub(crate) struct SpannedData<'a> {
    pub(crate) data: &'a [u8],
    pub(crate) span: Span,
}

impl<'a> SpannedData<'a> {
    /// Interprets the data as string. Bytes that are not valid UTF-8 are
    /// replaced.
    pub(crate) fn as_str_lossy(&self) -> std::borrow::Cow<'a, str> {
        String::from_utf8_lossy(self.data)
    }
}

/// A range of absolute byte offsets into the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub lo: usize,
    pub hi: usize,
}

impl Span {
    pub fn new(lo: usize, hi: usize) -> Self {
        Self { lo, hi }
    }

    pub fn single(at: usize) -> Self {
        Self {
            lo: at,
            hi: at + 1,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}..{}", self.lo, self.hi)
    }
}

/// Formats bytes for error messages: as string if they are valid UTF-8, as
/// byte list otherwise.
pub(crate) fn debug_fmt_bytes(data: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(data) {
        format!("{:?}", s)
    } else {
        format!("{:?}", data)
    }
}

pub(crate) trait Stopper {
    fn should_stop(&self, byte: u8) -> bool;
}

impl Stopper for u8 {
    fn should_stop(&self, byte: u8) -> bool {
        byte == *self
    }
}

impl<F: Fn(u8) -> bool> Stopper for F {
    fn should_stop(&self, byte: u8) -> bool {
        self(byte)
    }
}

/// Spaces, tabs and carriage returns separate tokens. Line feeds are
/// significant in PLY files and are never treated as plain whitespace.
pub(crate) fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\r'
}
