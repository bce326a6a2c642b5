use std::{
    cmp::{max, min},
    fmt,
    io::{self, Read},
};

use crate::Error;
use super::ParseBuf;


/// The initial size of the buffer in bytes.
const START_BUFFER_SIZE: usize = 8 * 1024;

/// The maximum size the internal buffer can grow to.
///
/// Parsers only ever look at one small piece of information at a time (a
/// header token, an ASCII number, one binary scalar). A parser requesting
/// more than this is fed a degenerate file, e.g. a single multi megabyte
/// "token" without any whitespace.
pub(crate) const MAX_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// The payload of the `io::Error` returned when a parser requests more than
/// `MAX_BUFFER_SIZE` bytes at once. See [`Error::map_too_long`].
#[derive(Debug)]
pub(crate) struct LookaheadExceeded;

impl fmt::Display for LookaheadExceeded {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "parser lookahead would exceed {} bytes (degenerate input)", MAX_BUFFER_SIZE)
    }
}

impl std::error::Error for LookaheadExceeded {}


/// A growable read-ahead buffer around an `io::Read` that implements
/// [`ParseBuf`].
///
/// Data is pulled from the reader lazily, only when a parser asks for more
/// bytes than are currently buffered.
pub(crate) struct Buffer<R: Read> {
    reader: R,

    buf: Vec<u8>,

    /// Points to the first byte in `buf` that is real data. Invariants:
    /// - `0 <= start <= end`
    start: usize,

    /// Points to the byte after the last byte of real data. Invariants:
    /// - `end <= buf.len()`
    end: usize,

    consumed_total: usize,
}

impl<R: Read> fmt::Debug for Buffer<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Buffer {{ consumed_total: {}, .. }}", self.consumed_total)
    }
}

impl<R: Read> Buffer<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            buf: vec![0; START_BUFFER_SIZE],
            reader,
            start: 0,
            end: 0,
            consumed_total: 0,
        }
    }

    fn len(&self) -> usize {
        self.end - self.start
    }

    fn cap(&self) -> usize {
        self.buf.len()
    }

    /// Makes sure there is space for at least `additional` more bytes after
    /// `self.end`, by moving the data to the front or by growing the buffer.
    #[inline(never)]
    fn grow_buf(&mut self, additional: usize) -> Result<(), Error> {
        let space_after = self.cap() - self.end;
        let space_before = self.start;

        if space_after >= additional {
            return Ok(());
        }

        // Moving is only worth it if the data is small compared to the
        // buffer. Otherwise alternating small and large requests would copy
        // the same data again and again.
        if space_after + space_before >= additional && self.len() < self.cap() / 2 {
            self.buf.copy_within(self.start..self.end, 0);
        } else {
            if self.len() + additional > MAX_BUFFER_SIZE {
                return Err(io::Error::new(io::ErrorKind::InvalidData, LookaheadExceeded).into());
            }

            // At least twice the current size to keep reallocations rare.
            let new_len = min(
                max(self.len() + additional, self.cap() * 2),
                MAX_BUFFER_SIZE,
            );

            let mut new = Vec::with_capacity(new_len);
            new.extend_from_slice(self.raw_buf());
            new.resize(new_len, 0);
            self.buf = new;
        }

        // In both cases, the data starts at the very beginning now.
        self.end -= self.start;
        self.start = 0;

        Ok(())
    }

    /// Reads until `additional` new bytes are buffered or the reader is
    /// exhausted. Returns the number of bytes read.
    #[inline(never)]
    fn fill_buf_by(&mut self, additional: usize) -> Result<usize, Error> {
        self.grow_buf(additional)?;

        let mut bytes_read = 0;
        while bytes_read < additional {
            match self.reader.read(&mut self.buf[self.end + bytes_read..]) {
                // `grow_buf` made sure the slice is not empty, so the reader
                // is exhausted.
                Ok(0) => break,
                Ok(n) => bytes_read += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.end += bytes_read;
        Ok(bytes_read)
    }
}

impl<R: Read> ParseBuf for Buffer<R> {
    fn prepare(&mut self, num_bytes: usize) -> Result<(), Error> {
        #[cold]
        #[inline(never)]
        fn fill(this: &mut Buffer<impl Read>, diff: usize) -> Result<(), Error> {
            let bytes_read = this.fill_buf_by(diff)?;

            if bytes_read < diff {
                return Err(Error::TruncatedInput {
                    offset: this.offset() + this.len(),
                    msg: format!("expected {} more byte(s)", diff - bytes_read),
                });
            }

            Ok(())
        }

        if self.len() < num_bytes {
            return fill(self, num_bytes - self.len());
        }

        Ok(())
    }

    fn saturating_prepare(&mut self, num_bytes: usize) -> Result<(), Error> {
        if self.len() < num_bytes {
            let diff = num_bytes - self.len();
            self.fill_buf_by(diff)?;
        }

        Ok(())
    }

    fn consume(&mut self, num_bytes: usize) {
        assert!(self.start + num_bytes <= self.end);

        self.start += num_bytes;
        self.consumed_total += num_bytes;

        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
    }

    fn is_eof(&mut self) -> Result<bool, Error> {
        self.saturating_prepare(1)?;
        Ok(self.len() == 0)
    }

    fn offset(&self) -> usize {
        self.consumed_total
    }

    fn raw_buf(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }
}
