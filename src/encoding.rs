//! The three body encodings of PLY files and the codecs implementing them.
//!
//! The header of a PLY file is always ASCII text. The body that follows it
//! is encoded in exactly one of three ways, declared in the `format` line.
//! All format specific behavior lives in the [`FormatCodec`]
//! implementations in this module: schema code only ever talks to the trait.
//!
//! # Random notes on the format
//!
//! - For ASCII encoding we simply use the `fmt::Display` impl of all types.
//!   For floats, this yields the shortest representation that parses back to
//!   the identical value, so ASCII files round trip exactly.
//! - ASCII body values are separated by a single space and every element
//!   ends with `'\n'`. When reading, any run of spaces and tabs is accepted
//!   as separator and `"\r\n"` line endings are fine, too.

use std::{
    fmt,
    io::Write,
    marker::PhantomData,
    str::FromStr,
};

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use crate::{
    Error,
    parse::{ParseBuf, Span, is_blank, debug_fmt_bytes},
    schema::ScalarType,
    value::Scalar,
};


#[cfg(test)]
mod tests;


/// The encoding of the body of a PLY file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl Encoding {
    /// Returns the binary encoding with the endianness of the target
    /// platform.
    pub fn binary_native() -> Self {
        #[cfg(target_endian = "big")]
        { Encoding::BinaryBigEndian }

        #[cfg(target_endian = "little")]
        { Encoding::BinaryLittleEndian }
    }

    /// Returns the name used for this encoding in the `format` header line.
    pub fn header_name(&self) -> &'static str {
        match self {
            Encoding::Ascii => "ascii",
            Encoding::BinaryLittleEndian => "binary_little_endian",
            Encoding::BinaryBigEndian => "binary_big_endian",
        }
    }

    /// Parses the name used in the `format` header line.
    pub fn from_header_name(name: &str) -> Option<Self> {
        match name {
            "ascii" => Some(Encoding::Ascii),
            "binary_little_endian" => Some(Encoding::BinaryLittleEndian),
            "binary_big_endian" => Some(Encoding::BinaryBigEndian),
            _ => None,
        }
    }

    /// Returns `true` for both binary encodings.
    ///
    /// The header is always text. For binary encodings, the body is raw bytes
    /// following the header in the same stream, so sinks and sources must not
    /// perform any newline translation.
    pub fn is_binary(&self) -> bool {
        *self != Encoding::Ascii
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.header_name())
    }
}

/// Calls `$body` with `$codec` bound to the codec for `$encoding`.
///
/// This is the only place where an `Encoding` value is turned into a codec
/// type.
macro_rules! with_codec {
    ($encoding:expr, |$codec:ident| $body:expr) => {
        match $encoding {
            $crate::encoding::Encoding::Ascii => {
                let $codec = &$crate::encoding::AsciiCodec;
                $body
            }
            $crate::encoding::Encoding::BinaryLittleEndian => {
                let $codec = &$crate::encoding::BinaryLeCodec::new();
                $body
            }
            $crate::encoding::Encoding::BinaryBigEndian => {
                let $codec = &$crate::encoding::BinaryBeCodec::new();
                $body
            }
        }
    };
}


// ===========================================================================
// ===== The codec trait
// ===========================================================================

/// Encodes and decodes scalar values in one specific body encoding.
///
/// Codecs are stateless. Writing goes to any `io::Write`, reading comes from
/// a [`ParseBuf`]. Both directions must agree exactly: whatever
/// `encode_scalar` writes, `decode_scalar` reads back, consuming exactly the
/// written bytes.
pub(crate) trait FormatCodec {
    /// The encoding this codec implements.
    const ENCODING: Encoding;

    /// Written between two values of one element.
    const SEPARATOR: &'static [u8];

    /// Written after the last value of one element.
    const TERMINATOR: &'static [u8];

    /// Writes a single scalar value.
    fn encode_scalar(&self, w: &mut impl Write, v: Scalar) -> Result<(), Error>;

    fn read_i8(&self, buf: &mut impl ParseBuf) -> Result<i8, Error>;
    fn read_u8(&self, buf: &mut impl ParseBuf) -> Result<u8, Error>;
    fn read_i16(&self, buf: &mut impl ParseBuf) -> Result<i16, Error>;
    fn read_u16(&self, buf: &mut impl ParseBuf) -> Result<u16, Error>;
    fn read_i32(&self, buf: &mut impl ParseBuf) -> Result<i32, Error>;
    fn read_u32(&self, buf: &mut impl ParseBuf) -> Result<u32, Error>;
    fn read_f32(&self, buf: &mut impl ParseBuf) -> Result<f32, Error>;
    fn read_f64(&self, buf: &mut impl ParseBuf) -> Result<f64, Error>;

    /// Reads a single value of type `ty`.
    fn decode_scalar(&self, buf: &mut impl ParseBuf, ty: ScalarType) -> Result<Scalar, Error> {
        let v = match ty {
            ScalarType::Char => Scalar::Char(self.read_i8(buf)?),
            ScalarType::UChar => Scalar::UChar(self.read_u8(buf)?),
            ScalarType::Short => Scalar::Short(self.read_i16(buf)?),
            ScalarType::UShort => Scalar::UShort(self.read_u16(buf)?),
            ScalarType::Int => Scalar::Int(self.read_i32(buf)?),
            ScalarType::UInt => Scalar::UInt(self.read_u32(buf)?),
            ScalarType::Float => Scalar::Float(self.read_f32(buf)?),
            ScalarType::Double => Scalar::Double(self.read_f64(buf)?),
        };

        Ok(v)
    }

    fn write_separator(&self, w: &mut impl Write) -> Result<(), Error> {
        w.write_all(Self::SEPARATOR)?;
        Ok(())
    }

    fn write_terminator(&self, w: &mut impl Write) -> Result<(), Error> {
        w.write_all(Self::TERMINATOR)?;
        Ok(())
    }

    /// Skips a separator between two values. Only relevant for ASCII,
    /// therefore this empty implementation is provided.
    fn skip_separator(&self, _buf: &mut impl ParseBuf) -> Result<(), Error> {
        Ok(())
    }

    /// Finishes reading one element. Only relevant for ASCII (where a
    /// linebreak needs to be skipped), therefore this empty implementation is
    /// provided.
    fn finish_record(&self, _buf: &mut impl ParseBuf) -> Result<(), Error> {
        Ok(())
    }
}


// ===========================================================================
// ===== ASCII
// ===========================================================================

#[derive(Debug, Clone, Copy)]
pub(crate) struct AsciiCodec;

/// Reads the next whitespace delimited token and parses it as `T`.
fn ascii_value<T>(buf: &mut impl ParseBuf, ty: ScalarType) -> Result<T, Error>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    buf.skip_until(|b| !is_blank(b))?;

    match buf.peek()? {
        None => {
            return Err(Error::TruncatedInput {
                offset: buf.offset(),
                msg: format!("expected '{}' value", ty),
            });
        }
        Some(b'\n') => {
            return Err(Error::MalformedScalar {
                msg: format!("expected '{}' value, found end of line", ty),
                span: Span::single(buf.offset()),
            });
        }
        Some(_) => {}
    }

    let start = buf.offset();
    buf.take_until(|b| is_blank(b) || b == b'\n', |sd| {
        let invalid = |details: String| Error::MalformedScalar {
            msg: format!("invalid '{}' literal {}: {}", ty, debug_fmt_bytes(sd.data), details),
            span: sd.span,
        };

        std::str::from_utf8(sd.data)
            .map_err(|e| invalid(e.to_string()))?
            .parse::<T>()
            .map_err(|e| invalid(e.to_string()))
    }).map_err(|e| e.map_too_long(|| Error::MalformedScalar {
        msg: format!("'{}' literal too long", ty),
        span: Span::single(start),
    }))
}

impl FormatCodec for AsciiCodec {
    const ENCODING: Encoding = Encoding::Ascii;
    const SEPARATOR: &'static [u8] = b" ";
    const TERMINATOR: &'static [u8] = b"\n";

    fn encode_scalar(&self, w: &mut impl Write, v: Scalar) -> Result<(), Error> {
        match v {
            Scalar::Char(v) => write!(w, "{}", v)?,
            Scalar::UChar(v) => write!(w, "{}", v)?,
            Scalar::Short(v) => write!(w, "{}", v)?,
            Scalar::UShort(v) => write!(w, "{}", v)?,
            Scalar::Int(v) => write!(w, "{}", v)?,
            Scalar::UInt(v) => write!(w, "{}", v)?,
            Scalar::Float(v) => write!(w, "{}", v)?,
            Scalar::Double(v) => write!(w, "{}", v)?,
        }

        Ok(())
    }

    fn read_i8(&self, buf: &mut impl ParseBuf) -> Result<i8, Error> {
        ascii_value(buf, ScalarType::Char)
    }
    fn read_u8(&self, buf: &mut impl ParseBuf) -> Result<u8, Error> {
        ascii_value(buf, ScalarType::UChar)
    }
    fn read_i16(&self, buf: &mut impl ParseBuf) -> Result<i16, Error> {
        ascii_value(buf, ScalarType::Short)
    }
    fn read_u16(&self, buf: &mut impl ParseBuf) -> Result<u16, Error> {
        ascii_value(buf, ScalarType::UShort)
    }
    fn read_i32(&self, buf: &mut impl ParseBuf) -> Result<i32, Error> {
        ascii_value(buf, ScalarType::Int)
    }
    fn read_u32(&self, buf: &mut impl ParseBuf) -> Result<u32, Error> {
        ascii_value(buf, ScalarType::UInt)
    }
    fn read_f32(&self, buf: &mut impl ParseBuf) -> Result<f32, Error> {
        ascii_value(buf, ScalarType::Float)
    }
    fn read_f64(&self, buf: &mut impl ParseBuf) -> Result<f64, Error> {
        ascii_value(buf, ScalarType::Double)
    }

    /// Two values on the same line must be separated by at least one space
    /// or tab. The whitespace itself is skipped when reading the next value.
    fn skip_separator(&self, buf: &mut impl ParseBuf) -> Result<(), Error> {
        match buf.peek()? {
            Some(b) if is_blank(b) => Ok(()),
            None => Err(Error::TruncatedInput {
                offset: buf.offset(),
                msg: "expected more values".into(),
            }),
            Some(b'\n') => Err(Error::MalformedScalar {
                msg: "line ended before all values of the element were read".into(),
                span: Span::single(buf.offset()),
            }),
            Some(_) => Err(Error::MalformedScalar {
                msg: "expected whitespace between two values".into(),
                span: Span::single(buf.offset()),
            }),
        }
    }

    /// Skips trailing whitespace and the linebreak ending the element. The
    /// end of input is accepted instead of the linebreak.
    fn finish_record(&self, buf: &mut impl ParseBuf) -> Result<(), Error> {
        buf.skip_until(|b| !is_blank(b))?;

        match buf.peek()? {
            Some(b'\n') => {
                buf.consume(1);
                Ok(())
            }
            None => Ok(()),
            Some(_) => Err(Error::MalformedScalar {
                msg: "expected end of line, found additional values".into(),
                span: Span::single(buf.offset()),
            }),
        }
    }
}


// ===========================================================================
// ===== Binary
// ===========================================================================

/// Binary codec with byte order `B`. Every scalar occupies exactly
/// `ScalarType::len()` bytes, there are no separators or terminators.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BinaryCodec<B: ByteOrder>(PhantomData<B>);

pub(crate) type BinaryLeCodec = BinaryCodec<LittleEndian>;
pub(crate) type BinaryBeCodec = BinaryCodec<BigEndian>;

impl<B: ByteOrder> BinaryCodec<B> {
    pub(crate) fn new() -> Self {
        BinaryCodec(PhantomData)
    }
}

/// The `Encoding` that corresponds to the byte order `B`.
pub(crate) trait ByteOrderEncoding: ByteOrder {
    const ENCODING: Encoding;
}

impl ByteOrderEncoding for LittleEndian {
    const ENCODING: Encoding = Encoding::BinaryLittleEndian;
}

impl ByteOrderEncoding for BigEndian {
    const ENCODING: Encoding = Encoding::BinaryBigEndian;
}

impl<B: ByteOrderEncoding> FormatCodec for BinaryCodec<B> {
    const ENCODING: Encoding = B::ENCODING;
    const SEPARATOR: &'static [u8] = b"";
    const TERMINATOR: &'static [u8] = b"";

    fn encode_scalar(&self, w: &mut impl Write, v: Scalar) -> Result<(), Error> {
        match v {
            Scalar::Char(v) => w.write_i8(v)?,
            Scalar::UChar(v) => w.write_u8(v)?,
            Scalar::Short(v) => w.write_i16::<B>(v)?,
            Scalar::UShort(v) => w.write_u16::<B>(v)?,
            Scalar::Int(v) => w.write_i32::<B>(v)?,
            Scalar::UInt(v) => w.write_u32::<B>(v)?,
            Scalar::Float(v) => w.write_f32::<B>(v)?,
            Scalar::Double(v) => w.write_f64::<B>(v)?,
        }

        Ok(())
    }

    fn read_i8(&self, buf: &mut impl ParseBuf) -> Result<i8, Error> {
        buf.with_bytes(1, |b| b[0] as i8)
    }
    fn read_u8(&self, buf: &mut impl ParseBuf) -> Result<u8, Error> {
        buf.with_bytes(1, |b| b[0])
    }
    fn read_i16(&self, buf: &mut impl ParseBuf) -> Result<i16, Error> {
        buf.with_bytes(2, B::read_i16)
    }
    fn read_u16(&self, buf: &mut impl ParseBuf) -> Result<u16, Error> {
        buf.with_bytes(2, B::read_u16)
    }
    fn read_i32(&self, buf: &mut impl ParseBuf) -> Result<i32, Error> {
        buf.with_bytes(4, B::read_i32)
    }
    fn read_u32(&self, buf: &mut impl ParseBuf) -> Result<u32, Error> {
        buf.with_bytes(4, B::read_u32)
    }
    fn read_f32(&self, buf: &mut impl ParseBuf) -> Result<f32, Error> {
        buf.with_bytes(4, B::read_f32)
    }
    fn read_f64(&self, buf: &mut impl ParseBuf) -> Result<f64, Error> {
        buf.with_bytes(8, B::read_f64)
    }
}
