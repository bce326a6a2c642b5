use failure::Error;

use crate::{
    parse::{Buffer, ParseBuf},
    schema::ScalarType,
    value::Scalar,
};
use super::{AsciiCodec, BinaryBeCodec, BinaryLeCodec, Encoding, FormatCodec};


fn encode(codec: &impl FormatCodec, v: Scalar) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    codec.encode_scalar(&mut out, v)?;
    Ok(out)
}

/// Decodes one scalar and makes sure all input was consumed.
fn decode(codec: &impl FormatCodec, data: &[u8], ty: ScalarType) -> Result<Scalar, crate::Error> {
    let mut buf = Buffer::new(data);
    let v = codec.decode_scalar(&mut buf, ty)?;
    assert!(buf.is_eof()?, "not all input consumed");
    Ok(v)
}


// ===========================================================================
// ===== Encoding names
// ===========================================================================

#[test]
fn header_names() {
    for &encoding in &[Encoding::Ascii, Encoding::BinaryLittleEndian, Encoding::BinaryBigEndian] {
        assert_eq!(Encoding::from_header_name(encoding.header_name()), Some(encoding));
        assert_eq!(encoding.to_string(), encoding.header_name());
    }

    assert_eq!(format!("format {} 1.0", Encoding::BinaryBigEndian), "format binary_big_endian 1.0");
    assert_eq!(Encoding::from_header_name("binary"), None);
    assert_eq!(Encoding::from_header_name("ASCII"), None);
    assert!(!Encoding::Ascii.is_binary());
    assert!(Encoding::binary_native().is_binary());
}


// ===========================================================================
// ===== Binary
// ===========================================================================

macro_rules! binary_width_test {
    ($name:ident: $variant:ident($v:expr) => $len:expr) => {
        paste::item! {
            #[test]
            fn [<binary_width_ $name>]() -> Result<(), Error> {
                let v = Scalar::$variant($v);
                let le = encode(&BinaryLeCodec::new(), v)?;
                let be = encode(&BinaryBeCodec::new(), v)?;

                assert_eq!(ScalarType::$variant.len(), $len);
                assert_eq!(le.len(), $len);
                assert_eq!(be.len(), $len);

                let mut reversed = be.clone();
                reversed.reverse();
                assert_eq!(le, reversed);

                assert_eq!(decode(&BinaryLeCodec::new(), &le, ScalarType::$variant)?, v);
                assert_eq!(decode(&BinaryBeCodec::new(), &be, ScalarType::$variant)?, v);

                Ok(())
            }
        }
    };
}

binary_width_test!(char: Char(-100) => 1);
binary_width_test!(uchar: UChar(200) => 1);
binary_width_test!(short: Short(-12_345) => 2);
binary_width_test!(ushort: UShort(54_321) => 2);
binary_width_test!(int: Int(-1_234_567) => 4);
binary_width_test!(uint: UInt(3_000_000_000) => 4);
binary_width_test!(float: Float(-1.5e-3) => 4);
binary_width_test!(double: Double(6.02214076e23) => 8);

#[test]
fn binary_int_bytes() -> Result<(), Error> {
    assert_eq!(encode(&BinaryLeCodec::new(), Scalar::Int(-2))?, [0xFE, 0xFF, 0xFF, 0xFF]);
    assert_eq!(encode(&BinaryBeCodec::new(), Scalar::Int(-2))?, [0xFF, 0xFF, 0xFF, 0xFE]);
    assert_eq!(encode(&BinaryLeCodec::new(), Scalar::UShort(0x1234))?, [0x34, 0x12]);
    assert_eq!(encode(&BinaryBeCodec::new(), Scalar::UShort(0x1234))?, [0x12, 0x34]);

    Ok(())
}

#[test]
fn binary_float_bytes() -> Result<(), Error> {
    assert_eq!(encode(&BinaryLeCodec::new(), Scalar::Float(1.0))?, [0x00, 0x00, 0x80, 0x3F]);
    assert_eq!(encode(&BinaryBeCodec::new(), Scalar::Float(1.0))?, [0x3F, 0x80, 0x00, 0x00]);
    assert_eq!(
        encode(&BinaryBeCodec::new(), Scalar::Double(-2.0))?,
        [0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    );

    Ok(())
}

#[test]
fn binary_truncated() {
    let res = decode(&BinaryLeCodec::new(), &[1, 2, 3], ScalarType::Int);
    match res {
        Err(crate::Error::TruncatedInput { offset, .. }) => assert_eq!(offset, 3),
        other => panic!("expected TruncatedInput, got {:?}", other),
    }
}


// ===========================================================================
// ===== ASCII
// ===========================================================================

#[test]
fn ascii_encode() -> Result<(), Error> {
    assert_eq!(encode(&AsciiCodec, Scalar::Char(-5))?, b"-5");
    assert_eq!(encode(&AsciiCodec, Scalar::UInt(4_000_000_000))?, b"4000000000");
    assert_eq!(encode(&AsciiCodec, Scalar::Float(0.0))?, b"0");
    assert_eq!(encode(&AsciiCodec, Scalar::Float(0.1))?, b"0.1");
    assert_eq!(encode(&AsciiCodec, Scalar::Double(-2.5))?, b"-2.5");

    Ok(())
}

#[test]
fn ascii_float_round_trip() -> Result<(), Error> {
    for &v in &[0.1f32, 1.0 / 3.0, 123_456.79, -7.0e-20, std::f32::MAX] {
        let text = encode(&AsciiCodec, Scalar::Float(v))?;
        assert_eq!(decode(&AsciiCodec, &text, ScalarType::Float)?, Scalar::Float(v));
    }
    for &v in &[0.1f64, 1.0 / 3.0, -1.0e300, std::f64::MIN_POSITIVE] {
        let text = encode(&AsciiCodec, Scalar::Double(v))?;
        assert_eq!(decode(&AsciiCodec, &text, ScalarType::Double)?, Scalar::Double(v));
    }

    Ok(())
}

#[test]
fn ascii_decode() -> Result<(), Error> {
    assert_eq!(decode(&AsciiCodec, b"-128", ScalarType::Char)?, Scalar::Char(-128));
    assert_eq!(decode(&AsciiCodec, b"65535", ScalarType::UShort)?, Scalar::UShort(65535));
    assert_eq!(decode(&AsciiCodec, b"1e3", ScalarType::Float)?, Scalar::Float(1000.0));
    assert_eq!(decode(&AsciiCodec, b"7", ScalarType::Double)?, Scalar::Double(7.0));

    Ok(())
}

#[test]
fn ascii_decode_skips_leading_blanks() -> Result<(), Error> {
    let mut buf = Buffer::new(&b" \t 42\t9"[..]);
    assert_eq!(AsciiCodec.read_i32(&mut buf)?, 42);
    assert_eq!(buf.peek()?, Some(b'\t'));

    AsciiCodec.skip_separator(&mut buf)?;
    assert_eq!(AsciiCodec.read_u8(&mut buf)?, 9);
    assert!(buf.is_eof()?);

    Ok(())
}

#[test]
fn ascii_decode_errors() {
    let malformed = |data: &[u8], ty| match decode(&AsciiCodec, data, ty) {
        Err(e @ crate::Error::MalformedScalar { .. }) => assert!(e.is_body_error()),
        other => panic!("expected MalformedScalar for {:?}, got {:?}", data, other),
    };

    // Out of range
    malformed(b"256", ScalarType::UChar);
    malformed(b"-1", ScalarType::UInt);
    malformed(b"40000", ScalarType::Short);

    // Wrong kind of number
    malformed(b"1.5", ScalarType::Int);
    malformed(b"abc", ScalarType::Double);

    // No value on this line
    malformed(b"\n3", ScalarType::Int);

    match decode(&AsciiCodec, b"  ", ScalarType::Int) {
        Err(crate::Error::TruncatedInput { offset, .. }) => assert_eq!(offset, 2),
        other => panic!("expected TruncatedInput, got {:?}", other),
    }
}

#[test]
fn ascii_literal_too_long() {
    let mut data = b"  ".to_vec();
    data.resize(5 * 1024 * 1024, b'7');

    match decode(&AsciiCodec, &data, ScalarType::Int) {
        Err(crate::Error::MalformedScalar { span, .. }) => assert_eq!(span.lo, 2),
        other => panic!("expected MalformedScalar, got {:?}", other),
    }
}

#[test]
fn ascii_separator() -> Result<(), Error> {
    let mut buf = Buffer::new(&b"1 2\n3x"[..]);
    assert_eq!(AsciiCodec.read_i8(&mut buf)?, 1);
    AsciiCodec.skip_separator(&mut buf)?;
    assert_eq!(AsciiCodec.read_i8(&mut buf)?, 2);

    // The line ends too early.
    match AsciiCodec.skip_separator(&mut buf) {
        Err(crate::Error::MalformedScalar { span, .. }) => assert_eq!(span.lo, 3),
        other => panic!("expected MalformedScalar, got {:?}", other),
    }

    Ok(())
}

#[test]
fn ascii_finish_record() -> Result<(), Error> {
    // Trailing whitespace and a Windows linebreak
    let mut buf = Buffer::new(&b"  \t\r\nX"[..]);
    AsciiCodec.finish_record(&mut buf)?;
    assert_eq!(buf.peek()?, Some(b'X'));

    // End of input instead of a linebreak
    let mut buf = Buffer::new(&b"  "[..]);
    AsciiCodec.finish_record(&mut buf)?;
    assert!(buf.is_eof()?);

    // Too many values on one line
    let mut buf = Buffer::new(&b" 5\n"[..]);
    assert!(AsciiCodec.finish_record(&mut buf).is_err());

    Ok(())
}
