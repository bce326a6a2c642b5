use failure::Error;

use crate::{
    encoding::{AsciiCodec, BinaryBeCodec, BinaryLeCodec, FormatCodec},
    parse::{Buffer, ParseBuf},
    value::{Element, Property},
};
use super::{ElementDef, PropertyDef, PropertyType, ScalarType};


fn encode_prop(codec: &impl FormatCodec, def: &PropertyDef, v: &Property) -> Result<Vec<u8>, crate::Error> {
    let mut out = Vec::new();
    def.encode(codec, &mut out, "test", v)?;
    Ok(out)
}

fn assert_mismatch<T: std::fmt::Debug>(res: Result<T, crate::Error>) {
    match res {
        Err(crate::Error::SchemaMismatch { .. }) => {}
        other => panic!("expected SchemaMismatch, got {:?}", other),
    }
}

fn vertex_def() -> Result<ElementDef, crate::Error> {
    ElementDef::new("vertex")
        .with_property(PropertyDef::scalar("x", ScalarType::Float))?
        .with_property(PropertyDef::scalar("y", ScalarType::Float))?
        .with_property(PropertyDef::list("idx", ScalarType::UChar, ScalarType::UShort))
}


// ===========================================================================
// ===== Scalar types
// ===========================================================================

#[test]
fn scalar_type_names() -> Result<(), Error> {
    let names = ["char", "uchar", "short", "ushort", "int", "uint", "float", "double"];
    for (&ty, &name) in ScalarType::ALL.iter().zip(&names) {
        assert_eq!(ty.ply_type_name(), name);
        assert_eq!(ty.to_string(), name);
        assert_eq!(name.parse::<ScalarType>()?, ty);
    }

    Ok(())
}

#[test]
fn scalar_type_attributes() {
    let signed = ScalarType::ALL.iter().filter(|ty| ty.is_signed()).count();
    assert_eq!(signed, 5);

    assert!(ScalarType::Float.is_signed());
    assert!(!ScalarType::UInt.is_signed());
    assert!(ScalarType::Short.is_signed_integer());
    assert!(ScalarType::UChar.is_unsigned_integer());
    assert!(ScalarType::Double.is_floating_point());
    assert!(!ScalarType::Double.is_integer());
    assert_eq!(ScalarType::Double.len(), 8);
}

#[test]
fn unknown_scalar_type() {
    for &name in &["quux", "int32", "Float", ""] {
        match name.parse::<ScalarType>() {
            Err(crate::Error::UnknownType(found)) => assert_eq!(found, name),
            other => panic!("expected UnknownType for {:?}, got {:?}", name, other),
        }
    }
}


// ===========================================================================
// ===== Definitions
// ===========================================================================

#[test]
fn header_lines() -> Result<(), Error> {
    assert_eq!(
        PropertyDef::scalar("red", ScalarType::UChar).header_line(),
        "property uchar red\n",
    );
    assert_eq!(
        PropertyDef::list("vertex_indices", ScalarType::UChar, ScalarType::Int).header_line(),
        "property list uchar int vertex_indices\n",
    );
    assert_eq!(
        vertex_def()?.header_lines(3),
        "element vertex 3\n\
            property float x\n\
            property float y\n\
            property list uchar ushort idx\n",
    );

    Ok(())
}

#[test]
fn add_property_checks() -> Result<(), Error> {
    let mut def = vertex_def()?;
    assert_mismatch(def.add_property(PropertyDef::scalar("x", ScalarType::Double)));
    assert_mismatch(def.add_property(PropertyDef::list("l", ScalarType::Float, ScalarType::Int)));
    assert_mismatch(def.add_property(PropertyDef::list("l", ScalarType::Int, ScalarType::Double)));
    assert_eq!(def.property_defs.len(), 3);

    // The same checks for a definition built by hand
    def.property_defs.push(PropertyDef::scalar("y", ScalarType::Int));
    assert_mismatch(def.validate());

    Ok(())
}

#[test]
fn property_type_accessors() {
    let ty = PropertyType::List { len_type: ScalarType::UChar, scalar_type: ScalarType::Int };
    assert!(ty.is_list());
    assert_eq!(ty.len_type(), Some(ScalarType::UChar));
    assert_eq!(ty.scalar_type(), ScalarType::Int);

    let ty = PropertyType::Scalar(ScalarType::Float);
    assert!(!ty.is_list());
    assert_eq!(ty.len_type(), None);
}

#[test]
fn check_element() -> Result<(), Error> {
    let def = vertex_def()?;
    let good = Element::new()
        .with("x", 1.0f32)
        .with("y", 2.0f32)
        .with("idx", vec![1u16, 2, 3]);
    def.check_element(&good)?;

    // Missing property
    let missing = Element::new().with("x", 1.0f32).with("idx", vec![1u16]);
    assert_mismatch(def.check_element(&missing));

    // Undeclared property
    let extra = good.clone().with("z", 3.0f32);
    assert_mismatch(def.check_element(&extra));

    // Wrong scalar type
    let wrong = good.clone().with("x", 1.0f64);
    assert_mismatch(def.check_element(&wrong));

    // Scalar instead of list
    let wrong = good.clone().with("idx", 3u16);
    assert_mismatch(def.check_element(&wrong));

    Ok(())
}


// ===========================================================================
// ===== Encoding and decoding
// ===========================================================================

#[test]
fn list_length_prefix_binary() -> Result<(), Error> {
    let def = PropertyDef::list("vertex_indices", ScalarType::UChar, ScalarType::Int);
    let value = Property::from(vec![1i32, 2, 3, 4]);

    let le = encode_prop(&BinaryLeCodec::new(), &def, &value)?;
    assert_eq!(le.len(), 1 + 4 * 4);
    assert_eq!(le[0], 4);
    assert_eq!(&le[1..5], &[1, 0, 0, 0]);

    let be = encode_prop(&BinaryBeCodec::new(), &def, &value)?;
    assert_eq!(be[0], 4);
    assert_eq!(&be[13..], &[0, 0, 0, 4]);

    // Decoding consumes exactly the list, nothing after it.
    let mut data = le.clone();
    data.push(0xAA);
    let mut buf = Buffer::new(&data[..]);
    assert_eq!(def.decode(&BinaryLeCodec::new(), &mut buf, "face")?, value);
    assert_eq!(buf.offset(), le.len());
    assert_eq!(buf.peek()?, Some(0xAA));

    Ok(())
}

#[test]
fn list_length_prefix_ascii() -> Result<(), Error> {
    let def = PropertyDef::list("vertex_indices", ScalarType::UChar, ScalarType::Int);
    let value = Property::from(vec![10i32, -20, 30, 40]);

    assert_eq!(encode_prop(&AsciiCodec, &def, &value)?, b"4 10 -20 30 40");

    let mut buf = Buffer::new(&b"4  10 -20\t30 40 99"[..]);
    assert_eq!(def.decode(&AsciiCodec, &mut buf, "face")?, value);
    assert_eq!(buf.peek()?, Some(b' '));

    Ok(())
}

#[test]
fn empty_list() -> Result<(), Error> {
    let def = PropertyDef::list("l", ScalarType::UInt, ScalarType::UChar);
    let value = Property::from(Vec::<u8>::new());

    let le = encode_prop(&BinaryLeCodec::new(), &def, &value)?;
    assert_eq!(le, [0, 0, 0, 0]);
    assert_eq!(encode_prop(&AsciiCodec, &def, &value)?, b"0");

    let mut buf = Buffer::new(&le[..]);
    assert_eq!(def.decode(&BinaryLeCodec::new(), &mut buf, "e")?, value);

    Ok(())
}

#[test]
fn list_too_long_for_len_type() {
    let def = PropertyDef::list("l", ScalarType::UChar, ScalarType::Char);
    let value = Property::from(vec![0i8; 256]);
    assert_mismatch(encode_prop(&BinaryLeCodec::new(), &def, &value));
}

#[test]
fn negative_list_length() {
    let def = PropertyDef::list("l", ScalarType::Char, ScalarType::Int);
    let mut buf = Buffer::new(&b"-1 5"[..]);
    match def.decode(&AsciiCodec, &mut buf, "e") {
        Err(crate::Error::MalformedScalar { span, .. }) => assert_eq!((span.lo, span.hi), (0, 2)),
        other => panic!("expected MalformedScalar, got {:?}", other),
    }
}

#[test]
fn truncated_list() {
    let def = PropertyDef::list("l", ScalarType::UChar, ScalarType::Short);
    let mut buf = Buffer::new(&[3u8, 1, 0, 2, 0][..]);
    match def.decode(&BinaryLeCodec::new(), &mut buf, "e") {
        Err(e) => assert!(e.is_body_error(), "unexpected error {:?}", e),
        Ok(v) => panic!("decoded {:?} from truncated data", v),
    }
}

#[test]
fn element_record_ascii() -> Result<(), Error> {
    let def = vertex_def()?;
    let elem = Element::new()
        .with("idx", vec![7u16, 8])
        .with("y", -0.5f32)
        .with("x", 1.25f32);

    let mut out = Vec::new();
    def.encode_element(&AsciiCodec, &mut out, &elem)?;
    assert_eq!(out, b"1.25 -0.5 2 7 8\n");

    let mut buf = Buffer::new(&b"1.25   -0.5 2 7 8  \r\n"[..]);
    assert_eq!(def.decode_element(&AsciiCodec, &mut buf)?, elem);
    assert!(buf.is_eof()?);

    Ok(())
}

#[test]
fn element_record_binary() -> Result<(), Error> {
    let def = vertex_def()?;
    let elem = Element::new()
        .with("x", 0.0f32)
        .with("y", 1.0f32)
        .with("idx", vec![0x0102u16]);

    let mut out = Vec::new();
    def.encode_element(&BinaryBeCodec::new(), &mut out, &elem)?;
    assert_eq!(out, [0, 0, 0, 0, 0x3F, 0x80, 0, 0, 1, 1, 2]);

    let mut buf = Buffer::new(&out[..]);
    assert_eq!(def.decode_element(&BinaryBeCodec::new(), &mut buf)?, elem);
    assert!(buf.is_eof()?);

    Ok(())
}

#[test]
fn element_record_missing_property() -> Result<(), Error> {
    let def = ElementDef::new("e").with_property(PropertyDef::scalar("a", ScalarType::Int))?;

    let mut out = Vec::new();
    let res = def.encode_element(&AsciiCodec, &mut out, &Element::new().with("b", 1i32));
    assert_mismatch(res);

    Ok(())
}
