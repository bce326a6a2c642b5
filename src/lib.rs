//! Reading and writing PLY files.
//!
//! PLY (the Polygon File Format) stores a list of element groups, like
//! vertices and faces, each with a fixed set of typed properties. A file
//! starts with an ASCII header declaring the groups and their properties,
//! followed by a body in ASCII or in binary (little or big endian).
//!
//! The main type is [`Document`]: all element definitions plus all element
//! instances. For more control over reading and writing, use [`Reader`] and
//! [`Config`]/[`Writer`].
//!
//! ```
//! use plymit::{Document, Element, ElementDef, Encoding, PropertyDef, ScalarType};
//!
//! let mut doc = Document::new();
//! doc.add_element_type(
//!     ElementDef::new("face")
//!         .with_property(PropertyDef::list("vertex_index", ScalarType::UChar, ScalarType::Int))?
//! )?;
//! doc.add_element("face", Element::new().with("vertex_index", vec![0i32, 1, 2]))?;
//!
//! let bytes = doc.to_bytes(Encoding::Ascii)?;
//! let text = String::from_utf8(bytes.clone()).unwrap();
//! assert!(text.starts_with("ply\nformat ascii 1.0\n"));
//! assert!(text.ends_with("end_header\n3 0 1 2\n"));
//!
//! assert_eq!(Document::read(&bytes[..])?, doc);
//! # Ok::<(), plymit::Error>(())
//! ```

#![deny(missing_debug_implementations)]


#[macro_use]
mod encoding;

mod document;
mod error;
mod header;
mod parse;
mod read;
mod schema;
mod value;
mod write;

pub use self::{
    document::Document,
    encoding::Encoding,
    error::Error,
    header::Header,
    parse::Span,
    read::{PartialRead, RawSink, Reader},
    schema::{ElementDef, PropertyDef, PropertyType, ScalarType},
    value::{Element, Property, Scalar},
    write::{Config, Writer},
};
