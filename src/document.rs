//! An in-memory PLY file: element definitions plus all element instances.

use std::{
    fs::File,
    io::{self, BufWriter},
    path::Path,
};

use fxhash::FxHashMap;
use log::trace;

use crate::{
    Error,
    encoding::Encoding,
    read::{RawSink, Reader},
    schema::ElementDef,
    value::Element,
    write::Config,
};




/// The maximum number of elements we reserve memory for up front when
/// reading. Counts in a header are untrusted.
const MAX_PREALLOCATED_ELEMENTS: u64 = 64 * 1024;

/// All element groups of a PLY file with their instances.
///
/// The order of element groups is the order they were added (or read) in,
/// which is also the order they are written in. Within one group, elements
/// keep their insertion order. Every element stored in the document matches
/// the definition of its group.
///
/// ```
/// use plymit::{Document, Element, ElementDef, Encoding, PropertyDef, ScalarType};
///
/// let mut doc = Document::new();
/// doc.add_element_type(
///     ElementDef::new("vertex")
///         .with_property(PropertyDef::scalar("x", ScalarType::Float))?
///         .with_property(PropertyDef::scalar("y", ScalarType::Float))?
/// )?;
/// doc.add_element("vertex", Element::new().with("x", 1.0f32).with("y", 0.5f32))?;
///
/// let bytes = doc.to_bytes(Encoding::BinaryLittleEndian)?;
/// assert_eq!(Document::read(&bytes[..])?, doc);
/// # Ok::<(), plymit::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    element_defs: Vec<ElementDef>,
    elements: FxHashMap<String, Vec<Element>>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new element group without any elements. It is placed after all
    /// groups added before.
    ///
    /// Fails with `SchemaMismatch` if a group with the same name exists or
    /// `def` itself is invalid (see [`ElementDef::validate`]).
    pub fn add_element_type(&mut self, def: ElementDef) -> Result<(), Error> {
        def.validate()?;
        if self.element_def(&def.name).is_some() {
            return Err(Error::mismatch(&def.name, "element type already exists"));
        }

        self.elements.insert(def.name.clone(), Vec::new());
        self.element_defs.push(def);
        Ok(())
    }

    /// Appends one element to the group `name`.
    ///
    /// Fails with `SchemaMismatch` if there is no such group or `elem` does
    /// not match its definition.
    pub fn add_element(&mut self, name: &str, elem: Element) -> Result<(), Error> {
        self.add_elements(name, Some(elem))
    }

    /// Appends all given elements to the group `name`.
    ///
    /// Either all elements are added or, if one of them does not match the
    /// definition, none of them.
    pub fn add_elements(
        &mut self,
        name: &str,
        elems: impl IntoIterator<Item = Element>,
    ) -> Result<(), Error> {
        let def = self.element_def(name)
            .ok_or_else(|| Error::mismatch(name, "unknown element type"))?;

        let elems = elems.into_iter().collect::<Vec<_>>();
        for elem in &elems {
            def.check_element(elem)?;
        }

        self.elements.entry(name.to_string()).or_default().extend(elems);
        Ok(())
    }

    /// All element definitions in file order.
    pub fn element_defs(&self) -> &[ElementDef] {
        &self.element_defs
    }

    pub fn element_def(&self, name: &str) -> Option<&ElementDef> {
        self.element_defs.iter().find(|def| def.name == name)
    }

    /// Returns all elements of the group `name` in order. Unknown groups are
    /// treated as empty.
    pub fn elements(&self, name: &str) -> &[Element] {
        self.elements.get(name).map(|v| &v[..]).unwrap_or(&[])
    }

    pub fn num_elements(&self, name: &str) -> usize {
        self.elements(name).len()
    }

    /// Writes this document with the given encoding and the default
    /// configuration. Use [`Config`] for more control.
    pub fn write(&self, w: impl io::Write, encoding: Encoding) -> Result<(), Error> {
        Config::new(encoding).into_writer(w).write_document(self)
    }

    /// Creates (or truncates) the file at `path` and writes this document to
    /// it.
    pub fn write_file(&self, path: impl AsRef<Path>, encoding: Encoding) -> Result<(), Error> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file), encoding)
    }

    /// Writes this document into a new byte vector.
    pub fn to_bytes(&self, encoding: Encoding) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.write(&mut out, encoding)?;
        Ok(out)
    }

    /// Reads a complete document. Comments in the header are discarded; use
    /// [`Reader`] to access them.
    pub fn read(r: impl io::Read) -> Result<Self, Error> {
        Reader::new(r)?.read_document()
    }

    /// Reads a complete document from the file at `path`.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        Reader::open(path)?.read_document()
    }
}

/// Elements coming from a reader are already typed by the definition and
/// are not checked again.
impl RawSink for Document {
    fn element_group_start(&mut self, def: &ElementDef, count: u64) -> Result<(), Error> {
        trace!("starting element group '{}' ({} declared)", def.name, count);

        let cap = count.min(MAX_PREALLOCATED_ELEMENTS) as usize;
        self.elements.insert(def.name.clone(), Vec::with_capacity(cap));
        self.element_defs.push(def.clone());
        Ok(())
    }

    fn element(&mut self, elem: Element) -> Result<(), Error> {
        let list = match self.element_defs.last() {
            Some(def) => self.elements.get_mut(&def.name),
            None => None,
        };

        match list {
            Some(list) => {
                list.push(elem);
                Ok(())
            }
            None => Err(Error::mismatch("", "element without element group")),
        }
    }
}
