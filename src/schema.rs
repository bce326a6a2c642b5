//! Element and property definitions as declared in the PLY header.
//!
//! A PLY file contains any number of element groups (e.g. `vertex` and
//! `face`). Each group is described by an [`ElementDef`]: a name and an
//! ordered list of [`PropertyDef`]s. The property order fixes both the order
//! of the `property` lines in the header and the order of values in each
//! body record.

use std::{
    fmt,
    io::Write,
    str::FromStr,
};

use crate::{
    Error,
    encoding::FormatCodec,
    parse::{ParseBuf, Span},
    value::{Element, Property, Scalar},
};


#[cfg(test)]
mod tests;


// ===========================================================================
// ===== Scalar types
// ===========================================================================

/// One of the eight primitive PLY types: three signed and three unsigned
/// integers plus two floating point types.
///
/// The set is closed: every `match` over it is exhaustive, so adding a type
/// is a compile time checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Float,
    Double,
}

impl ScalarType {
    /// All scalar types in the order of the PLY type table.
    pub const ALL: [ScalarType; 8] = [
        ScalarType::Char,
        ScalarType::UChar,
        ScalarType::Short,
        ScalarType::UShort,
        ScalarType::Int,
        ScalarType::UInt,
        ScalarType::Float,
        ScalarType::Double,
    ];

    /// Returns the type name used in the header (e.g. `short` for
    /// `ScalarType::Short`).
    pub fn ply_type_name(&self) -> &'static str {
        match *self {
            ScalarType::Char => "char",
            ScalarType::UChar => "uchar",
            ScalarType::Short => "short",
            ScalarType::UShort => "ushort",
            ScalarType::Int => "int",
            ScalarType::UInt => "uint",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }

    /// Returns the number of bytes this type occupies in binary encodings.
    pub fn len(&self) -> usize {
        match *self {
            ScalarType::Char => 1,
            ScalarType::UChar => 1,
            ScalarType::Short => 2,
            ScalarType::UShort => 2,
            ScalarType::Int => 4,
            ScalarType::UInt => 4,
            ScalarType::Float => 4,
            ScalarType::Double => 8,
        }
    }

    /// Returns `true` for all types that can represent negative values
    /// (which includes both floating point types).
    pub fn is_signed(&self) -> bool {
        !self.is_unsigned_integer()
    }

    /// Returns `true` if and only if the type is either `float` or `double`.
    pub fn is_floating_point(&self) -> bool {
        *self == ScalarType::Float || *self == ScalarType::Double
    }

    /// Returns `true` if and only if the type is one of `uchar`, `ushort` or
    /// `uint`.
    pub fn is_unsigned_integer(&self) -> bool {
        match self {
            ScalarType::UChar | ScalarType::UShort | ScalarType::UInt => true,
            _ => false,
        }
    }

    /// Returns `true` if and only if the type is one of `char`, `short` or
    /// `int`.
    pub fn is_signed_integer(&self) -> bool {
        match self {
            ScalarType::Char | ScalarType::Short | ScalarType::Int => true,
            _ => false,
        }
    }

    pub fn is_integer(&self) -> bool {
        !self.is_floating_point()
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.ply_type_name())
    }
}

impl FromStr for ScalarType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScalarType::ALL.iter()
            .find(|ty| ty.ply_type_name() == s)
            .copied()
            .ok_or_else(|| Error::UnknownType(s.to_string()))
    }
}


// ===========================================================================
// ===== Property and element definitions
// ===========================================================================

/// The type of a property: either a single scalar or a list whose length is
/// stored in front of its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Scalar(ScalarType),
    List {
        len_type: ScalarType,
        scalar_type: ScalarType,
    },
}

impl PropertyType {
    pub fn len_type(&self) -> Option<ScalarType> {
        match *self {
            PropertyType::Scalar(_) => None,
            PropertyType::List { len_type, .. } => Some(len_type),
        }
    }

    pub fn scalar_type(&self) -> ScalarType {
        match *self {
            PropertyType::Scalar(scalar_type) => scalar_type,
            PropertyType::List { scalar_type, .. } => scalar_type,
        }
    }

    pub fn is_list(&self) -> bool {
        self.len_type().is_some()
    }

    /// Checks that list lengths and list entries have integer types. Returns
    /// a description of the problem otherwise.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if let PropertyType::List { len_type, scalar_type } = *self {
            if len_type.is_floating_point() {
                return Err(format!("list length type must be an integer, found '{}'", len_type));
            }
            if scalar_type.is_floating_point() {
                return Err(format!("list entry type must be an integer, found '{}'", scalar_type));
            }
        }

        Ok(())
    }
}

/// The header definition of one property of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub ty: PropertyType,
}

impl PropertyDef {
    pub fn scalar(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            ty: PropertyType::Scalar(ty),
        }
    }

    pub fn list(name: impl Into<String>, len_type: ScalarType, scalar_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            ty: PropertyType::List { len_type, scalar_type },
        }
    }

    /// Returns the `property ...` line declaring this property in the header,
    /// including the trailing `'\n'`.
    pub fn header_line(&self) -> String {
        match self.ty {
            PropertyType::Scalar(ty) => format!("property {} {}\n", ty, self.name),
            PropertyType::List { len_type, scalar_type } => {
                format!("property list {} {} {}\n", len_type, scalar_type, self.name)
            }
        }
    }

    /// Checks that `value` can be stored as this property. `element` is only
    /// used for the error message.
    fn check_value(&self, element: &str, value: &Property) -> Result<(), Error> {
        let type_matches = value.is_list() == self.ty.is_list()
            && value.scalar_type() == self.ty.scalar_type();
        if !type_matches {
            return Err(Error::mismatch(element, format!(
                "property '{}' is declared as {}, but the value has type {}",
                self.name,
                type_description(self.ty),
                value.type_description(),
            )));
        }

        if let (Some(len_type), Some(len)) = (self.ty.len_type(), value.list_len()) {
            if Scalar::from_len(len_type, len).is_none() {
                return Err(Error::mismatch(element, format!(
                    "list '{}' has {} entries, which does not fit into its length type '{}'",
                    self.name,
                    len,
                    len_type,
                )));
            }
        }

        Ok(())
    }

    /// Encodes `value` with the given codec: a scalar is encoded directly, a
    /// list is encoded as its length (with type `len_type`) followed by all
    /// entries.
    pub(crate) fn encode<C: FormatCodec>(
        &self,
        codec: &C,
        w: &mut impl Write,
        element: &str,
        value: &Property,
    ) -> Result<(), Error> {
        self.check_value(element, value)?;

        if let Some(scalar) = value.as_scalar() {
            return codec.encode_scalar(w, scalar);
        }

        let len = value.list_len()
            .and_then(|len| self.ty.len_type().and_then(|ty| Scalar::from_len(ty, len)))
            .ok_or_else(|| Error::mismatch(element, format!("invalid list '{}'", self.name)))?;
        codec.encode_scalar(w, len)?;

        macro_rules! encode_list {
            ($list:expr, $variant:ident) => {{
                for &v in $list.iter() {
                    codec.write_separator(w)?;
                    codec.encode_scalar(w, Scalar::$variant(v))?;
                }
                Ok(())
            }}
        }

        match value {
            Property::CharList(list) => encode_list!(list, Char),
            Property::UCharList(list) => encode_list!(list, UChar),
            Property::ShortList(list) => encode_list!(list, Short),
            Property::UShortList(list) => encode_list!(list, UShort),
            Property::IntList(list) => encode_list!(list, Int),
            Property::UIntList(list) => encode_list!(list, UInt),
            // Scalars were handled above.
            _ => Ok(()),
        }
    }

    /// Decodes one value of this property. Reads exactly what `encode`
    /// writes: for lists, the length first and then that many entries.
    pub(crate) fn decode<C: FormatCodec>(
        &self,
        codec: &C,
        buf: &mut impl ParseBuf,
        element: &str,
    ) -> Result<Property, Error> {
        let (len_type, scalar_type) = match self.ty {
            PropertyType::Scalar(ty) => return Ok(codec.decode_scalar(buf, ty)?.into()),
            PropertyType::List { len_type, scalar_type } => (len_type, scalar_type),
        };

        let len_offset = buf.offset();
        let len = codec.decode_scalar(buf, len_type)?.as_len().ok_or_else(|| {
            Error::MalformedScalar {
                msg: format!("negative length for list property '{}'", self.name),
                span: Span::new(len_offset, buf.offset()),
            }
        })?;

        macro_rules! decode_list {
            ($variant:ident, $read_fn:ident) => {{
                let mut list = smallvec::SmallVec::new();
                for _ in 0..len {
                    codec.skip_separator(buf)?;
                    list.push(codec.$read_fn(buf)?);
                }

                Property::$variant(list)
            }}
        }

        let prop = match scalar_type {
            ScalarType::Char => decode_list!(CharList, read_i8),
            ScalarType::UChar => decode_list!(UCharList, read_u8),
            ScalarType::Short => decode_list!(ShortList, read_i16),
            ScalarType::UShort => decode_list!(UShortList, read_u16),
            ScalarType::Int => decode_list!(IntList, read_i32),
            ScalarType::UInt => decode_list!(UIntList, read_u32),
            ScalarType::Float | ScalarType::Double => {
                return Err(Error::mismatch(element, format!(
                    "list '{}' has floating point entries",
                    self.name,
                )));
            }
        };

        Ok(prop)
    }
}

fn type_description(ty: PropertyType) -> String {
    match ty {
        PropertyType::Scalar(ty) => format!("'{}'", ty),
        PropertyType::List { scalar_type, .. } => format!("list of '{}'", scalar_type),
    }
}

/// The header definition of one element group: its name and the definitions
/// of all its properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDef {
    pub name: String,

    /// Definitions for all properties of elements in this group, in
    /// declaration order.
    pub property_defs: Vec<PropertyDef>,
}

impl ElementDef {
    /// Creates an element definition without any properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property_defs: Vec::new(),
        }
    }

    /// Appends a property definition.
    ///
    /// Fails with `SchemaMismatch` if a property with the same name already
    /// exists or if a list property uses floating point types.
    pub fn add_property(&mut self, def: PropertyDef) -> Result<(), Error> {
        if let Err(msg) = def.ty.validate() {
            return Err(Error::mismatch(&self.name, format!("property '{}': {}", def.name, msg)));
        }
        if self.property(&def.name).is_some() {
            return Err(Error::mismatch(
                &self.name,
                format!("duplicate property '{}'", def.name),
            ));
        }

        self.property_defs.push(def);
        Ok(())
    }

    /// Builder version of [`ElementDef::add_property`].
    pub fn with_property(mut self, def: PropertyDef) -> Result<Self, Error> {
        self.add_property(def)?;
        Ok(self)
    }

    /// Checks all invariants that `add_property` enforces. Useful for
    /// definitions whose public fields were filled directly.
    pub fn validate(&self) -> Result<(), Error> {
        for (i, def) in self.property_defs.iter().enumerate() {
            if let Err(msg) = def.ty.validate() {
                return Err(Error::mismatch(&self.name, format!("property '{}': {}", def.name, msg)));
            }
            if self.property_defs[..i].iter().any(|other| other.name == def.name) {
                return Err(Error::mismatch(
                    &self.name,
                    format!("duplicate property '{}'", def.name),
                ));
            }
        }

        Ok(())
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.property_defs.iter().find(|p| p.name == name)
    }

    /// Returns the `element` line and all `property` lines declaring this
    /// element group with `count` elements.
    pub fn header_lines(&self, count: u64) -> String {
        let mut out = format!("element {} {}\n", self.name, count);
        for prop in &self.property_defs {
            out.push_str(&prop.header_line());
        }

        out
    }

    /// Checks that `elem` has exactly the properties of this definition, with
    /// matching types.
    pub fn check_element(&self, elem: &Element) -> Result<(), Error> {
        for def in &self.property_defs {
            let value = elem.get(&def.name).ok_or_else(|| {
                Error::mismatch(&self.name, format!("missing property '{}'", def.name))
            })?;
            def.check_value(&self.name, value)?;
        }

        if elem.len() != self.property_defs.len() {
            let unknown = elem.iter()
                .map(|(name, _)| name)
                .find(|name| self.property(name).is_none())
                .unwrap_or("?");
            return Err(Error::mismatch(
                &self.name,
                format!("element has undeclared property '{}'", unknown),
            ));
        }

        Ok(())
    }

    /// Encodes one element as a record: all properties in declaration order,
    /// joined by the codec's separator and ended by its terminator.
    pub(crate) fn encode_element<C: FormatCodec>(
        &self,
        codec: &C,
        w: &mut impl Write,
        elem: &Element,
    ) -> Result<(), Error> {
        for (i, def) in self.property_defs.iter().enumerate() {
            if i > 0 {
                codec.write_separator(w)?;
            }

            let value = elem.get(&def.name).ok_or_else(|| {
                Error::mismatch(&self.name, format!("missing property '{}'", def.name))
            })?;
            def.encode(codec, w, &self.name, value)?;
        }

        codec.write_terminator(w)
    }

    /// Decodes one record written by `encode_element`.
    pub(crate) fn decode_element<C: FormatCodec>(
        &self,
        codec: &C,
        buf: &mut impl ParseBuf,
    ) -> Result<Element, Error> {
        let mut elem = Element::with_capacity(self.property_defs.len());
        for (i, def) in self.property_defs.iter().enumerate() {
            if i > 0 {
                codec.skip_separator(buf)?;
            }

            elem.set(def.name.clone(), def.decode(codec, buf, &self.name)?);
        }

        codec.finish_record(buf)?;
        Ok(elem)
    }
}
