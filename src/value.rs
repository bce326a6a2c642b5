//! Dynamically typed property values and element instances.

use std::convert::TryFrom;

use derive_more::From;
use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::schema::ScalarType;


/// A single value of one of the eight PLY scalar types.
#[derive(Debug, Clone, Copy, PartialEq, From)]
pub enum Scalar {
    Char(i8),
    UChar(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Float(f32),
    Double(f64),
}

impl Scalar {
    /// Returns the type of this value.
    pub fn ty(&self) -> ScalarType {
        match self {
            Scalar::Char(_) => ScalarType::Char,
            Scalar::UChar(_) => ScalarType::UChar,
            Scalar::Short(_) => ScalarType::Short,
            Scalar::UShort(_) => ScalarType::UShort,
            Scalar::Int(_) => ScalarType::Int,
            Scalar::UInt(_) => ScalarType::UInt,
            Scalar::Float(_) => ScalarType::Float,
            Scalar::Double(_) => ScalarType::Double,
        }
    }

    /// Returns the value as integer, or `None` if it is a floating point
    /// value.
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Scalar::Char(v) => Some(v.into()),
            Scalar::UChar(v) => Some(v.into()),
            Scalar::Short(v) => Some(v.into()),
            Scalar::UShort(v) => Some(v.into()),
            Scalar::Int(v) => Some(v.into()),
            Scalar::UInt(v) => Some(v.into()),
            Scalar::Float(_) | Scalar::Double(_) => None,
        }
    }

    /// Returns the value as unsigned integer, or `None` if it is a floating
    /// point value or negative.
    pub fn as_unsigned_integer(&self) -> Option<u64> {
        self.as_integer().and_then(|v| u64::try_from(v).ok())
    }

    /// Returns the value as float, or `None` if it is an integer.
    pub fn as_floating_point(&self) -> Option<f64> {
        match *self {
            Scalar::Float(v) => Some(v.into()),
            Scalar::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Interprets this value as a list length. Returns `None` for negative
    /// values and floats.
    pub(crate) fn as_len(&self) -> Option<usize> {
        self.as_integer().and_then(|v| usize::try_from(v).ok())
    }

    /// Converts a list length into a value of type `ty`. Returns `None` if
    /// `len` does not fit into `ty` or `ty` is a floating point type.
    pub(crate) fn from_len(ty: ScalarType, len: usize) -> Option<Self> {
        let v: Scalar = match ty {
            ScalarType::Char => i8::try_from(len).ok()?.into(),
            ScalarType::UChar => u8::try_from(len).ok()?.into(),
            ScalarType::Short => i16::try_from(len).ok()?.into(),
            ScalarType::UShort => u16::try_from(len).ok()?.into(),
            ScalarType::Int => i32::try_from(len).ok()?.into(),
            ScalarType::UInt => u32::try_from(len).ok()?.into(),
            ScalarType::Float | ScalarType::Double => return None,
        };

        Some(v)
    }
}


/// One property value: either a scalar or a list of integers.
///
/// The sizes of the smallvecs are chosen so that the inline variant won't
/// inflict a size overhead (on x64). This still means that the most common
/// form of list, the three-tuple `vertex_indices`, will fit inline.
#[derive(Debug, Clone, PartialEq, From)]
pub enum Property {
    Char(i8),
    UChar(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Float(f32),
    Double(f64),
    CharList(SmallVec<[i8; 16]>),
    UCharList(SmallVec<[u8; 16]>),
    ShortList(SmallVec<[i16; 8]>),
    UShortList(SmallVec<[u16; 8]>),
    IntList(SmallVec<[i32; 4]>),
    UIntList(SmallVec<[u32; 4]>),
}

impl Property {
    /// Returns the scalar type of this value or of the list entries.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Property::Char(_) | Property::CharList(_) => ScalarType::Char,
            Property::UChar(_) | Property::UCharList(_) => ScalarType::UChar,
            Property::Short(_) | Property::ShortList(_) => ScalarType::Short,
            Property::UShort(_) | Property::UShortList(_) => ScalarType::UShort,
            Property::Int(_) | Property::IntList(_) => ScalarType::Int,
            Property::UInt(_) | Property::UIntList(_) => ScalarType::UInt,
            Property::Float(_) => ScalarType::Float,
            Property::Double(_) => ScalarType::Double,
        }
    }

    pub fn is_list(&self) -> bool {
        self.list_len().is_some()
    }

    /// Returns the number of list entries, or `None` for scalars.
    pub fn list_len(&self) -> Option<usize> {
        match self {
            Property::CharList(l) => Some(l.len()),
            Property::UCharList(l) => Some(l.len()),
            Property::ShortList(l) => Some(l.len()),
            Property::UShortList(l) => Some(l.len()),
            Property::IntList(l) => Some(l.len()),
            Property::UIntList(l) => Some(l.len()),
            _ => None,
        }
    }

    /// Returns the value as `Scalar`, or `None` if this is a list.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match *self {
            Property::Char(v) => Some(v.into()),
            Property::UChar(v) => Some(v.into()),
            Property::Short(v) => Some(v.into()),
            Property::UShort(v) => Some(v.into()),
            Property::Int(v) => Some(v.into()),
            Property::UInt(v) => Some(v.into()),
            Property::Float(v) => Some(v.into()),
            Property::Double(v) => Some(v.into()),
            _ => None,
        }
    }

    /// Returns the value as integer, or `None` if the property is not a
    /// scalar integer.
    pub fn as_integer(&self) -> Option<i64> {
        self.as_scalar().and_then(|s| s.as_integer())
    }

    /// Like [`Property::as_integer`], but also `None` for negative values.
    pub fn as_unsigned_integer(&self) -> Option<u64> {
        self.as_scalar().and_then(|s| s.as_unsigned_integer())
    }

    /// Returns the value as float, or `None` if the property is not a
    /// scalar `float` or `double`.
    pub fn as_floating_point(&self) -> Option<f64> {
        self.as_scalar().and_then(|s| s.as_floating_point())
    }

    /// Returns all list entries widened to `i64`, or `None` for scalars.
    pub fn as_integer_list(&self) -> Option<Vec<i64>> {
        fn widen<T: Copy + Into<i64>>(l: &[T]) -> Option<Vec<i64>> {
            Some(l.iter().map(|&v| v.into()).collect())
        }

        match self {
            Property::CharList(l) => widen(l),
            Property::UCharList(l) => widen(l),
            Property::ShortList(l) => widen(l),
            Property::UShortList(l) => widen(l),
            Property::IntList(l) => widen(l),
            Property::UIntList(l) => widen(l),
            _ => None,
        }
    }

    pub(crate) fn type_description(&self) -> String {
        if self.is_list() {
            format!("list of '{}'", self.scalar_type())
        } else {
            format!("'{}'", self.scalar_type())
        }
    }
}

impl From<Scalar> for Property {
    fn from(src: Scalar) -> Self {
        match src {
            Scalar::Char(v) => Property::Char(v),
            Scalar::UChar(v) => Property::UChar(v),
            Scalar::Short(v) => Property::Short(v),
            Scalar::UShort(v) => Property::UShort(v),
            Scalar::Int(v) => Property::Int(v),
            Scalar::UInt(v) => Property::UInt(v),
            Scalar::Float(v) => Property::Float(v),
            Scalar::Double(v) => Property::Double(v),
        }
    }
}

macro_rules! impl_list_from {
    ($ty:ident, $variant:ident) => {
        impl From<Vec<$ty>> for Property {
            fn from(src: Vec<$ty>) -> Self {
                Property::$variant(SmallVec::from_vec(src))
            }
        }

        impl From<&[$ty]> for Property {
            fn from(src: &[$ty]) -> Self {
                Property::$variant(SmallVec::from_slice(src))
            }
        }
    }
}

impl_list_from!(i8, CharList);
impl_list_from!(u8, UCharList);
impl_list_from!(i16, ShortList);
impl_list_from!(u16, UShortList);
impl_list_from!(i32, IntList);
impl_list_from!(u32, UIntList);


/// One element instance: a value for each property, looked up by property
/// name.
///
/// An element does not know its [`ElementDef`][crate::ElementDef]; it only
/// has to structurally match the definition of the group it is added to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    props: FxHashMap<String, Property>,
}

impl Element {
    /// Creates an element without any property values.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(cap: usize) -> Self {
        let mut props = FxHashMap::default();
        props.reserve(cap);
        Self { props }
    }

    /// Builder style version of [`Element::set`].
    ///
    /// ```
    /// use plymit::Element;
    ///
    /// let v = Element::new()
    ///     .with("x", 1.0f32)
    ///     .with("y", 2.0f32)
    ///     .with("z", 0.5f32);
    /// assert_eq!(v.get("y").and_then(|p| p.as_floating_point()), Some(2.0));
    /// ```
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Property>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets the value of the property `name`, returning the old value if
    /// there was one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Property>) -> Option<Property> {
        self.props.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.props.get(name)
    }

    /// Returns the number of property values.
    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Iterates over all property values in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> + '_ {
        self.props.iter().map(|(name, p)| (name.as_str(), p))
    }
}
