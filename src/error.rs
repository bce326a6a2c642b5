use std::io;

use failure::Fail;

use crate::parse::{LookaheadExceeded, Span};


/// Everything that can go wrong while reading or writing a PLY file.
///
/// None of these errors are recoverable for the operation that returned
/// them. Use [`Error::is_header_error`] and [`Error::is_body_error`] to tell
/// a broken header (probably not a PLY file at all) from a broken body
/// (probably a truncated or corrupted file).
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "IO error: {}", _0)]
    Io(#[cause] io::Error),

    /// The header violates the PLY header grammar.
    #[fail(display = "malformed PLY header: {} (at {})", msg, span)]
    MalformedHeader {
        msg: String,
        span: Span,
    },

    /// A scalar type name that is not one of the eight PLY types.
    #[fail(display = "\"{}\" is not a valid PLY scalar type", _0)]
    UnknownType(String),

    /// A `property` line before any `element` line.
    #[fail(
        display = "property '{}' defined without preceding element definition (at {})",
        property,
        span
    )]
    NoCurrentElement {
        property: String,
        span: Span,
    },

    /// Instance data or a schema definition does not fit the schema it is
    /// used with.
    #[fail(display = "schema mismatch in element '{}': {}", element, msg)]
    SchemaMismatch {
        element: String,
        msg: String,
    },

    /// An ASCII body token could not be parsed as the declared type or a
    /// value is out of range.
    #[fail(display = "malformed scalar value: {} (at {})", msg, span)]
    MalformedScalar {
        msg: String,
        span: Span,
    },

    /// The input ended before all declared elements (or list entries) were
    /// read.
    #[fail(display = "unexpected end of input at byte {}: {}", offset, msg)]
    TruncatedInput {
        offset: usize,
        msg: String,
    },

    /// The `format` line declares a version other than `1.0`.
    #[fail(display = "unsupported PLY version '{}' (only '1.0' is supported)", _0)]
    UnsupportedVersion(String),
}

impl Error {
    /// Returns `true` if this error describes a problem with the header
    /// structure: the input is most likely not a PLY file or its header is
    /// corrupted.
    pub fn is_header_error(&self) -> bool {
        match self {
            Error::MalformedHeader { .. }
            | Error::UnknownType(_)
            | Error::NoCurrentElement { .. }
            | Error::UnsupportedVersion(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this error was caused by invalid or missing body
    /// data.
    pub fn is_body_error(&self) -> bool {
        match self {
            Error::MalformedScalar { .. } | Error::TruncatedInput { .. } => true,
            _ => false,
        }
    }

    pub(crate) fn mismatch(element: &str, msg: impl Into<String>) -> Self {
        Error::SchemaMismatch {
            element: element.to_string(),
            msg: msg.into(),
        }
    }

    /// Replaces the error returned by the parse buffer when a single token
    /// does not fit into it by the error `make` returns. All other errors are
    /// returned unchanged.
    pub(crate) fn map_too_long(self, make: impl FnOnce() -> Self) -> Self {
        match self {
            Error::Io(ref e) if e.get_ref().map_or(false, |e| e.is::<LookaheadExceeded>()) => make(),
            other => other,
        }
    }

    /// Adds the context `msg` to a `TruncatedInput` error. All other errors
    /// are returned unchanged.
    pub(crate) fn truncated_context(self, msg: impl FnOnce() -> String) -> Self {
        match self {
            Error::TruncatedInput { offset, .. } => Error::TruncatedInput { offset, msg: msg() },
            other => other,
        }
    }
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Io(src)
    }
}
