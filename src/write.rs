//! Everything related to writing a PLY file.
//!
//! # Random notes on the format
//!
//! - The header is a series of `'\n'` terminated lines. Files in the wild
//!   never use `'\r'` as terminator, so neither do we.
//! - Element groups are written in the order they were added to the
//!   document, properties in declaration order. Groups without any elements
//!   are still declared (with count 0).

use std::io;

use log::debug;

use crate::{
    Error,
    document::Document,
    encoding::{Encoding, FormatCodec},
    header::write_header,
    read::check_binary_group,
};


// ===========================================================================
// ===== PLY Config
// ===========================================================================

/// The comment every new configuration starts with.
const DEFAULT_COMMENT: &str = "written by plymit";

/// Used to configure and create a [`Writer`].
///
/// This is used to configure basic settings for the file to be written. Most
/// importantly, this is the file encoding. Additionally, you can add comments
/// to the file header.
#[derive(Clone, Debug)]
pub struct Config {
    encoding: Encoding,
    comments: Vec<String>,
}

impl Config {
    /// Creates a new configuration with binary encoding (native endianness).
    pub fn binary() -> Self {
        Self::new(Encoding::binary_native())
    }

    /// Creates a new configuration with ASCII encoding.
    ///
    /// ASCII encoding is usually a lot less space efficient and a lot slower
    /// to read and write. The PLY file header is always ASCII.
    pub fn ascii() -> Self {
        Self::new(Encoding::Ascii)
    }

    /// Creates a new configuration with the given encoding. The header will
    /// contain the comment `written by plymit`; use
    /// [`Config::without_comments`] to remove it.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            comments: vec![DEFAULT_COMMENT.to_string()],
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Adds a `comment` line to the file header.
    ///
    /// The given string must not contain `'\n'` or else this method panics.
    pub fn add_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();

        assert!(!comment.contains('\n'), "PLY comments must not contain '\\n'!");

        self.comments.push(comment);
        self
    }

    /// Removes all comments, including the default one.
    pub fn without_comments(mut self) -> Self {
        self.comments.clear();
        self
    }

    /// Creates a writer with the given `io::Write` instance and `self` as
    /// configuration.
    pub fn into_writer<W: io::Write>(self, writer: W) -> Writer<W> {
        Writer::new(self, writer)
    }
}


// ===========================================================================
// ===== PLY Writer
// ===========================================================================

/// A writer able to write binary and ASCII PLY files.
///
/// # Example
///
/// ```
/// use std::{
///     fs::File,
///     io::BufWriter,
/// };
/// use plymit::{Config, Document, Error};
///
/// fn write_both_encodings(doc: &Document) -> Result<(), Error> {
///     // We use `BufWriter` here because unbuffered file access is usually a
///     // lot slower.
///     let file_a = File::create("mesh_ascii.ply")?;
///     Config::ascii().into_writer(BufWriter::new(file_a)).write_document(doc)?;
///
///     let file_b = File::create("mesh_binary.ply")?;
///     Config::binary().into_writer(BufWriter::new(file_b)).write_document(doc)?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    config: Config,
    writer: W,
}

impl<W: io::Write> Writer<W> {
    /// Creates a new PLY writer with the given PLY config which will write to
    /// the given `io::Write` instance.
    pub fn new(config: Config, writer: W) -> Self {
        Self { config, writer }
    }

    /// Writes the header and body of `doc`. The writer is flushed at the end.
    ///
    /// Fails with `SchemaMismatch` before writing anything if a binary
    /// encoding is used and a group without properties is not empty.
    pub fn write_document(mut self, doc: &Document) -> Result<(), Error> {
        for def in doc.element_defs() {
            check_binary_group(self.config.encoding, def, doc.num_elements(&def.name) as u64)?;
        }

        let w = &mut self.writer;
        let groups = doc.element_defs()
            .iter()
            .map(|def| (def, doc.num_elements(&def.name) as u64));
        write_header(w, self.config.encoding, &self.config.comments, groups)?;

        with_codec!(self.config.encoding, |codec| write_body(codec, w, doc))?;
        w.flush()?;

        debug!(
            "wrote PLY file: format {}, {} element groups",
            self.config.encoding,
            doc.element_defs().len(),
        );

        Ok(())
    }
}

fn write_body<C: FormatCodec>(
    codec: &C,
    w: &mut impl io::Write,
    doc: &Document,
) -> Result<(), Error> {
    for def in doc.element_defs() {
        for elem in doc.elements(&def.name) {
            def.encode_element(codec, w, elem)?;
        }
    }

    Ok(())
}
