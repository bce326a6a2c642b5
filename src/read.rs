//! Everything related to reading a PLY file.

use std::{
    fs::File,
    io,
    path::Path,
};

use log::{debug, trace};

use crate::{
    Error,
    document::Document,
    encoding::{Encoding, FormatCodec},
    header::Header,
    parse::{Buffer, ParseBuf, is_blank},
    schema::ElementDef,
    value::Element,
};


/// A type that can accept decoded data from a PLY file. This is mainly used
/// for [`Reader::read_raw_into`].
pub trait RawSink {
    /// Is called when a new element group begins. `def` describes the layout
    /// of all `count` elements in this group. This method is *always* called
    /// before `element` is called.
    fn element_group_start(&mut self, def: &ElementDef, count: u64) -> Result<(), Error>;

    /// Is called for each element that is read. When called, the element
    /// belongs to the last element group (the last `element_group_start`
    /// call).
    fn element(&mut self, elem: Element) -> Result<(), Error>;
}

/// The result of [`Reader::read_partial`]: everything that could be read,
/// plus the error that stopped reading (if any).
#[derive(Debug)]
pub struct PartialRead {
    pub document: Document,
    pub error: Option<Error>,
}

/// A reader able to read PLY files.
///
/// Creating a reader parses the header. The body is read by one of the
/// consuming methods afterwards.
///
/// ```
/// use plymit::Reader;
///
/// let data = b"ply\nformat ascii 1.0\nelement point 2\nproperty int v\nend_header\n3\n4\n";
/// let reader = Reader::new(&data[..])?;
/// assert_eq!(reader.header().count_of("point"), Some(2));
///
/// let doc = reader.read_document()?;
/// assert_eq!(doc.elements("point")[1].get("v").and_then(|p| p.as_integer()), Some(4));
/// # Ok::<(), plymit::Error>(())
/// ```
#[derive(Debug)]
pub struct Reader<R: io::Read> {
    buf: Buffer<R>,
    header: Header,
}

impl Reader<File> {
    /// Tries to open the file specified by the given path and creates a new
    /// `Reader` from that file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        // We don't need a `BufReader` here, because we use our internal parse
        // buffer anyway.
        Self::new(File::open(path)?)
    }
}

impl<R: io::Read> Reader<R> {
    /// Creates a new `Reader` from the given `io::Read` instance and parses
    /// the header of the given input.
    ///
    /// If you want to open a file, rather use [`Reader::open`].
    pub fn new(reader: R) -> Result<Self, Error> {
        let mut buf = Buffer::new(reader);
        let header = Header::parse(&mut buf)?;

        Ok(Self { buf, header })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn encoding(&self) -> Encoding {
        self.header.encoding
    }

    /// Reads the whole body into the given raw sink.
    ///
    /// Exactly the declared number of elements is read for each group. Data
    /// after the last element is ignored.
    pub fn read_raw_into(self, sink: &mut impl RawSink) -> Result<(), Error> {
        let Self { mut buf, header } = self;
        debug_assert_eq!(buf.offset(), header.body_offset);

        with_codec!(header.encoding, |codec| read_body(codec, &mut buf, &header, sink))?;

        if !buf.is_eof()? {
            debug!("ignoring data after the last element (starting at byte {})", buf.offset());
        }

        Ok(())
    }

    /// Reads the whole body into a new [`Document`].
    pub fn read_document(self) -> Result<Document, Error> {
        let mut document = Document::new();
        self.read_raw_into(&mut document)?;
        Ok(document)
    }

    /// Like [`Reader::read_document`], but on errors in the body, everything
    /// read so far is returned alongside the error.
    ///
    /// Element groups after the failing one are missing from the document.
    /// The failing group usually is present, but holds fewer elements than
    /// declared.
    pub fn read_partial(self) -> PartialRead {
        let mut document = Document::new();
        let error = self.read_raw_into(&mut document).err();

        PartialRead { document, error }
    }
}

fn read_body<C: FormatCodec>(
    codec: &C,
    buf: &mut impl ParseBuf,
    header: &Header,
    sink: &mut impl RawSink,
) -> Result<(), Error> {
    for (def, count) in header.elements() {
        trace!("reading {} '{}' elements ({})", count, def.name, C::ENCODING);
        check_binary_group(C::ENCODING, def, count)?;
        sink.element_group_start(def, count)?;

        // Just read as many elements as specified in the header. A huge
        // number in the header is harmless: every element occupies at least
        // one byte, so the time spent here is limited by the input size.
        let missing = |i: u64| move || {
            format!("only {} of {} declared '{}' elements present", i, count, def.name)
        };
        for i in 0..count {
            if buf.is_eof()? {
                return Err(Error::TruncatedInput { offset: buf.offset(), msg: missing(i)() });
            }

            let elem = match def.decode_element(codec, buf) {
                Ok(elem) => elem,

                // An ASCII body whose records ran out before a final blank
                // line is still a short body, not a corrupt one.
                Err(e @ Error::MalformedScalar { .. }) if !C::ENCODING.is_binary() => {
                    buf.skip_until(|b| !is_blank(b) && b != b'\n')?;
                    if buf.is_eof()? {
                        return Err(Error::TruncatedInput {
                            offset: buf.offset(),
                            msg: missing(i)(),
                        });
                    }
                    return Err(e);
                }
                Err(e) => return Err(e.truncated_context(missing(i))),
            };
            sink.element(elem)?;
        }
    }

    Ok(())
}

/// Elements without properties occupy zero bytes in binary encodings. Such
/// a group can only be empty.
pub(crate) fn check_binary_group(encoding: Encoding, def: &ElementDef, count: u64) -> Result<(), Error> {
    if encoding.is_binary() && def.property_defs.is_empty() && count > 0 {
        return Err(Error::mismatch(
            &def.name,
            format!("{} elements without properties cannot be stored in binary encoding", count),
        ));
    }

    Ok(())
}
