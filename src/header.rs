//! Parsing and writing the PLY header.
//!
//! The header is line oriented, but within one line the tokens are separated
//! by arbitrary runs of whitespace. Parsing happens in two layers: the
//! tokenizer lazily pulls words and linebreaks out of the input buffer, one
//! token at a time. The parser is a state machine on top of that which
//! consumes each token exactly once.
//!
//! The tokenizer never reads beyond the linebreak ending the `end_header`
//! line, so the buffer is positioned exactly at the start of the body when
//! parsing finishes. This matters for binary bodies starting with bytes that
//! look like whitespace.

use std::io::Write;

use log::debug;

use crate::{
    Error,
    encoding::Encoding,
    parse::{ParseBuf, Span, debug_fmt_bytes, is_blank},
    schema::{ElementDef, PropertyDef, PropertyType, ScalarType},
};




/// The only version of the PLY format that exists.
const PLY_VERSION: &str = "1.0";


/// The parsed header of a PLY file.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// The encoding of the body.
    pub encoding: Encoding,

    /// All `comment` lines in order, without the `comment` keyword.
    pub comments: Vec<String>,

    /// All element groups in declaration order.
    pub element_defs: Vec<ElementDef>,

    /// The declared number of elements per group. Parallel to
    /// `element_defs`.
    pub counts: Vec<u64>,

    /// The absolute byte offset directly after the `end_header` line, i.e.
    /// where the body starts.
    pub body_offset: usize,
}

impl Header {
    /// Iterates over all element groups together with their declared count.
    pub fn elements(&self) -> impl Iterator<Item = (&ElementDef, u64)> + '_ {
        self.element_defs.iter().zip(self.counts.iter().copied())
    }

    /// Returns the declared count of the element group `name`.
    pub fn count_of(&self, name: &str) -> Option<u64> {
        self.elements().find(|(def, _)| def.name == name).map(|(_, count)| count)
    }

    /// Writes this header, including the final `end_header` line.
    ///
    /// `body_offset` is ignored. Comments containing `'\n'` are rejected
    /// with `MalformedHeader`.
    pub fn write_to(&self, w: &mut impl Write) -> Result<(), Error> {
        write_header(w, self.encoding, &self.comments, self.elements())
    }

    /// Parses a header from `buf`. Afterwards, `buf` is positioned at the
    /// first byte of the body.
    pub(crate) fn parse(buf: &mut impl ParseBuf) -> Result<Self, Error> {
        let header = HeaderParser::new(buf).run()?;

        debug!(
            "parsed PLY header: format {}, elements [{}], body at byte {}",
            header.encoding,
            header.elements()
                .map(|(def, count)| format!("{} x{}", def.name, count))
                .collect::<Vec<_>>()
                .join(", "),
            header.body_offset,
        );

        Ok(header)
    }
}


/// Writes a complete header. The header is always ASCII, regardless of
/// `encoding`.
///
/// Fails with `MalformedHeader` before writing anything if a comment
/// contains `'\n'`. The span points to that linebreak in the header that
/// would have been written.
pub(crate) fn write_header<'a>(
    w: &mut impl Write,
    encoding: Encoding,
    comments: &[String],
    elements: impl Iterator<Item = (&'a ElementDef, u64)>,
) -> Result<(), Error> {
    let format_line = format!("format {} {}\n", encoding.header_name(), PLY_VERSION);
    let mut offset = "ply\n".len() + format_line.len();
    for comment in comments {
        if let Some(pos) = comment.find('\n') {
            return Err(malformed(
                format!("comment {:?} contains a linebreak", comment),
                Span::single(offset + "comment ".len() + pos),
            ));
        }
        offset += "comment \n".len() + comment.len();
    }

    // Magic signature
    w.write_all(b"ply\n")?;
    w.write_all(format_line.as_bytes())?;

    for comment in comments {
        writeln!(w, "comment {}", comment)?;
    }

    for (def, count) in elements {
        w.write_all(def.header_lines(count).as_bytes())?;
    }

    w.write_all(b"end_header\n")?;
    Ok(())
}


// ===========================================================================
// ===== Tokenizer
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    /// A run of non-whitespace characters.
    Word(String),

    /// A single `'\n'`.
    Newline,

    /// The input ended.
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    span: Span,
}

impl Token {
    fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Word(w) => format!("{:?}", w),
            TokenKind::Newline => "end of line".into(),
            TokenKind::Eof => "end of input".into(),
        }
    }
}

/// Pulls header tokens out of a parse buffer on demand.
struct Tokenizer<'a, B: ParseBuf> {
    buf: &'a mut B,
}

impl<'a, B: ParseBuf> Tokenizer<'a, B> {
    fn new(buf: &'a mut B) -> Self {
        Self { buf }
    }

    fn next_token(&mut self) -> Result<Token, Error> {
        self.buf.skip_until(|b| !is_blank(b))?;

        let start = self.buf.offset();
        match self.buf.peek()? {
            None => Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start),
            }),
            Some(b'\n') => {
                self.buf.consume(1);
                Ok(Token {
                    kind: TokenKind::Newline,
                    span: Span::single(start),
                })
            }
            Some(_) => {
                self.buf.take_until(|b| is_blank(b) || b == b'\n', |sd| {
                    match std::str::from_utf8(sd.data) {
                        Ok(s) => Ok(Token {
                            kind: TokenKind::Word(s.to_string()),
                            span: sd.span,
                        }),
                        Err(_) => Err(Error::MalformedHeader {
                            msg: format!("invalid UTF-8 in header: {}", debug_fmt_bytes(sd.data)),
                            span: sd.span,
                        }),
                    }
                }).map_err(|e| e.map_too_long(|| malformed("header token too long", Span::single(start))))
            }
        }
    }

    /// Returns the raw text until the end of the line (without the
    /// linebreak, which is not consumed). Leading and trailing whitespace is
    /// removed.
    fn rest_of_line(&mut self) -> Result<String, Error> {
        self.buf.skip_until(|b| !is_blank(b))?;

        let start = self.buf.offset();
        self.buf.take_until(b'\n', |sd| Ok(sd.as_str_lossy().trim_end().to_string()))
            .map_err(|e| e.map_too_long(|| malformed("header line too long", Span::single(start))))
    }

    fn offset(&self) -> usize {
        self.buf.offset()
    }
}


// ===========================================================================
// ===== Parser
// ===========================================================================

/// States of the header parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing read yet; expecting the `ply` magic.
    Start,

    /// Expecting a line starting with a keyword.
    Keywords,

    /// `end_header` was read.
    End,
}

struct HeaderParser<'a, B: ParseBuf> {
    tokens: Tokenizer<'a, B>,
    state: State,
    encoding: Option<Encoding>,
    comments: Vec<String>,
    element_defs: Vec<ElementDef>,
    counts: Vec<u64>,
}

fn malformed(msg: impl Into<String>, span: Span) -> Error {
    Error::MalformedHeader {
        msg: msg.into(),
        span,
    }
}

impl<'a, B: ParseBuf> HeaderParser<'a, B> {
    fn new(buf: &'a mut B) -> Self {
        Self {
            tokens: Tokenizer::new(buf),
            state: State::Start,
            encoding: None,
            comments: Vec::new(),
            element_defs: Vec::new(),
            counts: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Header, Error> {
        loop {
            self.state = match self.state {
                State::Start => self.parse_magic()?,
                State::Keywords => self.parse_line()?,
                State::End => break,
            };
        }

        // Checked when `end_header` was read.
        let encoding = match self.encoding {
            Some(encoding) => encoding,
            None => return Err(malformed("missing 'format' line", Span::single(0))),
        };

        Ok(Header {
            encoding,
            comments: self.comments,
            element_defs: self.element_defs,
            counts: self.counts,
            body_offset: self.tokens.offset(),
        })
    }

    // ----- Token helpers ---------------------------------------------------

    /// Requires the next token to be a word. `what` describes the expected
    /// word for the error message.
    fn expect_word(&mut self, what: &str) -> Result<(String, Span), Error> {
        let token = self.tokens.next_token()?;
        match token.kind {
            TokenKind::Word(w) => Ok((w, token.span)),
            _ => Err(malformed(format!("expected {}, found {}", what, token.describe()), token.span)),
        }
    }

    /// Requires the current line to end here.
    fn expect_line_end(&mut self) -> Result<(), Error> {
        let token = self.tokens.next_token()?;
        match token.kind {
            TokenKind::Newline => Ok(()),
            _ => Err(malformed(format!("expected end of line, found {}", token.describe()), token.span)),
        }
    }

    fn scalar_type(word: &str) -> Result<ScalarType, Error> {
        word.parse()
    }

    // ----- States ------------------------------------------------------------

    /// PLY files always start with `ply`. This serves as magic number.
    fn parse_magic(&mut self) -> Result<State, Error> {
        let token = self.tokens.next_token()?;
        if token.kind != TokenKind::Word("ply".into()) {
            return Err(malformed(
                format!("not a PLY file: expected \"ply\", found {}", token.describe()),
                token.span,
            ));
        }

        self.expect_line_end()?;
        Ok(State::Keywords)
    }

    /// Parses one line of the header body.
    fn parse_line(&mut self) -> Result<State, Error> {
        let token = self.tokens.next_token()?;
        let keyword = match token.kind {
            TokenKind::Word(w) => w,

            // Empty lines are ignored.
            TokenKind::Newline => return Ok(State::Keywords),

            TokenKind::Eof => {
                return Err(malformed("header ended without 'end_header' line", token.span));
            }
        };

        match keyword.as_str() {
            "format" => self.parse_format(token.span)?,
            "comment" => {
                let comment = self.tokens.rest_of_line()?;
                self.comments.push(comment);
                self.expect_line_end()?;
            }
            "element" => self.parse_element()?,
            "property" => self.parse_property(token.span)?,
            "end_header" => {
                if self.encoding.is_none() {
                    return Err(malformed("'end_header' before 'format' line", token.span));
                }

                // A header without any body may end right here.
                let end = self.tokens.next_token()?;
                return match end.kind {
                    TokenKind::Newline | TokenKind::Eof => Ok(State::End),
                    _ => Err(malformed(
                        format!("expected end of line, found {}", end.describe()),
                        end.span,
                    )),
                };
            }
            "ply" => {
                return Err(malformed("\"ply\" is only allowed as the very first token", token.span));
            }
            other => {
                return Err(malformed(
                    format!(
                        "expected \"format\", \"comment\", \"element\", \"property\" or \
                            \"end_header\", found {:?}",
                        other,
                    ),
                    token.span,
                ));
            }
        }

        Ok(State::Keywords)
    }

    /// `format <encoding> <version>`
    fn parse_format(&mut self, keyword_span: Span) -> Result<(), Error> {
        if self.encoding.is_some() {
            return Err(malformed("duplicate 'format' line", keyword_span));
        }

        let (name, span) = self.expect_word("format name")?;
        let encoding = Encoding::from_header_name(&name).ok_or_else(|| malformed(
            format!(
                "expected \"ascii\", \"binary_little_endian\" or \"binary_big_endian\", \
                    found {:?}",
                name,
            ),
            span,
        ))?;

        let (version, _) = self.expect_word("format version")?;
        if version != PLY_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        self.expect_line_end()?;
        self.encoding = Some(encoding);
        Ok(())
    }

    /// `element <name> <count>`, e.g. `element vertex 8`
    fn parse_element(&mut self) -> Result<(), Error> {
        let (name, name_span) = self.expect_word("element name")?;
        let (count, count_span) = self.expect_word("element count")?;
        let count = count.parse::<u64>().map_err(|e| {
            malformed(format!("invalid element count {:?} ({})", count, e), count_span)
        })?;
        self.expect_line_end()?;

        if self.element_defs.iter().any(|def| def.name == name) {
            return Err(malformed(format!("duplicate element '{}'", name), name_span));
        }

        self.element_defs.push(ElementDef::new(name));
        self.counts.push(count);
        Ok(())
    }

    /// `property <type> <name>` or `property list <len_type> <type> <name>`.
    /// The property is added to the last element.
    fn parse_property(&mut self, keyword_span: Span) -> Result<(), Error> {
        let (first, _) = self.expect_word("property type")?;
        let ty = if first == "list" {
            let (len_type, _) = self.expect_word("list length type")?;
            let (scalar_type, _) = self.expect_word("list entry type")?;
            PropertyType::List {
                len_type: Self::scalar_type(&len_type)?,
                scalar_type: Self::scalar_type(&scalar_type)?,
            }
        } else {
            PropertyType::Scalar(Self::scalar_type(&first)?)
        };

        let (name, name_span) = self.expect_word("property name")?;
        self.expect_line_end()?;

        let line_span = Span::new(keyword_span.lo, name_span.hi);
        if let Err(msg) = ty.validate() {
            return Err(malformed(format!("property '{}': {}", name, msg), line_span));
        }

        let elem = match self.element_defs.last_mut() {
            Some(elem) => elem,
            None => {
                return Err(Error::NoCurrentElement {
                    property: name,
                    span: line_span,
                });
            }
        };

        if elem.property(&name).is_some() {
            return Err(malformed(
                format!("duplicate property '{}' in element '{}'", name, elem.name),
                name_span,
            ));
        }

        elem.property_defs.push(PropertyDef { name, ty });
        Ok(())
    }
}
