use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::document::{Attribute, Document, Element, Node};

/// Error returned when the input is not a well-formed XML document.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    /// Tokenizer-level failure (bad markup, mismatched end tag, bad entity).
    #[error("malformed XML at byte {position}: {message}")]
    Syntax {
        /// Byte offset reported by the reader.
        position: u64,
        /// Underlying reader message.
        message: String,
    },
    /// The input ended while an element was still open.
    #[error("unexpected end of document: <{open}> is not closed")]
    UnexpectedEof {
        /// Name of the innermost open element.
        open: String,
    },
    /// A second top-level element was found.
    #[error("second root element at byte {position}")]
    MultipleRoots {
        /// Byte offset of the offending element.
        position: u64,
    },
    /// Non-whitespace character data outside the root element.
    #[error("text outside the root element at byte {position}")]
    TextOutsideRoot {
        /// Byte offset of the text.
        position: u64,
    },
    /// No element at all.
    #[error("document has no root element")]
    NoRoot,
    /// An element or attribute name uses an undeclared prefix.
    #[error("namespace prefix `{prefix}` is not bound")]
    UnboundPrefix {
        /// The undeclared prefix.
        prefix: String,
    },
    /// Elements are nested deeper than [`MAX_DEPTH`].
    #[error("element at byte {position} is nested deeper than {} levels", MAX_DEPTH)]
    TooDeep {
        /// Byte offset of the element that crossed the limit.
        position: u64,
    },
    /// Input bytes are not UTF-8.
    #[error("document is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Deepest element nesting accepted, counting the root as 1. Same default
/// as libxml2.
pub const MAX_DEPTH: usize = 256;

/// Decodes UTF-8 bytes (an optional BOM is skipped) and parses them.
pub fn parse_bytes(bytes: &[u8]) -> Result<Document, ParseError> {
    let text = std::str::from_utf8(bytes)?;
    parse_document(text)
}

/// Parses a complete XML document.
pub fn parse_document(xml: &str) -> Result<Document, ParseError> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = true;

    let mut builder = TreeBuilder::default();
    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event()
            .map_err(|err| syntax(reader.buffer_position() as u64, err))?;
        match event {
            Event::Start(start) => {
                let element = builder.open(&start, position)?;
                builder.stack.push(element);
            }
            Event::Empty(start) => {
                let element = builder.open(&start, position)?;
                builder.scopes.pop();
                builder.close(element);
            }
            Event::End(_) => {
                // End names are checked by the reader.
                if let Some(element) = builder.stack.pop() {
                    builder.scopes.pop();
                    builder.close(element);
                }
            }
            Event::Text(text) => {
                let raw = utf8(&text)?;
                if raw.contains("]]>") {
                    return Err(syntax(position, "`]]>` is not allowed in character data"));
                }
                let normalized = normalize_line_ends(raw);
                let unescaped = quick_xml::escape::unescape(&normalized)
                    .map_err(|err| syntax(position, err))?;
                builder.text(&unescaped, position)?;
            }
            Event::CData(cdata) => {
                let raw = utf8(&cdata)?;
                builder.text(&normalize_line_ends(raw), position)?;
            }
            Event::Comment(comment) => {
                let raw = utf8(&comment)?;
                if raw.contains("--") || raw.ends_with('-') {
                    return Err(syntax(position, "`--` is not allowed inside a comment"));
                }
                builder.misc(Node::Comment(normalize_line_ends(raw).into_owned()));
            }
            Event::PI(pi) => {
                let raw = normalize_line_ends(utf8(&pi)?);
                let (target, data) = match raw.find(is_xml_whitespace) {
                    Some(idx) => (&raw[..idx], raw[idx..].trim_start_matches(is_xml_whitespace)),
                    None => (&raw[..], ""),
                };
                check_name(target, position)?;
                builder.misc(Node::ProcessingInstruction {
                    target: target.to_string(),
                    data: data.to_string(),
                });
            }
            Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }
    builder.finish()
}

#[derive(Default)]
struct TreeBuilder {
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
    stack: Vec<Element>,
    /// Prefixes declared on each open element, innermost last.
    scopes: Vec<Vec<String>>,
}

impl TreeBuilder {
    fn open(&mut self, start: &BytesStart<'_>, position: u64) -> Result<Element, ParseError> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(ParseError::MultipleRoots { position });
        }
        if self.stack.len() >= MAX_DEPTH {
            return Err(ParseError::TooDeep { position });
        }

        let name = utf8(start.name().as_ref())?.to_string();
        check_name(&name, position)?;
        let mut element = Element::new(name);
        let mut declared = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|err| syntax(position, err))?;
            let key = utf8(attr.key.as_ref())?.to_string();
            check_name(&key, position)?;
            let raw = utf8(&attr.value)?;
            if raw.contains('<') {
                return Err(syntax(
                    position,
                    format!("`<` is not allowed in the value of attribute `{}`", key),
                ));
            }
            let value = quick_xml::escape::unescape(&normalize_attribute_whitespace(raw))
                .map_err(|err| syntax(position, err))?
                .into_owned();
            if let Some(prefix) = key.strip_prefix("xmlns:") {
                declared.push(prefix.to_string());
            }
            element.attributes.push(Attribute { name: key, value });
        }
        self.scopes.push(declared);

        self.check_bound(&element.name)?;
        for attr in &element.attributes {
            if attr.name != "xmlns" && !attr.name.starts_with("xmlns:") {
                self.check_bound(&attr.name)?;
            }
        }

        Ok(element)
    }

    fn check_bound(&self, qname: &str) -> Result<(), ParseError> {
        let Some((prefix, _)) = qname.split_once(':') else {
            return Ok(());
        };
        let bound = prefix == "xml"
            || self
                .scopes
                .iter()
                .any(|scope| scope.iter().any(|declared| declared == prefix));
        if bound {
            Ok(())
        } else {
            Err(ParseError::UnboundPrefix {
                prefix: prefix.to_string(),
            })
        }
    }

    /// Attaches a finished element to its parent, or makes it the root.
    fn close(&mut self, element: Element) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None => self.root = Some(element),
        }
    }

    fn text(&mut self, text: &str, position: u64) -> Result<(), ParseError> {
        match self.stack.last_mut() {
            Some(parent) => {
                if let Some(Node::Text(existing)) = parent.children.last_mut() {
                    existing.push_str(text);
                } else if !text.is_empty() {
                    parent.children.push(Node::Text(text.to_string()));
                }
                Ok(())
            }
            None if text.chars().all(is_xml_whitespace) => Ok(()),
            None => Err(ParseError::TextOutsideRoot { position }),
        }
    }

    fn misc(&mut self, node: Node) {
        match (self.stack.last_mut(), self.root.is_some()) {
            (Some(parent), _) => parent.children.push(node),
            (None, false) => self.prolog.push(node),
            (None, true) => self.epilog.push(node),
        }
    }

    fn finish(mut self) -> Result<Document, ParseError> {
        if let Some(open) = self.stack.pop() {
            return Err(ParseError::UnexpectedEof { open: open.name });
        }
        let root = self.root.ok_or(ParseError::NoRoot)?;
        Ok(Document {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

fn syntax(position: u64, err: impl std::fmt::Display) -> ParseError {
    ParseError::Syntax {
        position,
        message: err.to_string(),
    }
}

/// Checks `name` against the XML `Name` production.
fn check_name(name: &str, position: u64) -> Result<(), ParseError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char);
    if valid {
        Ok(())
    } else {
        Err(syntax(position, format!("`{}` is not a valid XML name", name)))
    }
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

fn utf8(bytes: &[u8]) -> Result<&str, ParseError> {
    Ok(std::str::from_utf8(bytes)?)
}

fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn is_tab_or_lf(c: char) -> bool {
    c == '\t' || c == '\n'
}

/// `\r\n` and lone `\r` become `\n`.
fn normalize_line_ends(raw: &str) -> Cow<'_, str> {
    if raw.contains('\r') {
        Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Literal whitespace in attribute values becomes a single space each.
/// Character references are decoded afterwards and are not affected.
fn normalize_attribute_whitespace(raw: &str) -> Cow<'_, str> {
    match normalize_line_ends(raw) {
        Cow::Borrowed(s) if !s.contains(is_tab_or_lf) => Cow::Borrowed(s),
        normalized => Cow::Owned(normalized.replace(is_tab_or_lf, " ")),
    }
}
