use std::collections::HashMap;

use crate::document::{Document, Element, Node};

/// Namespace URI bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// A name uses a prefix with no namespace declaration in scope.
    /// Parsed documents never hit this; hand-built trees can.
    #[error("namespace prefix `{prefix}` is not bound on <{element}>")]
    UnboundPrefix {
        /// The undeclared prefix.
        prefix: String,
        /// Element on which the prefix was used.
        element: String,
    },
}

/// Canonical XML 1.0 serializer.
///
/// Output rules:
/// - no XML declaration or DOCTYPE, UTF-8 bytes;
/// - empty elements as start/end pairs;
/// - namespace declarations first (default, then by prefix), only where the
///   binding differs from the parent's;
/// - remaining attributes ordered by (namespace URI, local name);
/// - attribute values double-quoted with `&<"` and TAB/LF/CR escaped;
/// - text with `&<>` and CR escaped;
/// - prolog nodes followed by `\n`, epilog nodes preceded by `\n`.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    with_comments: bool,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Canonicalizer {
    /// Canonical XML with comments, matching lxml's `write_c14n` default.
    pub fn new() -> Self {
        Self {
            with_comments: true,
        }
    }

    /// Canonical XML without comments.
    pub fn without_comments() -> Self {
        Self {
            with_comments: false,
        }
    }

    /// Produces the canonical bytes of a whole document.
    pub fn canonicalize(&self, document: &Document) -> Result<Vec<u8>, CanonicalizationError> {
        Ok(self.canonicalize_to_string(document)?.into_bytes())
    }

    /// Same as [`Canonicalizer::canonicalize`], as a `String`. Used when the
    /// canonical form is itself stored inside an attribute value.
    pub fn canonicalize_to_string(&self, document: &Document) -> Result<String, CanonicalizationError> {
        let mut out = String::new();
        for node in &document.prolog {
            if self.write_misc(&mut out, node) {
                out.push('\n');
            }
        }
        self.write_element(&mut out, &document.root, &Scope::default())?;
        for node in &document.epilog {
            let mark = out.len();
            out.push('\n');
            if !self.write_misc(&mut out, node) {
                out.truncate(mark);
            }
        }
        Ok(out)
    }

    /// Produces the canonical bytes of an element subtree, treating the
    /// element as a document root with no inherited namespaces.
    pub fn canonicalize_element(&self, element: &Element) -> Result<Vec<u8>, CanonicalizationError> {
        let mut out = String::new();
        self.write_element(&mut out, element, &Scope::default())?;
        Ok(out.into_bytes())
    }

    /// Writes a comment or PI outside the root. Returns `false` if nothing
    /// was written.
    fn write_misc(&self, out: &mut String, node: &Node) -> bool {
        match node {
            Node::Comment(_) if !self.with_comments => false,
            Node::Comment(_) | Node::ProcessingInstruction { .. } => {
                write_leaf(out, node);
                true
            }
            Node::Element(_) | Node::Text(_) => false,
        }
    }

    fn write_element(
        &self,
        out: &mut String,
        element: &Element,
        parent: &Scope,
    ) -> Result<(), CanonicalizationError> {
        let scope = parent.enter(element);

        let mut declarations: Vec<(&str, &str)> = Vec::new();
        let mut attributes: Vec<((&str, &str), &str, &str)> = Vec::new();
        for attr in &element.attributes {
            if attr.name == "xmlns" {
                if parent.default_namespace() != attr.value {
                    declarations.push(("", attr.value.as_str()));
                }
            } else if let Some(prefix) = attr.name.strip_prefix("xmlns:") {
                if parent.bindings.get(prefix).map(String::as_str) != Some(attr.value.as_str()) {
                    declarations.push((prefix, attr.value.as_str()));
                }
            } else {
                let key = match attr.name.split_once(':') {
                    Some((prefix, local)) => (scope.resolve(prefix, element)?, local),
                    None => ("", attr.name.as_str()),
                };
                attributes.push((key, attr.name.as_str(), attr.value.as_str()));
            }
        }
        if let Some((prefix, _)) = element.name.split_once(':') {
            scope.resolve(prefix, element)?;
        }
        declarations.sort();
        attributes.sort_by(|a, b| a.0.cmp(&b.0));

        out.push('<');
        out.push_str(&element.name);
        for (prefix, uri) in declarations {
            if prefix.is_empty() {
                out.push_str(" xmlns=\"");
            } else {
                out.push_str(" xmlns:");
                out.push_str(prefix);
                out.push_str("=\"");
            }
            escape_attribute(out, uri);
            out.push('"');
        }
        for (_, name, value) in attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_attribute(out, value);
            out.push('"');
        }
        out.push('>');

        for child in &element.children {
            match child {
                Node::Element(nested) => self.write_element(out, nested, &scope)?,
                Node::Text(text) => escape_text(out, text),
                Node::Comment(_) if !self.with_comments => {}
                leaf => write_leaf(out, leaf),
            }
        }

        out.push_str("</");
        out.push_str(&element.name);
        out.push('>');
        Ok(())
    }
}

/// Namespace bindings in force at an element. The empty prefix is the
/// default namespace.
#[derive(Debug, Clone, Default)]
struct Scope {
    bindings: HashMap<String, String>,
}

impl Scope {
    fn enter(&self, element: &Element) -> Scope {
        let mut bindings = self.bindings.clone();
        for attr in &element.attributes {
            if attr.name == "xmlns" {
                bindings.insert(String::new(), attr.value.clone());
            } else if let Some(prefix) = attr.name.strip_prefix("xmlns:") {
                bindings.insert(prefix.to_string(), attr.value.clone());
            }
        }
        Scope { bindings }
    }

    fn default_namespace(&self) -> &str {
        self.bindings.get("").map(String::as_str).unwrap_or("")
    }

    fn resolve<'s>(&'s self, prefix: &str, element: &Element) -> Result<&'s str, CanonicalizationError> {
        if prefix == "xml" {
            return Ok(XML_NAMESPACE);
        }
        self.bindings
            .get(prefix)
            .map(String::as_str)
            .ok_or_else(|| CanonicalizationError::UnboundPrefix {
                prefix: prefix.to_string(),
                element: element.name.clone(),
            })
    }
}

/// Order-independent serialization of a subtree that needs no namespace
/// context. Used to break ties when sorting siblings.
pub(crate) fn fingerprint(element: &Element) -> Vec<u8> {
    fn write(out: &mut String, element: &Element) {
        let mut attributes: Vec<_> = element.attributes.iter().collect();
        attributes.sort_by(|a, b| a.name.cmp(&b.name));
        out.push('<');
        out.push_str(&element.name);
        for attr in attributes {
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            escape_attribute(out, &attr.value);
            out.push('"');
        }
        out.push('>');
        for child in &element.children {
            match child {
                Node::Element(nested) => write(out, nested),
                Node::Text(text) => escape_text(out, text),
                leaf => write_leaf(out, leaf),
            }
        }
        out.push_str("</");
        out.push_str(&element.name);
        out.push('>');
    }

    let mut out = String::new();
    write(&mut out, element);
    out.into_bytes()
}

fn write_leaf(out: &mut String, node: &Node) {
    match node {
        Node::Comment(body) => {
            out.push_str("<!--");
            out.push_str(body);
            out.push_str("-->");
        }
        Node::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            if !data.is_empty() {
                out.push(' ');
                out.push_str(data);
            }
            out.push_str("?>");
        }
        Node::Element(_) | Node::Text(_) => {}
    }
}

fn escape_attribute(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            other => out.push(other),
        }
    }
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            other => out.push(other),
        }
    }
}
