use std::mem;

use crate::canonicalizer::fingerprint;

/// A parsed XML document.
///
/// Only comments and processing instructions survive outside the root
/// element; the XML declaration and any DOCTYPE are dropped at parse time
/// because the canonical form never emits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Comments and processing instructions before the root element.
    pub prolog: Vec<Node>,
    /// The document element.
    pub root: Element,
    /// Comments and processing instructions after the root element.
    pub epilog: Vec<Node>,
}

impl Document {
    /// Creates a document with the given root and no prolog or epilog.
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }
}

/// A single attribute as written in the source, qualified name included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified attribute name (`prefix:local` or `local`).
    pub name: String,
    /// Unescaped attribute value.
    pub value: String,
}

/// Child node of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element.
    Element(Element),
    /// Character data, unescaped. CDATA sections are folded in here.
    Text(String),
    /// Comment body without the `<!--`/`-->` delimiters.
    Comment(String),
    /// Processing instruction.
    ProcessingInstruction {
        /// PI target.
        target: String,
        /// PI data, possibly empty.
        data: String,
    },
}

/// An XML element: tag name, ordered attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Qualified tag name.
    pub name: String,
    /// Attributes in source order. Canonical ordering is applied on output.
    pub attributes: Vec<Attribute>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Returns the value of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Sets an attribute, replacing an existing value in place or appending.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// Removes an attribute, returning its previous value if it was present.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|attr| attr.name == name)?;
        Some(self.attributes.remove(idx).value)
    }

    /// Iterates over the direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Iterates mutably over the direct child elements.
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Finds a descendant by a slash-separated path of tag names relative to
    /// this element. Each step takes the first matching child.
    pub fn find(&self, path: &str) -> Option<&Element> {
        let mut current = self;
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = current.child_elements().find(|e| e.name == step)?;
        }
        Some(current)
    }

    /// Mutable counterpart of [`Element::find`].
    pub fn find_mut(&mut self, path: &str) -> Option<&mut Element> {
        let mut current = self;
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = current.child_elements_mut().find(|e| e.name == step)?;
        }
        Some(current)
    }

    /// Visits this element and every descendant element in document order
    /// (pre-order), stopping at the first error.
    pub fn visit_elements_mut<E, F>(&mut self, visit: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut Element) -> Result<(), E>,
    {
        visit(self)?;
        for child in self.child_elements_mut() {
            child.visit_elements_mut(visit)?;
        }
        Ok(())
    }

    /// Reorders the child elements by `key`.
    ///
    /// Text, comment and PI children stay in their slots; only elements move,
    /// and they fill the element slots in key order. Equal keys fall back to
    /// the elements' serialized content, so the resulting order never depends
    /// on the original one. Returns `true` if any element moved.
    pub fn sort_child_elements_by_key<K, F>(&mut self, mut key: F) -> bool
    where
        K: Ord,
        F: FnMut(&Element) -> K,
    {
        let slots: Vec<usize> = self
            .children
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node, Node::Element(_)))
            .map(|(idx, _)| idx)
            .collect();
        if slots.len() < 2 {
            return false;
        }

        let mut keyed = Vec::with_capacity(slots.len());
        for (original, &slot) in slots.iter().enumerate() {
            if let Node::Element(element) = mem::replace(&mut self.children[slot], Node::Text(String::new())) {
                keyed.push((key(&element), fingerprint(&element), original, element));
            }
        }
        keyed.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));

        let mut moved = false;
        for (position, (slot, (_, _, original, element))) in slots.iter().zip(keyed).enumerate() {
            moved |= original != position;
            self.children[*slot] = Node::Element(element);
        }
        moved
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}
