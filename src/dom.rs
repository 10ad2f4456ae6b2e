//! Fragment tree.
//!
//! A parsed fragment is a flat list of root [`Node`]s. Each element owns its
//! attributes and children exclusively; trees live for a single clean call.

/// One attribute of an element, with its value already entity-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name (lowercased by the parser)
    pub name: String,
    /// Decoded attribute value
    pub value: String,
}

impl Attribute {
    /// Creates an attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an element with no attributes or children.
    ///
    /// The name is lowercased.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn from_parts(name: String, attrs: Vec<Attribute>) -> Self {
        Self {
            name,
            attrs,
            children: Vec::new(),
        }
    }

    /// Returns the lowercase element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the element. The new name is lowercased.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into().to_ascii_lowercase();
    }

    /// Returns the value of an attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Returns `true` if the attribute is present.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Sets an attribute, replacing the value in place if it already exists
    /// and appending it otherwise.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attrs.push(Attribute { name, value }),
        }
    }

    /// Removes an attribute and returns its value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(pos).value)
    }

    /// Keeps only the attributes for which `keep` returns `true`.
    pub fn retain_attrs(&mut self, keep: impl FnMut(&Attribute) -> bool) {
        self.attrs.retain(keep);
    }

    /// Attributes in source order.
    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Child nodes in source order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Mutable access to the child list.
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Appends a child node.
    pub fn push_child(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        text_of(&self.children)
    }

    pub(crate) fn take_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    pub(crate) fn set_children(&mut self, children: Vec<Node>) {
        self.children = children;
    }
}

/// A node of a parsed fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with attributes and children
    Element(Element),
    /// Decoded character data
    Text(String),
    /// Comment body, without the `<!--`/`-->` delimiters
    Comment(String),
}

impl Node {
    /// Shorthand for a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    /// Returns `true` for element nodes.
    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// Returns the element, if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the element mutably, if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Element name, or `None` for text and comments.
    pub fn name(&self) -> Option<&str> {
        self.as_element().map(Element::name)
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

/// A parsed HTML fragment: zero or more root nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    /// Parses markup into a fragment. Never fails.
    pub fn parse(input: &str) -> Self {
        crate::parser::parse_fragment(input)
    }

    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Root nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Concatenated text of every text node, in document order.
    pub fn text_content(&self) -> String {
        text_of(&self.nodes)
    }

    /// Serializes the fragment back to markup.
    pub fn to_html(&self) -> String {
        crate::serializer::serialize(&self.nodes)
    }
}

fn text_of(nodes: &[Node]) -> String {
    let mut out = String::new();
    let mut stack: Vec<&Node> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => stack.extend(e.children.iter().rev()),
            Node::Comment(_) => {}
        }
    }
    out
}
