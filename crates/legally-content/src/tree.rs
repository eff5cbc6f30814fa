//! Parsed-document tree
//!
//! The renderer builds this tree directly from markdown events and the
//! classifier and annotator operate on it; HTML only appears at
//! serialization time. Text nodes hold unescaped text.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// A node of a rendered fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// An HTML element
    Element(Element),
    /// Literal (unescaped) text
    Text(String),
}

/// An HTML element with an ordered class set and attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name, lowercase
    pub tag: String,
    /// Class names, in insertion order, without duplicates
    pub classes: Vec<String>,
    /// Attributes other than `class`, in insertion order
    pub attrs: Vec<(String, String)>,
    /// Child nodes
    pub children: Vec<Node>,
}

/// Elements serialized without a closing tag
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input"];

impl Element {
    /// Create empty element
    #[inline]
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// With class (builder)
    #[inline]
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class(class);
        self
    }

    /// With attribute (builder)
    #[inline]
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// With children (builder)
    #[inline]
    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// With a single text child (builder)
    #[inline]
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Add class if not already present. Returns true if it was added.
    pub fn add_class(&mut self, class: impl Into<String>) -> bool {
        let class = class.into();
        if self.has_class(&class) {
            return false;
        }
        self.classes.push(class);
        true
    }

    /// Check class membership
    #[inline]
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Attribute value by name
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Heading level for `h1`..`h6`
    #[must_use]
    pub fn heading_level(&self) -> Option<u8> {
        let rest = self.tag.strip_prefix('h')?;
        match rest.parse::<u8>() {
            Ok(level @ 1..=6) => Some(level),
            _ => None,
        }
    }

    /// Flattened text of all descendants
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if !self.classes.is_empty() {
            out.push_str(" class=\"");
            escape_into(&self.classes.join(" "), out);
            out.push('"');
        }
        for (name, value) in &self.attrs {
            let _ = write!(out, " {name}=\"");
            escape_into(value, out);
            out.push('"');
        }
        out.push('>');
        if VOID_TAGS.contains(&self.tag.as_str()) {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

impl Node {
    /// Text node
    #[inline]
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Element view, if this is an element
    #[inline]
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    /// Flattened visible text
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    /// Serialize to HTML
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Text(text) => escape_into(text, out),
            Self::Element(el) => el.write_html(out),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

/// Read access the section classifier needs from a document node
pub trait DocumentNode {
    /// Heading level if the node is a heading
    fn heading_level(&self) -> Option<u8>;

    /// Flattened visible text
    fn text_content(&self) -> String;
}

impl DocumentNode for Node {
    fn heading_level(&self) -> Option<u8> {
        self.as_element().and_then(Element::heading_level)
    }

    fn text_content(&self) -> String {
        Node::text_content(self)
    }
}

/// Ordered list of sibling nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    /// Create empty fragment
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level nodes
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mutable top-level nodes
    #[inline]
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Append a node
    #[inline]
    pub fn push(&mut self, node: impl Into<Node>) {
        self.nodes.push(node.into());
    }

    /// Append nodes
    #[inline]
    pub fn extend(&mut self, nodes: impl IntoIterator<Item = Node>) {
        self.nodes.extend(nodes);
    }

    /// True if there are no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of top-level nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Flattened visible text
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.collect_text(&mut out);
        }
        out
    }

    /// Serialize to HTML
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_html(&mut out);
        }
        out
    }
}

impl From<Vec<Node>> for Fragment {
    fn from(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }
}

impl FromIterator<Node> for Fragment {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

/// Escape text for HTML (text and attribute values)
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(text, &mut out);
    out
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_serializes_classes_and_attrs_in_order() {
        let el = Element::new("a")
            .with_class("x")
            .with_class("y")
            .with_attr("href", "/doc?a=1&b=2")
            .with_text("link");
        assert_eq!(
            Node::from(el).to_html(),
            r#"<a class="x y" href="/doc?a=1&amp;b=2">link</a>"#
        );
    }

    #[test]
    fn add_class_is_set_like() {
        let mut el = Element::new("p");
        assert!(el.add_class("risk-highlight"));
        assert!(!el.add_class("risk-highlight"));
        assert_eq!(el.classes, vec!["risk-highlight".to_string()]);
    }

    #[test]
    fn text_is_escaped_on_output_only() {
        let node = Node::from(Element::new("p").with_text("<b> & \"q\""));
        assert_eq!(node.text_content(), "<b> & \"q\"");
        assert_eq!(node.to_html(), "<p>&lt;b&gt; &amp; &quot;q&quot;</p>");
    }

    #[test]
    fn void_tags_have_no_closing_tag() {
        let node = Node::from(Element::new("hr"));
        assert_eq!(node.to_html(), "<hr>");
    }

    #[test]
    fn heading_level_detection() {
        assert_eq!(Element::new("h3").heading_level(), Some(3));
        assert_eq!(Element::new("h7").heading_level(), None);
        assert_eq!(Element::new("hr").heading_level(), None);
        assert_eq!(Element::new("p").heading_level(), None);
    }

    #[test]
    fn fragment_text_flattens_nested_nodes() {
        let fragment: Fragment = vec![
            Element::new("ul")
                .with_children(vec![Element::new("li").with_text("one").into()])
                .into(),
            Node::text(" two"),
        ]
        .into();
        assert_eq!(fragment.text(), "one two");
        assert_eq!(fragment.len(), 2);
    }
}
