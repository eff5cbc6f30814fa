//! Syntax highlighting for fenced code blocks
//!
//! Uses tree-sitter grammars; every leaf token becomes a text node or a
//! classed `<span>`, and the gaps between tokens are kept verbatim, so the
//! flattened text of the output always equals the input.

use crate::error::HighlightError;
use crate::tree::{Element, Node};

/// Languages with a bundled grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Rust
    Rust,
    /// TypeScript (also used for JavaScript)
    TypeScript,
    /// TSX (also used for JSX)
    Tsx,
    /// Python
    Python,
    /// Go
    Go,
}

impl Language {
    /// Resolve a fence info-string tag
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "rust" | "rs" => Some(Self::Rust),
            "typescript" | "ts" | "javascript" | "js" | "mjs" | "cjs" => Some(Self::TypeScript),
            "tsx" | "jsx" => Some(Self::Tsx),
            "python" | "py" => Some(Self::Python),
            "go" | "golang" => Some(Self::Go),
            _ => None,
        }
    }

    /// Get human-readable name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Python => "python",
            Language::Go => "go",
        }
    }

    fn grammar(self) -> tree_sitter::Language {
        match self {
            Language::Rust => tree_sitter_rust::LANGUAGE.into(),
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::Go => tree_sitter_go::LANGUAGE.into(),
        }
    }
}

/// Turns a code block into highlighted nodes
///
/// Implementations must return nodes whose flattened text equals `code`.
pub trait Highlighter: Send + Sync {
    /// Highlight `code` declared with fence tag `lang`
    fn highlight(&self, lang: &str, code: &str) -> Result<Vec<Node>, HighlightError>;
}

/// Highlighter that never highlights; every block degrades to plain
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, lang: &str, _code: &str) -> Result<Vec<Node>, HighlightError> {
        Err(HighlightError::UnknownLanguage(lang.to_string()))
    }
}

/// Tree-sitter backed highlighter
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSitterHighlighter;

impl TreeSitterHighlighter {
    /// Create new highlighter
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Highlighter for TreeSitterHighlighter {
    fn highlight(&self, lang: &str, code: &str) -> Result<Vec<Node>, HighlightError> {
        let language =
            Language::from_tag(lang).ok_or_else(|| HighlightError::UnknownLanguage(lang.to_string()))?;

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&language.grammar())
            .map_err(|e| HighlightError::grammar(language.name(), e.to_string()))?;

        let tree = parser
            .parse(code, None)
            .ok_or_else(|| HighlightError::syntax(language.name()))?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(HighlightError::syntax(language.name()));
        }

        let mut emitter = Emitter {
            source: code,
            language,
            pos: 0,
            out: Vec::new(),
        };
        emitter.visit(root)?;
        emitter.finish()
    }
}

struct Emitter<'a> {
    source: &'a str,
    language: Language,
    pos: usize,
    out: Vec<Node>,
}

impl Emitter<'_> {
    fn visit(&mut self, node: tree_sitter::Node<'_>) -> Result<(), HighlightError> {
        if node.start_byte() == node.end_byte() {
            return Ok(());
        }

        if let Some(class) = atomic_class(node.kind()) {
            return self.token(node, Some(class));
        }

        if node.child_count() == 0 {
            return self.token(node, leaf_class(node));
        }

        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        for child in children {
            self.visit(child)?;
        }
        Ok(())
    }

    fn token(
        &mut self,
        node: tree_sitter::Node<'_>,
        class: Option<&'static str>,
    ) -> Result<(), HighlightError> {
        let (start, end) = (node.start_byte(), node.end_byte());
        if start < self.pos {
            return Err(HighlightError::syntax(self.language.name()));
        }
        self.gap(start)?;
        let text = self.slice(start, end)?.to_string();
        self.out.push(match class {
            Some(class) => Element::new("span").with_class(class).with_text(text).into(),
            None => Node::Text(text),
        });
        self.pos = end;
        Ok(())
    }

    fn gap(&mut self, until: usize) -> Result<(), HighlightError> {
        if until > self.pos {
            let text = self.slice(self.pos, until)?.to_string();
            self.out.push(Node::Text(text));
            self.pos = until;
        }
        Ok(())
    }

    fn slice(&self, start: usize, end: usize) -> Result<&str, HighlightError> {
        self.source
            .get(start..end)
            .ok_or_else(|| HighlightError::syntax(self.language.name()))
    }

    fn finish(mut self) -> Result<Vec<Node>, HighlightError> {
        self.gap(self.source.len())?;
        Ok(self.out)
    }
}

/// Node kinds highlighted as one span without descending
fn atomic_class(kind: &str) -> Option<&'static str> {
    if kind.contains("comment") {
        Some("hl-comment")
    } else if kind.contains("string") || kind == "char_literal" || kind == "rune_literal" {
        Some("hl-string")
    } else {
        None
    }
}

fn leaf_class(node: tree_sitter::Node<'_>) -> Option<&'static str> {
    let kind = node.kind();
    match kind {
        "integer_literal" | "float_literal" | "integer" | "float" | "number" | "int_literal"
        | "imaginary_literal" => return Some("hl-number"),
        "type_identifier" | "primitive_type" | "predefined_type" => return Some("hl-type"),
        "true" | "false" | "none" | "null" | "undefined" | "nil" | "self" => {
            return Some("hl-keyword")
        }
        _ => {}
    }

    if !node.is_named() && kind.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
        return Some("hl-keyword");
    }

    if kind.ends_with("identifier") && is_function_name(node) {
        return Some("hl-function");
    }

    None
}

fn is_function_name(node: tree_sitter::Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    let parent_kind = parent.kind();
    if !(parent_kind.contains("function") || parent_kind.contains("method")) {
        return false;
    }
    parent
        .child_by_field_name("name")
        .is_some_and(|name| name.id() == node.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flatten(nodes: &[Node]) -> String {
        nodes.iter().map(Node::text_content).collect()
    }

    fn spans_with(nodes: &[Node], class: &str) -> Vec<String> {
        nodes
            .iter()
            .filter_map(Node::as_element)
            .filter(|el| el.has_class(class))
            .map(Element::text)
            .collect()
    }

    #[test]
    fn language_tags() {
        assert_eq!(Language::from_tag("rs"), Some(Language::Rust));
        assert_eq!(Language::from_tag(" Python "), Some(Language::Python));
        assert_eq!(Language::from_tag("js"), Some(Language::TypeScript));
        assert_eq!(Language::from_tag("cobol"), None);
    }

    #[test]
    fn rust_keywords_and_strings() {
        let code = "fn main() {\n    let s = \"hi\"; // greet\n}\n";
        let nodes = TreeSitterHighlighter.highlight("rust", code).unwrap();

        assert_eq!(flatten(&nodes), code);
        assert!(spans_with(&nodes, "hl-keyword").contains(&"fn".to_string()));
        assert!(spans_with(&nodes, "hl-keyword").contains(&"let".to_string()));
        assert_eq!(spans_with(&nodes, "hl-string"), vec!["\"hi\"".to_string()]);
        let comments = spans_with(&nodes, "hl-comment");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].trim_end(), "// greet");
        assert_eq!(spans_with(&nodes, "hl-function"), vec!["main".to_string()]);
    }

    #[test]
    fn python_text_is_preserved() {
        let code = "def total(a, b):\n    return a + b  # sum\n";
        let nodes = TreeSitterHighlighter.highlight("py", code).unwrap();
        assert_eq!(flatten(&nodes), code);
        assert!(spans_with(&nodes, "hl-keyword").contains(&"def".to_string()));
    }

    #[test]
    fn unknown_language_fails() {
        let err = TreeSitterHighlighter.highlight("cobol", "DISPLAY 'X'.").unwrap_err();
        assert_eq!(err, HighlightError::UnknownLanguage("cobol".to_string()));
    }

    #[test]
    fn syntax_errors_fail() {
        let err = TreeSitterHighlighter.highlight("rust", "fn (((").unwrap_err();
        assert!(matches!(err, HighlightError::Syntax { .. }));
    }

    #[test]
    fn plain_highlighter_always_fails() {
        assert!(PlainHighlighter.highlight("rust", "fn main() {}").is_err());
    }
}
