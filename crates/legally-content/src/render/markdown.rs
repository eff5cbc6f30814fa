//! Markdown renderer
//!
//! Uses pulldown-cmark for parsing and folds the event stream into a
//! [`Fragment`] tree. Raw HTML in the source is kept as escaped text and
//! script-capable link targets are dropped.

use crate::render::highlight::{Highlighter, TreeSitterHighlighter};
use crate::tree::{Element, Fragment, Node};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser as MdParser, Tag};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Text shown when there is no analysis to render
pub const EMPTY_ANALYSIS_TEXT: &str = "Анализ отсутствует.";

/// Rendered markdown output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedFragment {
    fragment: Fragment,
    placeholder: bool,
}

impl RenderedFragment {
    /// Wrap a rendered fragment
    #[inline]
    #[must_use]
    pub fn new(fragment: Fragment) -> Self {
        Self {
            fragment,
            placeholder: false,
        }
    }

    /// Fragment used for missing or blank input
    #[must_use]
    pub fn placeholder() -> Self {
        let mut fragment = Fragment::new();
        fragment.push(
            Element::new("p")
                .with_class("analysis-empty")
                .with_text(EMPTY_ANALYSIS_TEXT),
        );
        Self {
            fragment,
            placeholder: true,
        }
    }

    /// True if this is the no-analysis placeholder
    #[inline]
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Underlying tree
    #[inline]
    #[must_use]
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    /// Take the underlying tree
    #[inline]
    #[must_use]
    pub fn into_fragment(self) -> Fragment {
        self.fragment
    }

    /// Serialize to HTML
    #[inline]
    #[must_use]
    pub fn to_html(&self) -> String {
        self.fragment.to_html()
    }
}

/// Markdown to tree renderer
#[derive(Clone)]
pub struct MarkdownRenderer {
    highlighter: Arc<dyn Highlighter>,
    options: Options,
}

impl std::fmt::Debug for MarkdownRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownRenderer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Create renderer with the tree-sitter highlighter
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_highlighter(Arc::new(TreeSitterHighlighter::new()))
    }

    /// Create renderer with a specific highlighter
    #[must_use]
    pub fn with_highlighter(highlighter: Arc<dyn Highlighter>) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self {
            highlighter,
            options,
        }
    }

    /// Render markdown; blank input yields [`RenderedFragment::placeholder`]
    #[must_use]
    pub fn render(&self, markdown: &str) -> RenderedFragment {
        if markdown.trim().is_empty() {
            return RenderedFragment::placeholder();
        }

        let mut builder = TreeBuilder::new(self.highlighter.as_ref());
        for event in MdParser::new_ext(markdown, self.options) {
            builder.event(event);
        }
        RenderedFragment::new(builder.finish())
    }

    /// Render optional markdown, treating `None` as blank
    #[inline]
    #[must_use]
    pub fn render_opt(&self, markdown: Option<&str>) -> RenderedFragment {
        self.render(markdown.unwrap_or_default())
    }
}

/// Open element on the builder stack
struct Frame {
    element: Element,
    kind: FrameKind,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Plain,
    Image,
    TableHead,
}

struct PendingCode {
    language: Option<String>,
    code: String,
}

struct TreeBuilder<'h> {
    highlighter: &'h dyn Highlighter,
    root: Vec<Node>,
    stack: Vec<Frame>,
    code: Option<PendingCode>,
    in_table_head: bool,
}

impl<'h> TreeBuilder<'h> {
    fn new(highlighter: &'h dyn Highlighter) -> Self {
        Self {
            highlighter,
            root: Vec::new(),
            stack: Vec::new(),
            code: None,
            in_table_head: false,
        }
    }

    fn event(&mut self, event: Event<'_>) {
        if let Some(pending) = self.code.as_mut() {
            match event {
                Event::Text(text) => pending.code.push_str(&text),
                Event::End(_) => self.finish_code_block(),
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self.push_node(Element::new("code").with_text(code.to_string()).into()),
            // raw HTML is never passed through
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
            Event::FootnoteReference(label) => self.push_node(
                Element::new("sup")
                    .with_class("footnote-reference")
                    .with_text(label.to_string())
                    .into(),
            ),
            Event::SoftBreak => self.push_text("\n"),
            Event::HardBreak => self.push_node(Element::new("br").into()),
            Event::Rule => self.push_node(Element::new("hr").into()),
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "");
                if checked {
                    input = input.with_attr("checked", "");
                }
                self.push_node(input.into());
            }
            other => {
                tracing::debug!("unsupported markdown event rendered as text: {:?}", other);
                if let Event::InlineMath(text) | Event::DisplayMath(text) = other {
                    self.push_text(&text);
                }
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let (element, kind) = match tag {
            Tag::Paragraph | Tag::HtmlBlock => (Element::new("p"), FrameKind::Plain),
            Tag::Heading { level, .. } => (Element::new(format!("h{}", level as u8)), FrameKind::Plain),
            Tag::BlockQuote(_) => (Element::new("blockquote"), FrameKind::Plain),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(PendingCode {
                    language,
                    code: String::new(),
                });
                return;
            }
            Tag::List(Some(start)) => {
                let mut ol = Element::new("ol");
                if start != 1 {
                    ol = ol.with_attr("start", start.to_string());
                }
                (ol, FrameKind::Plain)
            }
            Tag::List(None) => (Element::new("ul"), FrameKind::Plain),
            Tag::Item => (Element::new("li"), FrameKind::Plain),
            Tag::Table(_) => (Element::new("table"), FrameKind::Plain),
            Tag::TableHead => {
                self.in_table_head = true;
                (Element::new("thead"), FrameKind::TableHead)
            }
            Tag::TableRow => (Element::new("tr"), FrameKind::Plain),
            Tag::TableCell => {
                let cell = if self.in_table_head { "th" } else { "td" };
                (Element::new(cell), FrameKind::Plain)
            }
            Tag::Emphasis => (Element::new("em"), FrameKind::Plain),
            Tag::Strong => (Element::new("strong"), FrameKind::Plain),
            Tag::Strikethrough => (Element::new("del"), FrameKind::Plain),
            Tag::Link { dest_url, title, .. } => {
                let mut a = Element::new("a");
                if is_safe_url(&dest_url) {
                    a = a.with_attr("href", dest_url.to_string());
                }
                if !title.is_empty() {
                    a = a.with_attr("title", title.to_string());
                }
                (a, FrameKind::Plain)
            }
            Tag::Image { dest_url, title, .. } => {
                let mut img = Element::new("img");
                if is_safe_url(&dest_url) {
                    img = img.with_attr("src", dest_url.to_string());
                }
                if !title.is_empty() {
                    img = img.with_attr("title", title.to_string());
                }
                (img, FrameKind::Image)
            }
            Tag::FootnoteDefinition(label) => (
                Element::new("div")
                    .with_class("footnote-definition")
                    .with_attr("id", label.to_string()),
                FrameKind::Plain,
            ),
            _ => (Element::new("div"), FrameKind::Plain),
        };
        self.stack.push(Frame { element, kind });
    }

    fn end(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let mut element = frame.element;
        match frame.kind {
            FrameKind::Plain => {}
            FrameKind::Image => {
                let alt = element.text();
                element.children.clear();
                element.attrs.insert(0, ("alt".to_string(), alt));
            }
            FrameKind::TableHead => {
                self.in_table_head = false;
                let cells = std::mem::take(&mut element.children);
                element.children.push(Element::new("tr").with_children(cells).into());
            }
        }
        self.push_node(element.into());
    }

    fn finish_code_block(&mut self) {
        let Some(PendingCode { language, code }) = self.code.take() else {
            return;
        };

        let mut code_el = Element::new("code");
        let children = match language.as_deref() {
            Some(lang) => match self.highlighter.highlight(lang, &code) {
                Ok(nodes) => {
                    code_el.add_class("hljs");
                    nodes
                }
                Err(e) => {
                    tracing::debug!("code block left unhighlighted: {}", e);
                    vec![Node::Text(code)]
                }
            },
            None => vec![Node::Text(code)],
        };
        if let Some(lang) = language {
            code_el.add_class(format!("language-{lang}"));
        }
        code_el.children = children;

        self.push_node(Element::new("pre").with_children(vec![code_el.into()]).into());
    }

    fn children_mut(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.element.children,
            None => &mut self.root,
        }
    }

    fn push_node(&mut self, node: Node) {
        self.children_mut().push(node);
    }

    fn push_text(&mut self, text: &str) {
        let children = self.children_mut();
        if let Some(Node::Text(last)) = children.last_mut() {
            last.push_str(text);
        } else {
            children.push(Node::Text(text.to_string()));
        }
    }

    fn finish(mut self) -> Fragment {
        if self.code.is_some() {
            self.finish_code_block();
        }
        while !self.stack.is_empty() {
            self.end();
        }
        self.root.into()
    }
}

/// Reject script-capable URL schemes
fn is_safe_url(url: &str) -> bool {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_lowercase();
    !["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::highlight::PlainHighlighter;
    use pretty_assertions::assert_eq;

    fn render(md: &str) -> String {
        MarkdownRenderer::with_highlighter(Arc::new(PlainHighlighter))
            .render(md)
            .to_html()
    }

    #[test]
    fn heading_and_paragraph() {
        assert_eq!(render("### Риски\nТекст."), "<h3>Риски</h3><p>Текст.</p>");
    }

    #[test]
    fn lists_and_emphasis() {
        assert_eq!(
            render("- *one*\n- **two**\n\n3. three"),
            "<ul><li><em>one</em></li><li><strong>two</strong></li></ul><ol start=\"3\"><li>three</li></ol>"
        );
    }

    #[test]
    fn blank_input_is_placeholder() {
        let renderer = MarkdownRenderer::new();
        assert!(renderer.render("").is_placeholder());
        assert!(renderer.render("  \n\t").is_placeholder());
        assert!(renderer.render_opt(None).is_placeholder());
        assert_eq!(
            renderer.render("").to_html(),
            "<p class=\"analysis-empty\">Анализ отсутствует.</p>"
        );
    }

    #[test]
    fn raw_html_is_escaped() {
        let html = render("<script>alert(1)</script>\n\ntext <b>bold</b>");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
    }

    #[test]
    fn script_links_lose_href() {
        assert_eq!(render("[x](javascript:alert(1))"), "<p><a>x</a></p>");
        assert_eq!(
            render("[law](https://adilet.zan.kz)"),
            "<p><a href=\"https://adilet.zan.kz\">law</a></p>"
        );
    }

    #[test]
    fn unknown_language_degrades_to_escaped_block() {
        assert_eq!(
            render("```cobol\nIF A < B\n```"),
            "<pre><code class=\"language-cobol\">IF A &lt; B\n</code></pre>"
        );
    }

    #[test]
    fn known_language_is_highlighted() {
        let html = MarkdownRenderer::new()
            .render("```rust\nfn main() {}\n```")
            .to_html();
        assert!(html.starts_with("<pre><code class=\"hljs language-rust\">"));
        assert!(html.contains("<span class=\"hl-keyword\">fn</span>"));
    }

    #[test]
    fn failing_block_does_not_abort_document() {
        let html = MarkdownRenderer::new()
            .render("# Title\n\n```rust\nfn (((\n```\n\nAfter.")
            .to_html();
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<pre><code class=\"language-rust\">fn (((\n</code></pre>"));
        assert!(html.ends_with("<p>After.</p>"));
    }

    #[test]
    fn table_head_cells_are_th() {
        assert_eq!(
            render("| a | b |\n|---|---|\n| 1 | 2 |"),
            "<table><thead><tr><th>a</th><th>b</th></tr></thead><tr><td>1</td><td>2</td></tr></table>"
        );
    }

    #[test]
    fn image_alt_moves_to_attribute() {
        assert_eq!(
            render("![stamp](seal.png)"),
            "<p><img alt=\"stamp\" src=\"seal.png\"></p>"
        );
    }
}
