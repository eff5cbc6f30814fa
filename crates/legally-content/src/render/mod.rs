//! Rendering of analysis markdown
//!
//! - Markdown → [`Fragment`](crate::tree::Fragment) via pulldown-cmark
//! - Fenced code blocks → highlighted spans via tree-sitter

mod highlight;
mod markdown;

pub use highlight::{Highlighter, Language, PlainHighlighter, TreeSitterHighlighter};
pub use markdown::{MarkdownRenderer, RenderedFragment, EMPTY_ANALYSIS_TEXT};
