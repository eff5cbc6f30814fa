//! Legally Content Pipeline
//!
//! Turns the markdown analysis returned by the backend into display-ready
//! document fragments.
//!
//! # Stages
//!
//! - **Render**: markdown → sanitized [`Fragment`], fenced code highlighted
//! - **Classify**: split the fragment into risks, recommendations and summary
//! - **Annotate**: tag risk levels and legal references in the named sections
//!
//! # Architecture
//!
//! ```text
//! markdown → MarkdownRenderer → Fragment → SectionClassifier → SectionMap → RiskAnnotator → AnalysisView
//!                  ↑
//!             Highlighter (tree-sitter)
//! ```
//!
//! # Example
//!
//! ```rust
//! use legally_content::{AnalysisDocument, AnalysisPipeline, SectionKey};
//!
//! let pipeline = AnalysisPipeline::default();
//! let view = pipeline.render(&AnalysisDocument::new(
//!     "### Риски\nВысокий риск штрафа.\n### Рекомендации\nПересмотреть пункт 5.",
//! ));
//!
//! assert!(view.html(Some(SectionKey::Risks)).contains("risk-highlight high"));
//! assert!(view.sections.is_placeholder(SectionKey::Summary));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod analysis;
pub mod annotate;
pub mod config;
pub mod error;
pub mod render;
pub mod sections;
pub mod tree;

// Re-exports for convenience
pub use analysis::{AnalysisDocument, AnalysisPipeline, AnalysisView, Tab};
pub use annotate::{RiskAnnotator, RiskLevel, RiskRules};
pub use config::ContentConfig;
pub use error::{ConfigError, HighlightError};
pub use render::{MarkdownRenderer, RenderedFragment};
pub use sections::{SectionClassifier, SectionKey, SectionMap, SectionRules};
pub use tree::{DocumentNode, Element, Fragment, Node};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{AnalysisDocument, AnalysisPipeline, AnalysisView};
    pub use crate::annotate::{RiskAnnotator, RiskRules};
    pub use crate::config::ContentConfig;
    pub use crate::error::{ConfigError, HighlightError};
    pub use crate::render::{Highlighter, MarkdownRenderer};
    pub use crate::sections::{SectionClassifier, SectionKey, SectionMap};
    pub use crate::tree::{DocumentNode, Fragment, Node};
}
