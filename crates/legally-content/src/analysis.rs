//! Analysis presentation model - main entry point
//!
//! Runs one backend analysis through:
//! - Markdown rendering (with code highlighting)
//! - Section classification
//! - Risk annotation of the named sections
//!
//! Every call recomputes everything from the document it is given.

use crate::annotate::RiskAnnotator;
use crate::config::ContentConfig;
use crate::error::ConfigError;
use crate::render::{MarkdownRenderer, PlainHighlighter, RenderedFragment};
use crate::sections::{SectionClassifier, SectionKey, SectionMap};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;

/// Label used when the backend did not report a document type
pub const UNKNOWN_DOCUMENT_TYPE: &str = "Неизвестно";

/// Label of the full-analysis tab
pub const FULL_ANALYSIS_LABEL: &str = "Полный анализ";

/// Analysis produced by the backend for one uploaded file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisDocument {
    /// Markdown analysis text
    #[serde(default)]
    pub analysis: Option<String>,
    /// Detected document type
    #[serde(default)]
    pub document_type: Option<String>,
}

impl AnalysisDocument {
    /// Create document from markdown
    #[inline]
    #[must_use]
    pub fn new(analysis: impl Into<String>) -> Self {
        Self {
            analysis: Some(analysis.into()),
            document_type: None,
        }
    }

    /// With document type
    #[inline]
    #[must_use]
    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }

    /// Document type for display
    #[must_use]
    pub fn document_type_label(&self) -> &str {
        self.document_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNKNOWN_DOCUMENT_TYPE)
    }
}

/// One display tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// Section id (`full` for the whole analysis)
    pub key: String,
    /// Tab label
    pub label: String,
    /// Tab HTML
    pub html: String,
}

/// Result of one render pass
///
/// Serializes as `{ "document_type", "tabs": [{ "key", "label", "html" }] }`,
/// with every section as an HTML string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisView {
    /// Document type label
    pub document_type: String,
    /// Annotated sections
    pub sections: SectionMap,
}

impl AnalysisView {
    /// HTML of a section, or of the full analysis for `None`
    #[must_use]
    pub fn html(&self, key: Option<SectionKey>) -> String {
        match key {
            Some(key) => self.sections.get(key).to_html(),
            None => self.sections.full().to_html(),
        }
    }

    /// Tabs in display order: full analysis, then the named sections
    #[must_use]
    pub fn tabs(&self) -> Vec<Tab> {
        let mut tabs = vec![Tab {
            key: "full".to_string(),
            label: FULL_ANALYSIS_LABEL.to_string(),
            html: self.sections.full().to_html(),
        }];
        tabs.extend(self.sections.iter().map(|(key, fragment)| Tab {
            key: key.as_str().to_string(),
            label: key.label().to_string(),
            html: fragment.to_html(),
        }));
        tabs
    }
}

impl Serialize for AnalysisView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AnalysisView", 2)?;
        state.serialize_field("document_type", &self.document_type)?;
        state.serialize_field("tabs", &self.tabs())?;
        state.end()
    }
}

/// Renderer, classifier and annotator wired together
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    renderer: MarkdownRenderer,
    classifier: SectionClassifier,
    annotator: RiskAnnotator,
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self::new(ContentConfig::default())
    }
}

impl AnalysisPipeline {
    /// Create pipeline from configuration
    #[must_use]
    pub fn new(config: ContentConfig) -> Self {
        let renderer = if config.highlight {
            MarkdownRenderer::new()
        } else {
            MarkdownRenderer::with_highlighter(Arc::new(PlainHighlighter))
        };
        Self {
            renderer,
            classifier: SectionClassifier::new(config.sections),
            annotator: RiskAnnotator::new(config.risks),
        }
    }

    /// Create pipeline after validating configuration
    pub fn try_new(config: ContentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Replace the renderer
    #[inline]
    #[must_use]
    pub fn with_renderer(mut self, renderer: MarkdownRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Render markdown only
    #[inline]
    #[must_use]
    pub fn render_markdown(&self, markdown: &str) -> RenderedFragment {
        self.renderer.render(markdown)
    }

    /// Classify without annotating
    #[must_use]
    pub fn sections(&self, markdown: &str) -> SectionMap {
        self.classifier.classify(&self.renderer.render(markdown))
    }

    /// Full render pass for one document
    #[must_use]
    pub fn render(&self, document: &AnalysisDocument) -> AnalysisView {
        let rendered = self.renderer.render_opt(document.analysis.as_deref());
        let mut sections = self.classifier.classify(&rendered);

        let mut tagged = 0;
        for key in SectionKey::ALL {
            tagged += self.annotator.annotate_in_place(sections.get_mut(key));
        }
        tracing::debug!(
            placeholder = rendered.is_placeholder(),
            nodes = rendered.fragment().len(),
            tagged,
            "rendered analysis"
        );

        AnalysisView {
            document_type: document.document_type_label().to_string(),
            sections,
        }
    }
}
