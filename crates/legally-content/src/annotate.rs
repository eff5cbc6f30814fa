//! Risk annotator
//!
//! Adds risk-level and legal-reference classes to block elements. Only class
//! sets change; text and structure are left exactly as they were, and running
//! the annotator again adds nothing new.

use crate::tree::{Element, Fragment, Node};
use serde::{Deserialize, Serialize};

/// Marker class added alongside every severity class
pub const RISK_MARKER_CLASS: &str = "risk-highlight";

/// Class for list items citing an article or law
pub const LEGAL_REFERENCE_CLASS: &str = "legal-reference";

/// Elements inspected for severity cues
const ANNOTATED_TAGS: &[&str] = &["p", "li", "div"];

/// Severity of a flagged passage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// High severity
    High,
    /// Medium severity
    Medium,
    /// Low severity
    Low,
}

impl RiskLevel {
    /// CSS class name
    #[inline]
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Keywords for one severity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityRule {
    /// Severity assigned on match
    pub level: RiskLevel,
    /// Case-insensitive substrings
    pub keywords: Vec<String>,
}

/// Ordered severity table plus legal-reference cues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskRules {
    /// Severity rules in precedence order
    pub severity: Vec<SeverityRule>,
    /// Substrings marking a list item as a legal reference
    pub legal_reference: Vec<String>,
}

impl Default for RiskRules {
    fn default() -> Self {
        let rule = |level, keywords: &[&str]| SeverityRule {
            level,
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        };
        Self {
            severity: vec![
                rule(RiskLevel::High, &["высокий", "high"]),
                rule(RiskLevel::Medium, &["средний", "medium"]),
                rule(RiskLevel::Low, &["низкий", "low"]),
            ],
            legal_reference: vec![
                "статья".to_string(),
                "article".to_string(),
                "закон".to_string(),
                "law".to_string(),
            ],
        }
    }
}

impl RiskRules {
    /// Severity cued by text, first matching rule wins
    #[must_use]
    pub fn severity_of(&self, text: &str) -> Option<RiskLevel> {
        let lowered = text.to_lowercase();
        self.severity
            .iter()
            .find(|rule| contains_any(&lowered, &rule.keywords))
            .map(|rule| rule.level)
    }

    /// True if text cites an article or law
    #[must_use]
    pub fn is_legal_reference(&self, text: &str) -> bool {
        contains_any(&text.to_lowercase(), &self.legal_reference)
    }
}

fn contains_any(lowered: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|keyword| lowered.contains(&keyword.to_lowercase()))
}

/// Applies [`RiskRules`] to fragments
#[derive(Debug, Clone, Default)]
pub struct RiskAnnotator {
    rules: RiskRules,
}

impl RiskAnnotator {
    /// Create annotator with rules
    #[inline]
    #[must_use]
    pub fn new(rules: RiskRules) -> Self {
        Self { rules }
    }

    /// Active rules
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &RiskRules {
        &self.rules
    }

    /// Annotate a fragment, returning the annotated copy
    #[must_use]
    pub fn annotate(&self, fragment: &Fragment) -> Fragment {
        let mut out = fragment.clone();
        self.annotate_in_place(&mut out);
        out
    }

    /// Annotate a fragment in place; returns the number of classes added
    pub fn annotate_in_place(&self, fragment: &mut Fragment) -> usize {
        fragment
            .nodes_mut()
            .iter_mut()
            .map(|node| self.visit(node))
            .sum()
    }

    fn visit(&self, node: &mut Node) -> usize {
        let Node::Element(el) = node else {
            return 0;
        };
        let mut added = self.tag(el);
        for child in &mut el.children {
            added += self.visit(child);
        }
        added
    }

    fn tag(&self, el: &mut Element) -> usize {
        if !ANNOTATED_TAGS.contains(&el.tag.as_str()) {
            return 0;
        }
        let text = el.text();
        let mut added = 0;

        if let Some(level) = self.rules.severity_of(&text) {
            added += usize::from(el.add_class(RISK_MARKER_CLASS));
            added += usize::from(el.add_class(level.class()));
        }
        if el.tag == "li" && self.rules.is_legal_reference(&text) {
            added += usize::from(el.add_class(LEGAL_REFERENCE_CLASS));
        }
        added
    }
}
