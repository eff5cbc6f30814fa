//! Content pipeline configuration

use crate::annotate::RiskRules;
use crate::error::ConfigError;
use crate::sections::SectionRules;
use serde::{Deserialize, Serialize};

/// Pipeline configuration
///
/// Deserializes from the `[content]` table of `legally.toml`; every field
/// has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Run code blocks through the syntax highlighter
    pub highlight: bool,
    /// Section keyword table
    pub sections: SectionRules,
    /// Risk keyword table
    pub risks: RiskRules,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            highlight: true,
            sections: SectionRules::default(),
            risks: RiskRules::default(),
        }
    }
}

impl ContentConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With highlighting on or off
    #[inline]
    #[must_use]
    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    /// With section rules
    #[inline]
    #[must_use]
    pub fn with_sections(mut self, sections: SectionRules) -> Self {
        self.sections = sections;
        self
    }

    /// With risk rules
    #[inline]
    #[must_use]
    pub fn with_risks(mut self, risks: RiskRules) -> Self {
        self.risks = risks;
        self
    }

    /// Check the keyword tables
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sections.validate()?;
        for rule in &self.risks.severity {
            if rule.keywords.is_empty() {
                return Err(ConfigError::EmptyRule(rule.level.class().to_string()));
            }
        }
        if self.risks.legal_reference.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::BlankKeyword("legal references".to_string()));
        }
        Ok(())
    }
}
