//! Error types for the content pipeline
//!
//! Rendering itself never fails: unknown languages and highlighter errors
//! degrade the affected code block in place. The errors here cover:
//! - Highlighter failures (reported to the renderer, not to callers)
//! - Rule configuration that cannot be used

/// Errors raised by a syntax highlighter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HighlightError {
    /// No grammar for the requested language
    #[error("unknown language: '{0}'")]
    UnknownLanguage(String),

    /// Grammar could not be loaded into the parser
    #[error("grammar error for {language}: {message}")]
    Grammar { language: String, message: String },

    /// Parser produced no tree or a tree with syntax errors
    #[error("could not parse {language} code block")]
    Syntax { language: String },
}

impl HighlightError {
    /// Create grammar error for language
    pub fn grammar(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Grammar {
            language: language.into(),
            message: message.into(),
        }
    }

    /// Create syntax error for language
    pub fn syntax(language: impl Into<String>) -> Self {
        Self::Syntax {
            language: language.into(),
        }
    }
}

/// Errors in content configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A rule has no keywords and can never match
    #[error("rule for {0} has no keywords")]
    EmptyRule(String),

    /// A keyword is blank
    #[error("blank keyword in rule for {0}")]
    BlankKeyword(String),

    /// Section heading levels outside 1..=6 or empty
    #[error("invalid heading levels: {0:?}")]
    InvalidHeadingLevels(Vec<u8>),
}
