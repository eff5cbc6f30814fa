//! Error types for the Legally client
//!
//! Covers:
//! - Input validation (wrong or empty file)
//! - Backend rejections and transport failures
//! - Authentication loss
//! - Cooperative cancellation
//!
//! Nothing here is retried automatically; callers either surface the error
//! or stop.

use std::path::PathBuf;

/// Message shown for any upload that is not a usable PDF
pub const PDF_REQUIRED_MESSAGE: &str = "Пожалуйста, загрузите файл в формате PDF";

/// Message shown when an analysis request fails
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Произошла ошибка при анализе документа. Пожалуйста, попробуйте позже.";

/// Main client error type
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Input rejected before any request was made
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Backend answered with a non-success status
    #[error("backend returned {status}: {message}")]
    Backend {
        /// HTTP status code
        status: u16,
        /// Body text or a generated description
        message: String,
    },

    /// Request never completed or the response could not be read
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Missing or rejected credentials
    #[error("not authenticated")]
    NotAuthenticated,

    /// Operation was cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// Local file could not be read
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Invalid client configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Create backend error from a status and response body
    ///
    /// A JSON body with an `error` field contributes that field; any other
    /// non-blank body is used as is.
    pub fn backend(status: u16, body: &str) -> Self {
        let body = body.trim();
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                if body.is_empty() {
                    format!("Server returned {status}")
                } else {
                    body.to_string()
                }
            });
        Self::Backend { status, message }
    }

    /// Create input validation error with the PDF message
    #[inline]
    #[must_use]
    pub fn pdf_required() -> Self {
        Self::InvalidInput(PDF_REQUIRED_MESSAGE.to_string())
    }

    /// Create IO error for a path
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if error should be shown to the user as a message
    #[inline]
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::Backend { .. } | Self::Transport(_) | Self::Io { .. }
        )
    }

    /// Check if error ends the authenticated session
    #[inline]
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::Backend { status: 401 | 403, .. }
        )
    }

    /// Check if error came from cancellation
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
