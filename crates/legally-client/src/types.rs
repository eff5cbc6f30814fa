//! Backend payload types

use legally_content::AnalysisDocument;
use serde::{Deserialize, Serialize};

/// Signed-in user as reported by the auth backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id
    #[serde(default)]
    pub id: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// E-mail address
    #[serde(default)]
    pub email: Option<String>,
}

/// One past analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Uploaded file name
    pub filename: String,
    /// Detected document type
    #[serde(rename = "type", default)]
    pub document_type: Option<String>,
    /// Creation timestamp as sent by the backend
    pub created_at: String,
    /// Markdown analysis
    #[serde(default)]
    pub analysis: Option<String>,
}

impl HistoryRecord {
    /// Analysis in the form the content pipeline renders
    #[must_use]
    pub fn to_document(&self) -> AnalysisDocument {
        AnalysisDocument {
            analysis: self.analysis.clone(),
            document_type: self.document_type.clone(),
        }
    }
}

/// Chat backend answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Answer text
    pub answer: String,
    /// Answering mode, e.g. `legal_rag`
    #[serde(default)]
    pub mode: Option<String>,
    /// Source documents cited by the answer
    #[serde(default)]
    pub sources: Vec<String>,
}

/// One line of the server-side chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// `user` or anything else for the assistant
    pub role: String,
    /// Message text
    pub content: String,
}

/// Chat history payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistory {
    /// Entries in conversation order
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Embedding model names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Embedding model
    #[serde(default)]
    pub embedding: Option<String>,
}

/// Chat index statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Vectors in the index
    #[serde(default)]
    pub total_vectors: u64,
    /// Embedding dimension
    #[serde(default)]
    pub index_dimension: Option<u64>,
    /// Messages in the server-side conversation
    #[serde(default)]
    pub conversation_history_length: Option<u64>,
    /// Models in use
    #[serde(default)]
    pub models: Option<ModelInfo>,
    /// Any other keys
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Stats {
    /// Multi-line summary for display
    #[must_use]
    pub fn summary(&self) -> String {
        let or_na = |v: Option<u64>| v.map_or_else(|| "N/A".to_string(), |v| v.to_string());
        let embedding = self
            .models
            .as_ref()
            .and_then(|m| m.embedding.as_deref())
            .unwrap_or("N/A");
        format!(
            "📊 Статистика системы:\n• Векторов в индексе: {}\n• Размерность: {}\n• История разговора: {}\n• Модели: {}",
            self.total_vectors,
            or_na(self.index_dimension),
            or_na(self.conversation_history_length),
            embedding,
        )
    }
}

/// Lifecycle of a backend task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Waiting to start
    Pending,
    /// Running
    Processing,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// State this client does not know
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// True once the task will not change again
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Task status update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Current state
    pub status: TaskState,
    /// Progress in percent
    #[serde(default)]
    pub progress: Option<f32>,
    /// Analysis, once completed
    #[serde(default)]
    pub result: Option<AnalysisDocument>,
    /// Failure reason
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskStatus {
    /// Create status with only a state
    #[inline]
    #[must_use]
    pub fn new(status: TaskState) -> Self {
        Self {
            status,
            progress: None,
            result: None,
            error: None,
        }
    }

    /// With progress
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, progress: f32) -> Self {
        self.progress = Some(progress);
        self
    }

    /// With result
    #[inline]
    #[must_use]
    pub fn with_result(mut self, result: AnalysisDocument) -> Self {
        self.result = Some(result);
        self
    }

    /// With error
    #[inline]
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
