//! Chat session and transcript export

use crate::error::ClientResult;
use crate::types::{ChatHistory, ChatReply, HistoryEntry};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Answering mode of the legal assistant
pub const LEGAL_RAG_MODE: &str = "legal_rag";

/// First message of every session
pub const GREETING: &str = "Здравствуйте! Я AI-ассистент, специализирующийся на казахстанском законодательстве. Задавайте мне любые вопросы по законам, кодексам и правовым нормам. Я использую RAG систему для поиска актуальной информации в юридических документах.";

/// Message left after clearing the conversation
pub const CLEARED_MESSAGE: &str = "История разговора очищена. Задавайте новые вопросы!";

/// Assistant message appended when a send fails
pub const APOLOGY: &str = "Извините, произошла ошибка при обработке запроса.";

/// Transcript label for user lines
pub const USER_LABEL: &str = "👤 Вы";

/// Transcript label for every other line
pub const ASSISTANT_LABEL: &str = "🤖 AI";

/// Chat backend operations used by [`ChatSession`]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one user message
    async fn send_message(&self, message: &str) -> ClientResult<ChatReply>;

    /// Clear the server-side conversation
    async fn clear(&self) -> ClientResult<()>;

    /// Server-side conversation
    async fn load_history(&self) -> ClientResult<ChatHistory>;
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The person asking
    User,
    /// The assistant
    Assistant,
}

/// One message shown in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author
    pub role: ChatRole,
    /// Text
    pub content: String,
    /// Answering mode, assistant messages only
    #[serde(default)]
    pub mode: Option<String>,
    /// Cited sources, assistant messages only
    #[serde(default)]
    pub sources: Vec<String>,
}

impl ChatMessage {
    /// User message
    #[inline]
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            mode: None,
            sources: Vec::new(),
        }
    }

    /// Assistant message without mode or sources
    #[inline]
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            mode: None,
            sources: Vec::new(),
        }
    }

    /// With answering mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Mode badge: `RAG` for the legal index, `GPT` for any other mode
    #[must_use]
    pub fn mode_badge(&self) -> Option<&'static str> {
        if self.role != ChatRole::Assistant {
            return None;
        }
        self.mode
            .as_deref()
            .map(|mode| if mode == LEGAL_RAG_MODE { "RAG" } else { "GPT" })
    }
}

impl From<ChatReply> for ChatMessage {
    fn from(reply: ChatReply) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: reply.answer,
            mode: reply.mode,
            sources: reply.sources,
        }
    }
}

/// Conversation state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    pending: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// New session holding the greeting
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING).with_mode(LEGAL_RAG_MODE)],
            pending: false,
        }
    }

    /// Messages in display order
    #[inline]
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// True while a reply is awaited
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Record a user message and mark the session pending
    ///
    /// Returns the trimmed message to send, or `None` if the input is blank
    /// or a reply is already awaited.
    pub fn begin(&mut self, input: &str) -> Option<String> {
        let message = input.trim();
        if message.is_empty() || self.pending {
            return None;
        }
        self.messages.push(ChatMessage::user(message));
        self.pending = true;
        Some(message.to_string())
    }

    /// Record the outcome of the pending send
    pub fn finish(&mut self, result: ClientResult<ChatReply>) -> ClientResult<&ChatMessage> {
        self.pending = false;
        match result {
            Ok(reply) => {
                self.messages.push(reply.into());
                Ok(self.last())
            }
            Err(e) => {
                tracing::debug!(error = %e, "chat request failed");
                self.messages.push(ChatMessage::assistant(APOLOGY));
                Err(e)
            }
        }
    }

    /// Send one message through `backend`
    ///
    /// Blank input and sends while pending are ignored with `Ok(None)`. On
    /// failure the apology is appended and the error returned.
    pub async fn send<B>(&mut self, backend: &B, input: &str) -> ClientResult<Option<&ChatMessage>>
    where
        B: ChatBackend + ?Sized,
    {
        let Some(message) = self.begin(input) else {
            return Ok(None);
        };
        let result = backend.send_message(&message).await;
        self.finish(result).map(Some)
    }

    /// Clear the conversation on the backend, then locally
    ///
    /// The local messages are kept if the backend call fails.
    pub async fn clear<B>(&mut self, backend: &B) -> ClientResult<()>
    where
        B: ChatBackend + ?Sized,
    {
        backend.clear().await?;
        self.messages = vec![ChatMessage::assistant(CLEARED_MESSAGE).with_mode(LEGAL_RAG_MODE)];
        self.pending = false;
        Ok(())
    }

    fn last(&self) -> &ChatMessage {
        // `messages` always holds at least the greeting
        &self.messages[self.messages.len() - 1]
    }
}

/// Plain-text transcript of a server-side history
#[must_use]
pub fn export_transcript(entries: &[HistoryEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let label = if entry.role == "user" {
                USER_LABEL
            } else {
                ASSISTANT_LABEL
            };
            format!("{label}: {}", entry.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Download name for a transcript made on `date`
#[must_use]
pub fn transcript_file_name(date: NaiveDate) -> String {
    format!("legal_chat_{}.txt", date.format("%Y-%m-%d"))
}

/// Fetch the server-side history and render it as a transcript
pub async fn fetch_transcript<B>(backend: &B) -> ClientResult<String>
where
    B: ChatBackend + ?Sized,
{
    let history = backend.load_history().await?;
    if history.history.is_empty() {
        tracing::debug!("chat history is empty");
    }
    Ok(export_transcript(&history.history))
}

impl From<&ChatMessage> for HistoryEntry {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: match message.role {
                ChatRole::User => "user".to_string(),
                ChatRole::Assistant => "assistant".to_string(),
            },
            content: message.content.clone(),
        }
    }
}
