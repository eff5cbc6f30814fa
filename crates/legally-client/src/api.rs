//! HTTP client for the Legally backends
//!
//! One [`ApiClient`] talks to:
//! - the analysis/auth/history backend at `api_url`
//! - the chat backend at `chat_url`
//!
//! Every request is made once. Non-success statuses become
//! [`ClientError::Backend`]; nothing is retried.

use crate::chat::ChatBackend;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::poll::StatusSource;
use crate::session::TokenValidator;
use crate::types::{ChatHistory, ChatReply, HistoryRecord, Stats, TaskStatus, UserProfile};
use crate::upload::DocumentUpload;
use async_trait::async_trait;
use legally_content::AnalysisDocument;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Multipart field carrying the uploaded file
const DOCUMENT_FIELD: &str = "document";

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Backend client
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Create client from configuration
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http, config })
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn chat_url(&self, path: &str) -> String {
        format!("{}{}", self.config.chat_url.trim_end_matches('/'), path)
    }

    /// Upload a PDF for analysis
    pub async fn analyze(&self, upload: &DocumentUpload) -> ClientResult<AnalysisDocument> {
        upload.validate()?;

        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str("application/pdf")?;
        let form = Form::new().part(DOCUMENT_FIELD, part);

        tracing::debug!(file = %upload.file_name, size = upload.size(), "uploading document");
        let document: AnalysisDocument = self
            .send(self.http.post(self.api_url("/api/analyze")).multipart(form))
            .await?;
        tracing::info!(
            file = %upload.file_name,
            document_type = document.document_type_label(),
            "analysis completed"
        );
        Ok(document)
    }

    /// Check a bearer token; rejection is `Ok(false)`
    pub async fn validate_token(&self, token: &str) -> ClientResult<bool> {
        let response = self
            .http
            .get(self.api_url("/api/validate-token"))
            .bearer_auth(token)
            .send()
            .await?;

        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::warn!(status = response.status().as_u16(), "token rejected");
            return Ok(false);
        }
        ensure_success(response).await?;
        Ok(true)
    }

    /// Profile of the token's owner
    pub async fn current_user(&self, token: &str) -> ClientResult<UserProfile> {
        self.send(self.http.get(self.api_url("/api/user")).bearer_auth(token))
            .await
    }

    /// Past analyses of the token's owner
    pub async fn history(&self, token: &str) -> ClientResult<Vec<HistoryRecord>> {
        self.send(self.http.get(self.api_url("/api/history")).bearer_auth(token))
            .await
    }

    /// Drop cached analyses on the backend
    pub async fn clear_cache(&self, token: &str) -> ClientResult<()> {
        let response = self
            .http
            .post(self.api_url("/api/cache/clear"))
            .bearer_auth(token)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Ask the legal assistant
    pub async fn chat(&self, message: &str) -> ClientResult<ChatReply> {
        self.send(
            self.http
                .post(self.chat_url("/chat"))
                .json(&ChatRequest { message }),
        )
        .await
    }

    /// Clear the server-side conversation
    pub async fn clear_chat(&self) -> ClientResult<()> {
        let response = self.http.post(self.chat_url("/clear")).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Server-side conversation
    pub async fn chat_history(&self) -> ClientResult<ChatHistory> {
        self.send(self.http.get(self.chat_url("/history"))).await
    }

    /// Chat index statistics
    pub async fn stats(&self) -> ClientResult<Stats> {
        self.send(self.http.get(self.chat_url("/stats"))).await
    }

    /// Current status of a backend task
    pub async fn task_status(&self, task_id: &str) -> ClientResult<TaskStatus> {
        let path = format!(
            "{}/{}",
            self.config.status_path.trim_end_matches('/'),
            task_id
        );
        self.send(self.http.get(self.api_url(&path))).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = ensure_success(request.send().await?).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), %url, "request failed");
    Err(ClientError::backend(status.as_u16(), &body))
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn status(&self, task_id: &str) -> ClientResult<TaskStatus> {
        self.task_status(task_id).await
    }
}

#[async_trait]
impl TokenValidator for ApiClient {
    async fn validate_token(&self, token: &str) -> ClientResult<bool> {
        ApiClient::validate_token(self, token).await
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn send_message(&self, message: &str) -> ClientResult<ChatReply> {
        self.chat(message).await
    }

    async fn clear(&self) -> ClientResult<()> {
        self.clear_chat().await
    }

    async fn load_history(&self) -> ClientResult<ChatHistory> {
        self.chat_history().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_join_without_double_slash() {
        let client = ApiClient::new(
            ClientConfig::new()
                .with_api_url("http://api.local/")
                .with_chat_url("http://chat.local"),
        )
        .unwrap();
        assert_eq!(client.api_url("/api/user"), "http://api.local/api/user");
        assert_eq!(client.chat_url("/chat"), "http://chat.local/chat");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = ApiClient::new(ClientConfig::new().with_api_url("ftp://x")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_analyze_validates_before_sending() {
        let client = ApiClient::new(ClientConfig::new().with_api_url("http://127.0.0.1:9")).unwrap();
        let err = client
            .analyze(&DocumentUpload::new("notes.txt", vec![1, 2, 3]))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }
}
