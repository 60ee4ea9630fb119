//! HTTP client for the DocuChat API.
//!
//! Thin wrapper over `reqwest`: one method per endpoint, non-2xx responses
//! turned into [`ClientError::Api`] carrying the server's `detail`.

use super::{ChatApi, DocumentApi};
use crate::config::ApiSettings;
use crate::models::{
    AskRequest, AskResponse, ChatHistory, DeleteConfirmation, DocumentId, DocumentStatusResponse,
    DocumentSummary, HealthStatus, SessionId, UploadSelection, UploadedDocument,
};
use async_trait::async_trait;
use client_core::error::ClientError;
use client_core::observability::{TracedClientExt, TracedRequest};
use reqwest::multipart;
use serde::de::DeserializeOwned;

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Probe `GET /health`, including the server's request budget.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let request = self.client.traced_get(&self.url("/health"));
        execute(request, "health").await
    }
}

/// Send `request` and decode a successful JSON body into `T`.
async fn execute<T: DeserializeOwned>(
    request: TracedRequest,
    operation: &str,
) -> Result<T, ClientError> {
    let request_id = request.request_id().to_string();

    let response = request.send().await.map_err(|e| {
        tracing::warn!(operation, request_id = %request_id, error = %e, "API request failed");
        ClientError::Network(e)
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let err = ClientError::from_response_body(status.as_u16(), &body);
        tracing::warn!(
            operation,
            request_id = %request_id,
            status = status.as_u16(),
            detail = err.detail().unwrap_or(""),
            "API returned an error"
        );
        return Err(err);
    }

    tracing::debug!(operation, request_id = %request_id, status = status.as_u16(), "API request succeeded");

    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::Decode(format!("{}: {}", operation, e)))
}

#[async_trait]
impl DocumentApi for ApiClient {
    async fn upload(&self, selection: &UploadSelection) -> Result<UploadedDocument, ClientError> {
        let data = selection.read().await?;

        tracing::info!(
            file_name = %selection.file_name,
            mime_type = %selection.mime_type,
            size = data.len(),
            "Uploading document"
        );

        let part = multipart::Part::bytes(data)
            .file_name(selection.file_name.clone())
            .mime_str(&selection.mime_type)?;
        let form = multipart::Form::new().part("file", part);

        let request = self
            .client
            .traced_post(&self.url("/documents/upload"))
            .multipart(form);
        execute(request, "upload").await
    }

    async fn get_status(
        &self,
        document_id: DocumentId,
    ) -> Result<DocumentStatusResponse, ClientError> {
        let request = self
            .client
            .traced_get(&self.url(&format!("/documents/status/{}", document_id)));
        execute(request, "get_status").await
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, ClientError> {
        let request = self.client.traced_get(&self.url("/documents/"));
        execute(request, "list_documents").await
    }

    async fn delete_document(
        &self,
        document_id: DocumentId,
    ) -> Result<DeleteConfirmation, ClientError> {
        let request = self
            .client
            .traced_delete(&self.url(&format!("/documents/{}", document_id)));
        execute(request, "delete_document").await
    }
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ClientError> {
        tracing::debug!(
            document_id = %request.document_id,
            session_id = ?request.session_id,
            question_len = request.question.len(),
            "Asking question"
        );

        let traced = self
            .client
            .traced_post(&self.url("/chat/ask"))
            .json(request);
        execute(traced, "ask").await
    }

    async fn get_history(&self, session_id: SessionId) -> Result<ChatHistory, ClientError> {
        let request = self
            .client
            .traced_get(&self.url(&format!("/chat/history/{}", session_id)));
        execute(request, "get_history").await
    }
}
