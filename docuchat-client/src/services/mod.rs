//! Collaborators reached over HTTP and the polling machinery built on them.
//!
//! The upload and chat flows depend on the [`DocumentApi`] and [`ChatApi`]
//! traits rather than on [`ApiClient`] directly, so they can run against
//! [`mock`] implementations in tests.

pub mod api_client;
pub mod mock;
pub mod status_poller;

pub use api_client::ApiClient;
pub use status_poller::{PollEvent, PollSettings, StatusPoller};

use crate::models::{
    AskRequest, AskResponse, ChatHistory, DeleteConfirmation, DocumentId, DocumentStatusResponse,
    DocumentSummary, SessionId, UploadSelection, UploadedDocument,
};
use async_trait::async_trait;
use client_core::error::ClientError;

#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Send the selected file; the server starts processing asynchronously.
    async fn upload(&self, selection: &UploadSelection) -> Result<UploadedDocument, ClientError>;

    async fn get_status(
        &self,
        document_id: DocumentId,
    ) -> Result<DocumentStatusResponse, ClientError>;

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, ClientError>;

    async fn delete_document(
        &self,
        document_id: DocumentId,
    ) -> Result<DeleteConfirmation, ClientError>;
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ClientError>;

    async fn get_history(&self, session_id: SessionId) -> Result<ChatHistory, ClientError>;
}
