//! Scripted in-memory collaborators for testing.
//!
//! Responses are queued up front and handed out in order. Every call is
//! counted (and chat requests recorded) so tests can assert exactly what
//! reached the "server".

use super::{ChatApi, DocumentApi};
use crate::models::{
    AskRequest, AskResponse, ChatHistory, DeleteConfirmation, DocumentId, DocumentStatus,
    DocumentStatusResponse, DocumentSummary, SessionId, UploadSelection, UploadedDocument,
};
use async_trait::async_trait;
use client_core::error::ClientError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Lock `mutex`, ignoring poisoning.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn unavailable(status: u16) -> ClientError {
    ClientError::Api {
        status,
        detail: None,
    }
}

/// Mock document endpoints. With an empty status script every poll reports
/// `processing`.
#[derive(Default)]
pub struct MockDocumentApi {
    uploads: Mutex<VecDeque<Result<UploadedDocument, ClientError>>>,
    statuses: Mutex<VecDeque<Result<DocumentStatusResponse, ClientError>>>,
    documents: Mutex<Vec<DocumentSummary>>,
    upload_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl MockDocumentApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_upload(&self, id: i64) {
        lock(&self.uploads).push_back(Ok(UploadedDocument {
            id: DocumentId(id),
            filename: None,
            file_type: None,
            file_size: None,
            status: Some(DocumentStatus::Queued),
            uploaded_at: None,
        }));
    }

    pub fn push_upload_error(&self, status: u16, detail: Option<&str>) {
        lock(&self.uploads).push_back(Err(ClientError::Api {
            status,
            detail: detail.map(str::to_string),
        }));
    }

    pub fn push_status(&self, status: DocumentStatus, error_message: Option<&str>) {
        lock(&self.statuses)
            .push_back(Ok(DocumentStatusResponse {
                id: None,
                filename: None,
                status,
                uploaded_at: None,
                processed_at: None,
                error_message: error_message.map(str::to_string),
            }));
    }

    pub fn push_status_error(&self, status: u16) {
        lock(&self.statuses)
            .push_back(Err(unavailable(status)));
    }

    pub fn add_document(&self, summary: DocumentSummary) {
        lock(&self.documents).push(summary);
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentApi for MockDocumentApi {
    async fn upload(&self, _selection: &UploadSelection) -> Result<UploadedDocument, ClientError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.uploads)
            .pop_front()
            .unwrap_or_else(|| Err(unavailable(503)))
    }

    async fn get_status(
        &self,
        document_id: DocumentId,
    ) -> Result<DocumentStatusResponse, ClientError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = lock(&self.statuses).pop_front();
        match next {
            Some(result) => result.map(|mut r| {
                r.id.get_or_insert(document_id);
                r
            }),
            None => Ok(DocumentStatusResponse {
                id: Some(document_id),
                filename: None,
                status: DocumentStatus::Processing,
                uploaded_at: None,
                processed_at: None,
                error_message: None,
            }),
        }
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, ClientError> {
        Ok(lock(&self.documents).clone())
    }

    async fn delete_document(
        &self,
        document_id: DocumentId,
    ) -> Result<DeleteConfirmation, ClientError> {
        let mut documents = lock(&self.documents);
        let before = documents.len();
        documents.retain(|d| d.id != document_id);
        if documents.len() == before {
            return Err(ClientError::Api {
                status: 404,
                detail: Some("Document not found".to_string()),
            });
        }
        Ok(DeleteConfirmation {
            message: "Document deleted successfully".to_string(),
        })
    }
}

/// Mock chat endpoints. An empty answer script fails every question.
#[derive(Default)]
pub struct MockChatApi {
    answers: Mutex<VecDeque<Result<AskResponse, ClientError>>>,
    requests: Mutex<Vec<AskRequest>>,
}

impl MockChatApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_answer(&self, answer: &str, session_id: i64, sources: &[&str]) {
        lock(&self.answers).push_back(Ok(AskResponse {
            answer: answer.to_string(),
            session_id: SessionId(session_id),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }));
    }

    pub fn push_failure(&self, status: u16) {
        lock(&self.answers)
            .push_back(Err(unavailable(status)));
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<AskRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ClientError> {
        lock(&self.requests).push(request.clone());
        lock(&self.answers)
            .pop_front()
            .unwrap_or_else(|| Err(unavailable(503)))
    }

    async fn get_history(&self, session_id: SessionId) -> Result<ChatHistory, ClientError> {
        let requests = lock(&self.requests);
        let document_id = requests
            .first()
            .map(|r| r.document_id)
            .ok_or_else(|| ClientError::Api {
                status: 404,
                detail: Some("Chat session not found".to_string()),
            })?;

        Ok(ChatHistory {
            session_id,
            document_id,
            messages: requests
                .iter()
                .map(|r| crate::models::HistoryMessage {
                    role: crate::models::Role::User,
                    content: r.question.clone(),
                    created_at: None,
                })
                .collect(),
        })
    }
}
