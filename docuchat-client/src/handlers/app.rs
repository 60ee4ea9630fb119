//! Routing between the upload flow and the chat flow.

use super::chat::ChatSession;
use super::upload::{TrackerEvent, UploadTracker};
use crate::models::DocumentId;
use crate::services::{ChatApi, DocumentApi, PollSettings};
use std::sync::Arc;

/// The flow currently mounted. Only one exists at a time, so a tracker and a
/// chat session never run against the same document together.
pub enum Screen {
    Upload(UploadTracker),
    Chat(ChatSession),
}

pub struct SessionController {
    documents: Arc<dyn DocumentApi>,
    chat: Arc<dyn ChatApi>,
    settings: PollSettings,
    active_document: Option<DocumentId>,
    screen: Screen,
}

impl SessionController {
    pub fn new(
        documents: Arc<dyn DocumentApi>,
        chat: Arc<dyn ChatApi>,
        settings: PollSettings,
    ) -> Self {
        let screen = Screen::Upload(UploadTracker::new(documents.clone(), settings));
        Self {
            documents,
            chat,
            settings,
            active_document: None,
            screen,
        }
    }

    pub fn active_document(&self) -> Option<DocumentId> {
        self.active_document
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn documents(&self) -> &Arc<dyn DocumentApi> {
        &self.documents
    }

    /// Make `id` the active document and mount a fresh chat session for it.
    /// The upload tracker is dropped, which stops any polling it still owns.
    pub fn on_document_ready(&mut self, id: DocumentId) {
        tracing::info!(document_id = %id, "Document ready, switching to chat");
        self.active_document = Some(id);
        self.screen = Screen::Chat(ChatSession::new(self.chat.clone(), id));
    }

    /// Clear the active document and go back to uploading. Any chat state is
    /// discarded.
    pub fn on_new_document(&mut self) {
        if let Some(id) = self.active_document.take() {
            tracing::info!(document_id = %id, "Leaving chat for a new document");
        }
        self.screen = Screen::Upload(UploadTracker::new(self.documents.clone(), self.settings));
    }

    /// Drive the upload tracker one step. On readiness the controller
    /// switches to chat before handing the event back.
    ///
    /// Returns `None` when the chat screen is mounted or nothing is polling.
    pub async fn next_upload_event(&mut self) -> Option<TrackerEvent> {
        let event = match &mut self.screen {
            Screen::Upload(tracker) => tracker.next_event().await?,
            Screen::Chat(_) => return None,
        };

        if let TrackerEvent::Ready(id) = event {
            self.on_document_ready(id);
        }
        Some(event)
    }
}
