//! Upload & readiness tracking.
//!
//! The tracker owns the file selection, submits it, and then follows the
//! document through processing via a [`StatusPoller`]. Failures never escape:
//! they are kept as the tracker's current error message for the view to show.

use crate::models::{DocumentId, ReadinessState, UploadSelection};
use crate::services::{DocumentApi, PollEvent, PollSettings, StatusPoller};
use std::sync::Arc;
use thiserror::Error;

/// Shown when an upload fails without a server-provided reason.
pub const UPLOAD_FALLBACK_ERROR: &str = "Failed to upload document";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("No file selected")]
    NoSelection,

    #[error("Document {0} is already being tracked")]
    AlreadyTracking(DocumentId),

    #[error("{0}")]
    Rejected(String),
}

/// What happened as a result of a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    StatusChanged(ReadinessState),
    /// Transient failure of a single poll; polling goes on.
    PollFailed(String),
    /// The document finished processing and the ready delay elapsed.
    Ready(DocumentId),
}

pub struct UploadTracker {
    api: Arc<dyn DocumentApi>,
    settings: PollSettings,
    selection: Option<UploadSelection>,
    document_id: Option<DocumentId>,
    state: ReadinessState,
    error: Option<String>,
    poller: Option<StatusPoller>,
    last_seq: u64,
}

impl UploadTracker {
    pub fn new(api: Arc<dyn DocumentApi>, settings: PollSettings) -> Self {
        Self {
            api,
            settings,
            selection: None,
            document_id: None,
            state: ReadinessState::Idle,
            error: None,
            poller: None,
            last_seq: 0,
        }
    }

    pub fn selection(&self) -> Option<&UploadSelection> {
        self.selection.as_ref()
    }

    pub fn document_id(&self) -> Option<DocumentId> {
        self.document_id
    }

    pub fn state(&self) -> &ReadinessState {
        &self.state
    }

    /// Upload error or the latest transient poll error.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_some()
    }

    /// Replace the selection and clear any previous error.
    pub fn select_file(&mut self, selection: UploadSelection) {
        tracing::debug!(file_name = %selection.file_name, size = selection.size, "File selected");
        self.selection = Some(selection);
        self.error = None;
    }

    /// Upload the selected file and start following its processing.
    ///
    /// On rejection the selection is kept so the user can retry.
    pub async fn submit(&mut self) -> Result<DocumentId, TrackerError> {
        if let Some(id) = self.document_id {
            return Err(TrackerError::AlreadyTracking(id));
        }
        let selection = self.selection.as_ref().ok_or(TrackerError::NoSelection)?;

        self.error = None;
        match self.api.upload(selection).await {
            Ok(uploaded) => {
                let id = uploaded.id;
                tracing::info!(document_id = %id, file_name = %selection.file_name, "Document uploaded");

                self.document_id = Some(id);
                self.state = ReadinessState::Processing;
                self.last_seq = 0;
                self.poller = Some(StatusPoller::start(self.api.clone(), id, self.settings));
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(file_name = %selection.file_name, error = %e, "Document upload failed");
                let message = e.detail().unwrap_or(UPLOAD_FALLBACK_ERROR).to_string();
                self.error = Some(message.clone());
                Err(TrackerError::Rejected(message))
            }
        }
    }

    /// Forget the selection and the tracked document; stops polling.
    pub fn cancel(&mut self) {
        if let Some(poller) = self.poller.take() {
            tracing::debug!(document_id = %poller.document_id(), "Polling cancelled");
        }
        self.selection = None;
        self.document_id = None;
        self.state = ReadinessState::Idle;
        self.error = None;
        self.last_seq = 0;
    }

    /// Wait for the next poll outcome and apply it.
    ///
    /// Returns `None` when nothing is being polled (never started, cancelled,
    /// or finished).
    pub async fn next_event(&mut self) -> Option<TrackerEvent> {
        loop {
            let event = match self.poller.as_mut() {
                Some(poller) => poller.next().await,
                None => return None,
            };

            match event {
                Some(event) => {
                    if let Some(applied) = self.apply(event) {
                        return Some(applied);
                    }
                }
                None => {
                    self.poller = None;
                    return None;
                }
            }
        }
    }

    /// Apply one poll outcome; stale or foreign events yield `None`.
    fn apply(&mut self, event: PollEvent) -> Option<TrackerEvent> {
        match event {
            PollEvent::Status { seq, response } => {
                if seq <= self.last_seq {
                    tracing::debug!(seq, last_seq = self.last_seq, "Discarding stale status");
                    return None;
                }
                self.last_seq = seq;
                self.error = None;
                self.state = ReadinessState::from(&response);

                if let ReadinessState::Failed { message } = &self.state {
                    tracing::warn!(document_id = ?self.document_id, error = %message, "Document processing failed");
                    self.poller = None;
                }
                Some(TrackerEvent::StatusChanged(self.state.clone()))
            }
            PollEvent::Failed { seq, message } => {
                if seq <= self.last_seq {
                    tracing::debug!(seq, last_seq = self.last_seq, "Discarding stale poll failure");
                    return None;
                }
                self.last_seq = seq;
                self.error = Some(message.clone());
                Some(TrackerEvent::PollFailed(message))
            }
            PollEvent::Ready { document_id } => {
                self.poller = None;
                if self.document_id != Some(document_id) {
                    return None;
                }
                Some(TrackerEvent::Ready(document_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentStatus, DocumentStatusResponse};
    use crate::services::mock::MockDocumentApi;
    use std::time::Duration;
    use tokio::time::Instant;

    fn tracker(api: &Arc<MockDocumentApi>) -> UploadTracker {
        UploadTracker::new(api.clone(), PollSettings::default())
    }

    fn selection() -> UploadSelection {
        UploadSelection::from_bytes("report.pdf", b"%PDF-1.7".to_vec())
    }

    #[tokio::test]
    async fn test_submit_requires_selection() {
        let api = Arc::new(MockDocumentApi::new());
        let mut tracker = tracker(&api);

        assert_eq!(tracker.submit().await, Err(TrackerError::NoSelection));
        assert_eq!(api.upload_calls(), 0);
        assert_eq!(tracker.state(), &ReadinessState::Idle);
    }

    #[tokio::test]
    async fn test_rejection_keeps_selection() {
        let api = Arc::new(MockDocumentApi::new());
        api.push_upload_error(400, Some("File too large. Maximum size: 10485760 bytes"));
        api.push_upload_error(500, None);
        let mut tracker = tracker(&api);
        tracker.select_file(selection());

        let result = tracker.submit().await;
        assert_eq!(
            result,
            Err(TrackerError::Rejected(
                "File too large. Maximum size: 10485760 bytes".to_string()
            ))
        );
        assert_eq!(tracker.error(), Some("File too large. Maximum size: 10485760 bytes"));
        assert!(tracker.selection().is_some());
        assert!(!tracker.is_polling());

        tracker.submit().await.unwrap_err();
        assert_eq!(tracker.error(), Some(UPLOAD_FALLBACK_ERROR));
        assert_eq!(api.upload_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selecting_clears_error() {
        let api = Arc::new(MockDocumentApi::new());
        api.push_upload_error(400, Some("bad"));
        let mut tracker = tracker(&api);
        tracker.select_file(selection());
        tracker.submit().await.unwrap_err();

        tracker.select_file(UploadSelection::from_bytes("other.txt", b"x".to_vec()));
        assert_eq!(tracker.error(), None);
        assert_eq!(tracker.selection().unwrap().file_name, "other.txt");
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_poll_ready_sequence() {
        let api = Arc::new(MockDocumentApi::new());
        api.push_upload(42);
        api.push_status(DocumentStatus::Processing, None);
        api.push_status(DocumentStatus::Completed, None);
        let mut tracker = tracker(&api);
        tracker.select_file(selection());

        let start = Instant::now();
        assert_eq!(tracker.submit().await, Ok(DocumentId(42)));
        assert_eq!(tracker.state(), &ReadinessState::Processing);

        assert_eq!(
            tracker.next_event().await,
            Some(TrackerEvent::StatusChanged(ReadinessState::Processing))
        );
        assert_eq!(
            tracker.next_event().await,
            Some(TrackerEvent::StatusChanged(ReadinessState::Completed))
        );
        assert_eq!(start.elapsed(), Duration::from_millis(2000));

        assert_eq!(tracker.next_event().await, Some(TrackerEvent::Ready(DocumentId(42))));
        assert_eq!(start.elapsed(), Duration::from_millis(2500));

        assert_eq!(tracker.next_event().await, None);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(api.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_on_first_poll_still_waits() {
        let api = Arc::new(MockDocumentApi::new());
        api.push_upload(9);
        api.push_status(DocumentStatus::Completed, None);
        let mut tracker = tracker(&api);
        tracker.select_file(selection());
        tracker.submit().await.unwrap();

        let start = Instant::now();
        assert_eq!(
            tracker.next_event().await,
            Some(TrackerEvent::StatusChanged(ReadinessState::Completed))
        );
        assert_eq!(tracker.next_event().await, Some(TrackerEvent::Ready(DocumentId(9))));
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_is_transient() {
        let api = Arc::new(MockDocumentApi::new());
        api.push_upload(3);
        api.push_status(DocumentStatus::Processing, None);
        api.push_status_error(502);
        api.push_status(DocumentStatus::Processing, None);
        let mut tracker = tracker(&api);
        tracker.select_file(selection());
        tracker.submit().await.unwrap();

        tracker.next_event().await;
        let event = tracker.next_event().await;
        assert!(matches!(event, Some(TrackerEvent::PollFailed(_))));
        assert_eq!(tracker.state(), &ReadinessState::Processing);
        assert!(tracker.error().is_some());
        assert!(tracker.is_polling());

        tracker.next_event().await;
        assert_eq!(tracker.error(), None);
        assert_eq!(api.status_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_processing_failure_is_terminal() {
        let api = Arc::new(MockDocumentApi::new());
        api.push_upload(11);
        api.push_status(DocumentStatus::Failed, Some("Unsupported format"));
        let mut tracker = tracker(&api);
        tracker.select_file(selection());
        tracker.submit().await.unwrap();

        let expected = ReadinessState::Failed {
            message: "Unsupported format".to_string(),
        };
        assert_eq!(
            tracker.next_event().await,
            Some(TrackerEvent::StatusChanged(expected.clone()))
        );
        assert!(!tracker.is_polling());
        assert_eq!(tracker.next_event().await, None);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(api.status_calls(), 1);
        assert_eq!(tracker.state(), &expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling_and_resets() {
        let api = Arc::new(MockDocumentApi::new());
        api.push_upload(5);
        let mut tracker = tracker(&api);
        tracker.select_file(selection());
        tracker.submit().await.unwrap();
        tracker.next_event().await;
        assert_eq!(api.status_calls(), 1);

        tracker.cancel();
        assert!(tracker.selection().is_none());
        assert!(tracker.document_id().is_none());
        assert_eq!(tracker.state(), &ReadinessState::Idle);
        assert_eq!(tracker.next_event().await, None);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(api.status_calls(), 1);
    }

    fn status(seq: u64, status: DocumentStatus) -> PollEvent {
        PollEvent::Status {
            seq,
            response: DocumentStatusResponse {
                id: Some(DocumentId(1)),
                filename: Some("report.pdf".to_string()),
                status,
                uploaded_at: None,
                processed_at: None,
                error_message: None,
            },
        }
    }

    #[test]
    fn test_out_of_order_events_are_discarded() {
        let api = Arc::new(MockDocumentApi::new());
        let mut tracker = tracker(&api);
        tracker.document_id = Some(DocumentId(1));

        assert_eq!(
            tracker.apply(status(2, DocumentStatus::Completed)),
            Some(TrackerEvent::StatusChanged(ReadinessState::Completed))
        );

        assert_eq!(tracker.apply(status(1, DocumentStatus::Processing)), None);
        assert_eq!(tracker.state(), &ReadinessState::Completed);

        let late_failure = PollEvent::Failed {
            seq: 1,
            message: "timed out".to_string(),
        };
        assert_eq!(tracker.apply(late_failure), None);
        assert_eq!(tracker.error(), None);

        assert_eq!(tracker.apply(status(2, DocumentStatus::Processing)), None);
        assert_eq!(tracker.state(), &ReadinessState::Completed);
    }

    #[test]
    fn test_ready_for_another_document_is_ignored() {
        let api = Arc::new(MockDocumentApi::new());
        let mut tracker = tracker(&api);
        tracker.document_id = Some(DocumentId(1));

        let foreign = PollEvent::Ready {
            document_id: DocumentId(2),
        };
        assert_eq!(tracker.apply(foreign), None);
        assert_eq!(
            tracker.apply(PollEvent::Ready {
                document_id: DocumentId(1)
            }),
            Some(TrackerEvent::Ready(DocumentId(1)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubmit_while_tracking_is_refused() {
        let api = Arc::new(MockDocumentApi::new());
        api.push_upload(8);
        let mut tracker = tracker(&api);
        tracker.select_file(selection());
        tracker.submit().await.unwrap();

        assert_eq!(
            tracker.submit().await,
            Err(TrackerError::AlreadyTracking(DocumentId(8)))
        );
        assert_eq!(api.upload_calls(), 1);
    }
}
