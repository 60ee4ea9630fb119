//! Background polling of a document's processing status.
//!
//! A [`StatusPoller`] owns a spawned task that issues one status request right
//! away and then one per interval until the document reaches a terminal
//! state. The task is tied to a cancellation token whose drop guard lives in
//! the poller: dropping the poller stops the task on the spot, including a
//! request in flight or a pending ready delay.

use super::DocumentApi;
use crate::models::{DocumentId, DocumentStatus, DocumentStatusResponse};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};

const EVENT_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    /// Delay between observing `completed` and emitting [`PollEvent::Ready`].
    pub ready_delay: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            ready_delay: Duration::from_millis(500),
        }
    }
}

impl From<&crate::config::ApiSettings> for PollSettings {
    fn from(settings: &crate::config::ApiSettings) -> Self {
        Self {
            interval: settings.poll_interval(),
            ready_delay: settings.ready_delay(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PollEvent {
    /// A status response. `seq` increases with every request issued.
    Status {
        seq: u64,
        response: DocumentStatusResponse,
    },
    /// A single poll failed; polling continues.
    Failed { seq: u64, message: String },
    /// Emitted once, `ready_delay` after a `completed` status.
    Ready { document_id: DocumentId },
}

pub struct StatusPoller {
    document_id: DocumentId,
    events: mpsc::Receiver<PollEvent>,
    _stop: DropGuard,
}

impl StatusPoller {
    /// Spawn the polling task. Must be called from within a tokio runtime.
    pub fn start(
        api: Arc<dyn DocumentApi>,
        document_id: DocumentId,
        settings: PollSettings,
    ) -> Self {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        tokio::spawn(poll_loop(api, document_id, settings, token.clone(), tx));

        tracing::debug!(
            document_id = %document_id,
            interval_ms = settings.interval.as_millis() as u64,
            "Status polling started"
        );

        Self {
            document_id,
            events: rx,
            _stop: token.drop_guard(),
        }
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    /// Next event, or `None` once the task has finished.
    pub async fn next(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }
}

async fn poll_loop(
    api: Arc<dyn DocumentApi>,
    document_id: DocumentId,
    settings: PollSettings,
    token: CancellationToken,
    tx: mpsc::Sender<PollEvent>,
) {
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seq: u64 = 0;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        seq += 1;
        let result = tokio::select! {
            _ = token.cancelled() => break,
            result = api.get_status(document_id) => result,
        };

        match result {
            Ok(response) => {
                let status = response.status;
                tracing::debug!(document_id = %document_id, seq, status = status.as_str(), "Status polled");

                if tx.send(PollEvent::Status { seq, response }).await.is_err() {
                    break;
                }

                if status == DocumentStatus::Completed {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(settings.ready_delay) => {}
                    }
                    let _ = tx.send(PollEvent::Ready { document_id }).await;
                }
                if status.is_terminal() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(
                    document_id = %document_id,
                    seq,
                    status = ?e.status(),
                    transient = e.is_transient(),
                    error = %e,
                    "Status poll failed"
                );
                let event = PollEvent::Failed {
                    seq,
                    message: e.to_string(),
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!(document_id = %document_id, polls = seq, "Status polling stopped");
}
