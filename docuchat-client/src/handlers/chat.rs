//! Question/answer turns against a ready document.
//!
//! Asking is split in two so a front end can keep taking input while an
//! answer is on its way: [`ChatSession::begin_ask`] records the question and
//! hands back a [`PendingAsk`] that owns everything needed to reach the
//! server, and [`ChatSession::complete`] folds the outcome back in.

use crate::models::{AskRequest, AskResponse, ChatHistory, ChatMessage, DocumentId, SessionId};
use crate::services::ChatApi;
use client_core::error::ClientError;
use std::sync::Arc;

/// An in-flight question, detached from the session that issued it.
pub struct PendingAsk {
    api: Arc<dyn ChatApi>,
    request: AskRequest,
}

impl PendingAsk {
    pub async fn send(self) -> Result<AskResponse, ClientError> {
        self.api.ask(&self.request).await
    }
}

pub struct ChatSession {
    api: Arc<dyn ChatApi>,
    document_id: DocumentId,
    messages: Vec<ChatMessage>,
    session_id: Option<SessionId>,
    awaiting_response: bool,
}

impl ChatSession {
    pub fn new(api: Arc<dyn ChatApi>, document_id: DocumentId) -> Self {
        Self {
            api,
            document_id,
            messages: Vec::new(),
            session_id: None,
            awaiting_response: false,
        }
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    /// Record `question` and prepare its request.
    ///
    /// Returns `None`, changing nothing, for a blank question or while a
    /// previous question is still unanswered.
    pub fn begin_ask(&mut self, question: &str) -> Option<PendingAsk> {
        if question.trim().is_empty() || self.awaiting_response {
            return None;
        }

        self.messages.push(ChatMessage::user(question));
        self.awaiting_response = true;

        Some(PendingAsk {
            api: self.api.clone(),
            request: AskRequest {
                document_id: self.document_id,
                question: question.to_string(),
                session_id: self.session_id,
            },
        })
    }

    /// Apply the outcome of the pending question and return the entry added.
    pub fn complete(&mut self, outcome: Result<AskResponse, ClientError>) -> &ChatMessage {
        self.awaiting_response = false;

        let message = match outcome {
            Ok(response) => {
                if self.session_id.is_none() {
                    tracing::info!(
                        document_id = %self.document_id,
                        session_id = %response.session_id,
                        "Chat session established"
                    );
                    self.session_id = Some(response.session_id);
                }
                ChatMessage::answer(response)
            }
            Err(e) => {
                tracing::warn!(document_id = %self.document_id, error = %e, "Question failed");
                ChatMessage::failure()
            }
        };

        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Ask and wait for the answer in one step.
    pub async fn ask(&mut self, question: &str) -> Option<&ChatMessage> {
        let pending = self.begin_ask(question)?;
        let outcome = pending.send().await;
        Some(self.complete(outcome))
    }

    /// Server-side record of this conversation. `None` before the first answer.
    pub async fn fetch_history(&self) -> Result<Option<ChatHistory>, ClientError> {
        match self.session_id {
            Some(session_id) => self.api.get_history(session_id).await.map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, ASK_ERROR_MESSAGE};
    use crate::services::mock::MockChatApi;

    fn session(api: &Arc<MockChatApi>) -> ChatSession {
        ChatSession::new(api.clone(), DocumentId(42))
    }

    #[tokio::test]
    async fn test_first_answer_binds_session() {
        let api = Arc::new(MockChatApi::new());
        api.push_answer("It's a report.", 7, &[]);
        let mut chat = session(&api);

        let reply = chat.ask("What is this document about?").await.unwrap().clone();
        assert_eq!(
            reply,
            ChatMessage::Assistant {
                content: "It's a report.".to_string(),
                sources: vec![],
                error: false,
            }
        );
        assert_eq!(
            chat.messages(),
            &[
                ChatMessage::user("What is this document about?"),
                reply.clone()
            ]
        );
        assert_eq!(chat.session_id(), Some(SessionId(7)));
        assert_eq!(api.requests()[0].session_id, None);
        assert!(!chat.is_awaiting_response());
    }

    #[tokio::test]
    async fn test_session_never_rebinds() {
        let api = Arc::new(MockChatApi::new());
        api.push_answer("one", 7, &[]);
        api.push_answer("two", 99, &["page 2"]);
        api.push_answer("three", 100, &[]);
        let mut chat = session(&api);

        chat.ask("q1").await;
        chat.ask("q2").await;
        chat.ask("q3").await;

        assert_eq!(chat.session_id(), Some(SessionId(7)));
        let sent: Vec<_> = api.requests().iter().map(|r| r.session_id).collect();
        assert_eq!(sent, vec![None, Some(SessionId(7)), Some(SessionId(7))]);
        assert_eq!(chat.messages().len(), 6);
    }

    #[tokio::test]
    async fn test_blank_question_is_ignored() {
        let api = Arc::new(MockChatApi::new());
        let mut chat = session(&api);

        assert!(chat.ask("").await.is_none());
        assert!(chat.ask("   \t").await.is_none());
        assert!(chat.messages().is_empty());
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn test_second_question_while_waiting_has_no_effect() {
        let api = Arc::new(MockChatApi::new());
        api.push_answer("first answer", 1, &[]);
        let mut chat = session(&api);

        let pending = chat.begin_ask("first").unwrap();
        assert!(chat.is_awaiting_response());
        assert!(chat.begin_ask("second").is_none());
        assert_eq!(chat.messages(), &[ChatMessage::user("first")]);

        let outcome = pending.send().await;
        chat.complete(outcome);

        assert_eq!(api.requests().len(), 1);
        assert_eq!(chat.messages().len(), 2);
        assert!(chat.begin_ask("second").is_some());
    }

    #[tokio::test]
    async fn test_failure_appends_error_and_keeps_session() {
        let api = Arc::new(MockChatApi::new());
        api.push_answer("ok", 7, &[]);
        api.push_failure(500);
        let mut chat = session(&api);

        chat.ask("first").await;
        let reply = chat.ask("second").await.unwrap().clone();

        assert!(reply.is_error());
        assert_eq!(reply.content(), ASK_ERROR_MESSAGE);
        assert_eq!(reply.role(), Role::Assistant);
        assert_eq!(chat.session_id(), Some(SessionId(7)));
        assert!(!chat.is_awaiting_response());
    }

    #[tokio::test]
    async fn test_failure_before_binding_leaves_session_unset() {
        let api = Arc::new(MockChatApi::new());
        api.push_failure(503);
        api.push_answer("recovered", 12, &["section 1"]);
        let mut chat = session(&api);

        chat.ask("first").await;
        assert_eq!(chat.session_id(), None);

        chat.ask("again").await;
        assert_eq!(chat.session_id(), Some(SessionId(12)));
        assert_eq!(api.requests()[1].session_id, None);
    }

    #[tokio::test]
    async fn test_history_requires_session() {
        let api = Arc::new(MockChatApi::new());
        api.push_answer("answer", 3, &[]);
        let mut chat = session(&api);

        assert!(chat.fetch_history().await.unwrap().is_none());

        chat.ask("hello").await;
        let history = chat.fetch_history().await.unwrap().unwrap();
        assert_eq!(history.session_id, SessionId(3));
        assert_eq!(history.document_id, DocumentId(42));
    }
}
