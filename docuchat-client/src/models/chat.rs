use super::document::DocumentId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown in place of an answer whenever asking fails, whatever the cause.
pub const ASK_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of `POST /chat/ask`. `session_id` is sent as `null` on the first turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskRequest {
    pub document_id: DocumentId,
    pub question: String,
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub session_id: SessionId,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of `GET /chat/history/{session_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistory {
    pub session_id: SessionId,
    pub document_id: DocumentId,
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

/// An entry of the in-memory conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    User {
        content: String,
    },
    Assistant {
        content: String,
        sources: Vec<String>,
        /// Set when the entry is a locally synthesized failure notice.
        error: bool,
    },
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }

    pub fn answer(response: AskResponse) -> Self {
        ChatMessage::Assistant {
            content: response.answer,
            sources: response.sources,
            error: false,
        }
    }

    pub fn failure() -> Self {
        ChatMessage::Assistant {
            content: ASK_ERROR_MESSAGE.to_string(),
            sources: Vec::new(),
            error: true,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            ChatMessage::User { .. } => Role::User,
            ChatMessage::Assistant { .. } => Role::Assistant,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ChatMessage::User { content } | ChatMessage::Assistant { content, .. } => content,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ChatMessage::Assistant { error: true, .. })
    }
}
