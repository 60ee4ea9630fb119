//! Plain-text rendering for the terminal front end.
//!
//! Every function here is pure: state in, lines out. Nothing in this module
//! talks to the network or holds state.

use crate::handlers::{ChatSession, UploadTracker};
use crate::models::{
    ChatHistory, ChatMessage, DocumentSummary, HealthStatus, ReadinessState, Role,
    UploadSelection,
};
use chrono::NaiveDateTime;

pub const PROCESSING_LINE: &str = "Processing document...";
pub const READY_LINE: &str = "Document ready!";
pub const THINKING_LINE: &str = "Assistant is thinking...";

pub fn banner(base_url: &str) -> String {
    format!("DocuChat - ask questions about your documents\nServer: {}\n", base_url)
}

pub fn upload_help() -> &'static str {
    "Commands:\n  file <path>   select a document (PDF, DOC, DOCX or TXT, up to 10MB)\n  upload        upload the selected document\n  cancel        clear the selection and stop tracking\n  status        show the selection and processing state\n  list          list uploaded documents\n  delete <id>   delete a document\n  help          show this help\n  quit          exit\n"
}

pub fn chat_help() -> &'static str {
    "Type a question and press enter.\n  /show        repeat the conversation so far\n  /history     show the server-side conversation\n  /new         upload a different document\n  /help        show this help\n  /quit        exit\n"
}

pub fn health(status: &HealthStatus) -> String {
    let mut out = format!("Server status: {}", status.status);
    if let Some(limit) = &status.rate_limit {
        out.push_str(&format!(
            " ({} of {} requests remaining this month)",
            limit.requests_remaining, limit.requests_limit
        ));
    }
    out.push('\n');
    out
}

pub fn unreachable(error: &str) -> String {
    format!("Warning: server unreachable ({}). Commands will fail until it is up.\n", error)
}

/// The server answered the health check, but not with a usable status.
pub fn health_failed(error: &str) -> String {
    format!("Warning: health check failed ({}).\n", error)
}

pub fn selection(selection: &UploadSelection) -> String {
    let mut out = format!(
        "Selected {} ({})\n",
        selection.file_name,
        format_size(selection.size)
    );
    for hint in selection.advisories() {
        out.push_str(&format!("  note: {}\n", hint));
    }
    out
}

/// Status line for the tracked document; empty while idle.
pub fn readiness(state: &ReadinessState) -> String {
    match state {
        ReadinessState::Idle => String::new(),
        ReadinessState::Processing => format!("{}\n", PROCESSING_LINE),
        ReadinessState::Completed => format!("{}\n", READY_LINE),
        ReadinessState::Failed { message } => format!("Processing failed: {}\n", message),
    }
}

pub fn error(message: &str) -> String {
    format!("Error: {}\n", message)
}

/// Full upload screen: selection, readiness and any pending error.
pub fn upload_screen(tracker: &UploadTracker) -> String {
    let mut out = String::new();
    match tracker.selection() {
        Some(s) => out.push_str(&selection(s)),
        None => out.push_str("No file selected.\n"),
    }
    out.push_str(&readiness(tracker.state()));
    if let Some(message) = tracker.error() {
        out.push_str(&error(message));
    }
    out
}

pub fn message(message: &ChatMessage) -> String {
    match message {
        ChatMessage::User { content } => format!("You: {}\n", content),
        ChatMessage::Assistant {
            content,
            sources,
            error,
        } => {
            let label = if *error { "Assistant (error)" } else { "Assistant" };
            let mut out = format!("{}: {}\n", label, content);
            if !sources.is_empty() {
                out.push_str("Sources:\n");
                for source in sources {
                    out.push_str(&format!("  - {}\n", source));
                }
            }
            out
        }
    }
}

/// Whole transcript, oldest first, with the thinking line while an answer is
/// pending.
pub fn transcript(session: &ChatSession) -> String {
    let mut out = String::new();
    for m in session.messages() {
        out.push_str(&message(m));
    }
    if session.is_awaiting_response() {
        out.push_str(THINKING_LINE);
        out.push('\n');
    }
    out
}

pub fn chat_intro(session: &ChatSession) -> String {
    format!(
        "Chatting about document {}. Type /help for commands.\n",
        session.document_id()
    )
}

pub fn history(history: &ChatHistory) -> String {
    let mut out = format!(
        "Session {} (document {}), {} messages\n",
        history.session_id,
        history.document_id,
        history.messages.len()
    );
    for m in &history.messages {
        let who = match m.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        out.push_str(&format!("[{}] {}: {}\n", timestamp(m.created_at), who, m.content));
    }
    out
}

pub fn document_list(documents: &[DocumentSummary]) -> String {
    if documents.is_empty() {
        return "No documents uploaded yet.\n".to_string();
    }

    let mut out = String::new();
    for d in documents {
        out.push_str(&format!(
            "{:>5}  {:<10}  {:>9}  {}  {}\n",
            d.id,
            d.status.as_str(),
            format_size(d.file_size),
            timestamp(d.uploaded_at),
            d.filename
        ));
    }
    out
}

fn timestamp(at: Option<NaiveDateTime>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
