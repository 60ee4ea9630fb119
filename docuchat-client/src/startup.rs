//! Terminal event loop.
//!
//! One task multiplexes three sources: lines typed by the user, poll events
//! from the upload tracker, and the answer to the question in flight. Input
//! keeps flowing while an answer is pending; a second question is refused
//! until the first one settles.

use crate::config::ClientConfig;
use crate::handlers::{Screen, SessionController, TrackerError, TrackerEvent};
use crate::models::{AskResponse, DocumentId, ReadinessState, UploadSelection};
use crate::services::{ApiClient, PollSettings};
use crate::views;
use client_core::error::ClientError;
use futures::future::{BoxFuture, FutureExt, OptionFuture};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

type PendingAnswer = BoxFuture<'static, Result<AskResponse, ClientError>>;

enum Flow {
    Continue,
    Quit,
}

/// Connect to the configured server and run the session until the user quits
/// or input ends.
pub async fn run<R, W>(config: &ClientConfig, input: R, output: &mut W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let client = Arc::new(ApiClient::new(&config.api)?);

    write!(output, "{}", views::banner(client.base_url()))?;
    match client.health().await {
        Ok(status) => {
            if !status.is_healthy() {
                tracing::warn!(status = %status.status, "Server reports degraded health");
            }
            write!(output, "{}", views::health(&status))?;
        }
        Err(e @ ClientError::Network(_)) => {
            tracing::warn!(error = %e, "Server unreachable");
            write!(output, "{}", views::unreachable(&e.to_string()))?;
        }
        Err(e) => {
            tracing::warn!(status = ?e.status(), error = %e, "Health check failed");
            write!(output, "{}", views::health_failed(&describe(&e)))?;
        }
    }

    let controller = SessionController::new(
        client.clone(),
        client,
        PollSettings::from(&config.api),
    );
    run_session(controller, input, output).await
}

/// Drive `controller` from `input`, writing everything shown to `output`.
///
/// Commands are recognised with surrounding whitespace ignored; questions are
/// sent exactly as typed.
pub async fn run_session<R, W>(
    mut controller: SessionController,
    input: R,
    output: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut input_open = true;
    let mut pending: Option<PendingAnswer> = None;
    let mut shown = ReadinessState::Idle;

    write!(output, "{}", views::upload_help())?;
    output.flush()?;

    loop {
        let polling = matches!(controller.screen(), Screen::Upload(t) if t.is_polling());
        if !input_open && pending.is_none() && !polling {
            break;
        }

        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line? {
                    Some(line) => {
                        let flow = handle_line(&mut controller, &line, &mut pending, &mut shown, output).await?;
                        if let Flow::Quit = flow {
                            break;
                        }
                    }
                    None => {
                        tracing::debug!("Input closed");
                        input_open = false;
                    }
                }
            }
            Some(event) = controller.next_upload_event(), if polling => {
                render_tracker_event(&controller, event, &mut shown, output)?;
            }
            Some(outcome) = OptionFuture::from(pending.as_mut()), if pending.is_some() => {
                pending = None;
                if let Screen::Chat(session) = controller.screen_mut() {
                    let reply = session.complete(outcome);
                    write!(output, "{}", views::message(reply))?;
                }
            }
            else => {}
        }
        output.flush()?;
    }

    output.flush()?;
    Ok(())
}

async fn handle_line<W: Write>(
    controller: &mut SessionController,
    line: &str,
    pending: &mut Option<PendingAnswer>,
    shown: &mut ReadinessState,
    output: &mut W,
) -> anyhow::Result<Flow> {
    if line.trim().is_empty() {
        return Ok(Flow::Continue);
    }

    if matches!(controller.screen(), Screen::Upload(_)) {
        handle_upload_command(controller, line.trim(), shown, output).await
    } else {
        handle_chat_input(controller, line, pending, shown, output).await
    }
}

async fn handle_upload_command<W: Write>(
    controller: &mut SessionController,
    line: &str,
    shown: &mut ReadinessState,
    output: &mut W,
) -> anyhow::Result<Flow> {
    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let documents = controller.documents().clone();
    let Screen::Upload(tracker) = controller.screen_mut() else {
        return Ok(Flow::Continue);
    };

    match command {
        "quit" | "exit" => return Ok(Flow::Quit),
        "help" => write!(output, "{}", views::upload_help())?,
        "file" if argument.is_empty() => write!(output, "{}", views::error("Usage: file <path>"))?,
        "file" => match UploadSelection::from_path(argument).await {
            Ok(selection) => {
                write!(output, "{}", views::selection(&selection))?;
                tracker.select_file(selection);
            }
            Err(e) => write!(output, "{}", views::error(&format!("Cannot select {}: {}", argument, e)))?,
        },
        "upload" => match tracker.submit().await {
            Ok(id) => {
                *shown = tracker.state().clone();
                write!(output, "Uploaded as document {}.\n{}", id, views::readiness(tracker.state()))?;
            }
            Err(TrackerError::Rejected(message)) => write!(output, "{}", views::error(&message))?,
            Err(e) => write!(output, "{}", views::error(&e.to_string()))?,
        },
        "cancel" => {
            tracker.cancel();
            *shown = ReadinessState::Idle;
            writeln!(output, "Selection cleared.")?;
        }
        "list" => match documents.list_documents().await {
            Ok(list) => write!(output, "{}", views::document_list(&list))?,
            Err(e) => write!(output, "{}", views::error(&describe(&e)))?,
        },
        "delete" => match argument.parse::<DocumentId>() {
            Ok(id) => match documents.delete_document(id).await {
                Ok(confirmation) => writeln!(output, "{}", confirmation.message)?,
                Err(e) => write!(output, "{}", views::error(&describe(&e)))?,
            },
            Err(_) => write!(output, "{}", views::error("Usage: delete <id>"))?,
        },
        "status" => write!(output, "{}", views::upload_screen(tracker))?,
        _ => writeln!(output, "Unknown command. Type help for commands.")?,
    }
    Ok(Flow::Continue)
}

async fn handle_chat_input<W: Write>(
    controller: &mut SessionController,
    line: &str,
    pending: &mut Option<PendingAnswer>,
    shown: &mut ReadinessState,
    output: &mut W,
) -> anyhow::Result<Flow> {
    let command = line.trim();
    match command {
        "/quit" | "/exit" => return Ok(Flow::Quit),
        "/new" => {
            *pending = None;
            *shown = ReadinessState::Idle;
            controller.on_new_document();
            write!(output, "{}", views::upload_help())?;
            return Ok(Flow::Continue);
        }
        _ => {}
    }

    let Screen::Chat(session) = controller.screen_mut() else {
        return Ok(Flow::Continue);
    };

    match command {
        "/help" => write!(output, "{}", views::chat_help())?,
        "/show" => write!(output, "{}", views::transcript(session))?,
        "/history" => match session.fetch_history().await {
            Ok(Some(history)) => write!(output, "{}", views::history(&history))?,
            Ok(None) => writeln!(output, "No conversation yet.")?,
            Err(e) => write!(output, "{}", views::error(&describe(&e)))?,
        },
        _ => match session.begin_ask(line) {
            Some(ask) => {
                if let Some(asked) = session.messages().last() {
                    write!(output, "{}", views::message(asked))?;
                }
                writeln!(output, "{}", views::THINKING_LINE)?;
                *pending = Some(ask.send().boxed());
            }
            None => writeln!(output, "Still waiting for the previous answer.")?,
        },
    }
    Ok(Flow::Continue)
}

fn render_tracker_event<W: Write>(
    controller: &SessionController,
    event: TrackerEvent,
    shown: &mut ReadinessState,
    output: &mut W,
) -> anyhow::Result<()> {
    match event {
        TrackerEvent::StatusChanged(state) => {
            if state != *shown {
                write!(output, "{}", views::readiness(&state))?;
                *shown = state;
            }
        }
        TrackerEvent::PollFailed(message) => {
            write!(output, "{}", views::error(&format!("Status check failed: {}", message)))?;
        }
        TrackerEvent::Ready(_) => {
            *shown = ReadinessState::Idle;
            if let Screen::Chat(session) = controller.screen() {
                write!(output, "{}", views::chat_intro(session))?;
            }
        }
    }
    Ok(())
}

fn describe(error: &ClientError) -> String {
    error
        .detail()
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}
