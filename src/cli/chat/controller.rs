use std::future::Future;
use std::io;
use std::time::Duration;

use futures::future;
use tracing::{debug, error, warn};

use super::message::{Message, Role};
use super::render::RenderTarget;
use crate::ask_client::{AskError, AskReply, AskTransport};

pub const SERVER_ERROR_TEXT: &str = "Sorry, I encountered an error. Please try again.";
pub const TRANSPORT_ERROR_TEXT: &str = "Sorry, something went wrong. Please try again.";

/// How a submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was blank; nothing was shown or sent.
    Ignored,
    Answered,
    ServerError,
    TransportError,
}

/// Drives one conversation: takes queries, asks the transport and renders
/// the exchange on its target.
///
/// Submissions take `&mut self`, so a controller never has two requests in
/// flight and its target never holds two loading placeholders.
pub struct ChatController<T, R> {
    transport: T,
    target: R,
    request_timeout: Duration,
}

impl<T: AskTransport, R: RenderTarget> ChatController<T, R> {
    pub fn new(transport: T, target: R, request_timeout: Duration) -> Self {
        Self {
            transport,
            target,
            request_timeout,
        }
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    /// Submit `query` as if typed into an input field.
    pub async fn submit_query(&mut self, query: &str) -> io::Result<SubmitOutcome> {
        let mut field = query.to_string();
        self.submit_input(&mut field).await
    }

    /// Submit the contents of `field`, clearing it once the user bubble is shown.
    pub async fn submit_input(&mut self, field: &mut String) -> io::Result<SubmitOutcome> {
        self.submit_input_until(field, future::pending()).await
    }

    /// Like [`submit_input`](Self::submit_input), but gives up on the request
    /// when `cancel` completes first.
    ///
    /// Request failures of every kind end up as a fallback bot message; only
    /// errors from the render target itself are returned.
    pub async fn submit_input_until<C>(&mut self, field: &mut String, cancel: C) -> io::Result<SubmitOutcome>
    where
        C: Future<Output = ()>,
    {
        let query = field.trim().to_string();
        if query.is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }

        self.render_message(Role::User, &query, false)?;
        field.clear();
        self.target.show_loading()?;

        let reply = tokio::select! {
            result = tokio::time::timeout(self.request_timeout, self.transport.ask(&query)) => {
                result.unwrap_or(Err(AskError::TimedOut(self.request_timeout)))
            }
            () = cancel => Err(AskError::Cancelled),
        };

        self.target.remove_loading()?;

        let outcome = match reply {
            Ok(AskReply::Answer(text)) => {
                debug!("Received answer ({} bytes)", text.len());
                self.render_message(Role::Bot, &text, true)?;
                SubmitOutcome::Answered
            }
            Ok(AskReply::Rejected(detail)) => {
                warn!("Server reported an error: {}", detail);
                self.render_message(Role::Bot, SERVER_ERROR_TEXT, false)?;
                SubmitOutcome::ServerError
            }
            Err(e) => {
                error!("Error: {}", e);
                self.render_message(Role::Bot, TRANSPORT_ERROR_TEXT, false)?;
                SubmitOutcome::TransportError
            }
        };

        self.target.scroll_to_latest()?;
        Ok(outcome)
    }

    /// Append a bubble. Only bot content is ever rendered as markdown.
    pub fn render_message(&mut self, role: Role, content: &str, is_formatted: bool) -> io::Result<()> {
        self.target.append(Message::new(role, content, is_formatted))
    }

    /// Remove every message from the view.
    pub fn clear_conversation(&mut self) -> io::Result<()> {
        self.target.clear()
    }
}
