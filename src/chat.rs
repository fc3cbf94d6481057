//! Assistant conversation state.
//!
//! The user's message is appended as soon as it is submitted; the reply (or a
//! fixed fallback on failure) is appended when the assistant call settles.
//! Only one call may be pending at a time, so replies never interleave.

use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use thiserror::Error;
use tracing::debug;

use crate::api::AssistantReply;
use crate::query::{Mutation, MutationId};

pub const GREETING: &str =
  "Hello! I can help you analyze your financial data. Ask me about invoices or payments.";

/// Shown in place of a reply when the assistant call fails
pub const ERROR_FALLBACK: &str = "Sorry, I encountered an error.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  User,
  Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
  pub role: Role,
  pub content: String,
  pub timestamp: DateTime<Utc>,
}

impl Message {
  fn now(role: Role, content: impl Into<String>) -> Self {
    Self {
      role,
      content: content.into(),
      timestamp: Utc::now(),
    }
  }
}

/// Why a submission was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
  #[error("message is empty")]
  Empty,
  #[error("waiting for the previous reply")]
  Pending,
}

pub struct ChatSession {
  messages: Vec<Message>,
  /// Filled by settle callbacks, drained into `messages` on poll
  inbox: Rc<RefCell<Vec<Message>>>,
  mutation: Mutation<String, AssistantReply>,
}

impl ChatSession {
  pub fn new<F, Fut>(ask: F) -> Self
  where
    F: Fn(String) -> Fut + 'static,
    Fut: Future<Output = Result<AssistantReply, String>> + Send + 'static,
  {
    Self {
      messages: Vec::new(),
      inbox: Rc::new(RefCell::new(Vec::new())),
      mutation: Mutation::new(ask),
    }
  }

  /// Seed the conversation with the assistant's opening line.
  pub fn with_greeting(mut self, greeting: &str) -> Self {
    self.messages.push(Message::now(Role::Assistant, greeting));
    self
  }

  /// Append the user's message and ask the assistant.
  pub fn submit(&mut self, text: &str) -> Result<MutationId, SubmitError> {
    if text.trim().is_empty() {
      return Err(SubmitError::Empty);
    }
    if self.mutation.is_pending() {
      return Err(SubmitError::Pending);
    }

    self.messages.push(Message::now(Role::User, text));
    let replies = self.inbox.clone();
    let failures = self.inbox.clone();
    let id = self.mutation.mutate_with(
      text.to_string(),
      move |reply: &AssistantReply| {
        replies.borrow_mut().push(Message {
          role: Role::Assistant,
          content: reply.response.clone(),
          timestamp: reply.timestamp,
        });
      },
      move |_error: &str| {
        failures
          .borrow_mut()
          .push(Message::now(Role::Assistant, ERROR_FALLBACK));
      },
    );
    debug!(?id, "assistant query submitted");
    Ok(id)
  }

  /// Append replies for settled calls. Returns whether any were appended.
  pub fn poll(&mut self) -> bool {
    let changed = !self.mutation.poll().is_empty();
    self.messages.append(&mut self.inbox.borrow_mut());
    changed
  }

  pub fn messages(&self) -> &[Message] {
    &self.messages
  }

  pub fn is_pending(&self) -> bool {
    self.mutation.is_pending()
  }

  /// Error from the most recent call, cleared by the next successful reply.
  pub fn last_error(&self) -> Option<&str> {
    self.mutation.last_error()
  }

  /// Server timestamp of the most recent successful reply
  pub fn last_reply_at(&self) -> Option<DateTime<Utc>> {
    self.mutation.last_result().map(|reply| reply.timestamp)
  }
}
