//! Per-session conversation state behind the chat UIs.
//!
//! A [`ChatSession`] owns the ordered [`DisplayMessage`]s of one conversation
//! and lets at most one request be in flight. Each user action is split into a
//! synchronous `begin_*` step, which updates the visible state at once, and a
//! `complete_*` step applied when the action resolves. [`ChatSession::send`]
//! and [`ChatSession::give_feedback`] chain both around a call to [`Actions`].

use serde::{Deserialize, Serialize};

use crate::{
    actions::{ActionReply, Actions},
    error::SessionError,
    types::{ChatMessage, Role},
};

pub const FEEDBACK_ERROR: &str = "Could not submit feedback. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Positive,
    Negative,
}

impl Feedback {
    /// The label sent to the feedback entry point.
    pub fn label(&self) -> &'static str {
        match self {
            Feedback::Positive => "Good response",
            Feedback::Negative => "Bad response",
        }
    }
}

/// A message as the UI shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub feedback: Option<Feedback>,
}

impl DisplayMessage {
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    FeedbackSubmitted(String),
    FeedbackError(String),
}

/// A chat request whose user message is already on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChat {
    pub message: String,
    pub history: Vec<ChatMessage>,
}

/// A feedback request whose mark is already on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFeedback {
    pub message_id: u64,
    pub label: &'static str,
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Chat,
    Feedback(u64),
}

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<DisplayMessage>,
    next_id: u64,
    in_flight: Option<InFlight>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    pub fn message(&self, id: u64) -> Option<&DisplayMessage> {
        self.messages.iter().find(|msg| msg.id == id)
    }

    pub fn last_model_message(&self) -> Option<&DisplayMessage> {
        self.messages.iter().rev().find(|msg| msg.role == Role::Model)
    }

    /// While busy, input and feedback controls are disabled.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(DisplayMessage::to_chat_message).collect()
    }

    /// Shows the user's message and returns the request to send. Blank input
    /// is rejected without touching the session.
    pub fn begin_send(&mut self, input: &str) -> Result<PendingChat, SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        if input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let history = self.history();
        self.push(Role::User, input.to_string());
        self.in_flight = Some(InFlight::Chat);

        Ok(PendingChat {
            message: input.to_string(),
            history,
        })
    }

    /// Appends the model's reply, whatever text the action resolved to.
    pub fn complete_send(&mut self, response: String) -> &DisplayMessage {
        self.in_flight = None;
        self.push(Role::Model, response)
    }

    /// Marks the message optimistically and returns the request to send. The
    /// history covers the conversation up to and including the marked message.
    pub fn begin_feedback(&mut self, message_id: u64, feedback: Feedback) -> Result<PendingFeedback, SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        let index = self
            .messages
            .iter()
            .position(|msg| msg.id == message_id)
            .ok_or(SessionError::UnknownMessage(message_id))?;

        let target = &mut self.messages[index];
        if target.role != Role::Model {
            return Err(SessionError::NotModelMessage(message_id));
        }
        if target.feedback.is_some() {
            return Err(SessionError::FeedbackAlreadyGiven(message_id));
        }
        target.feedback = Some(feedback);
        self.in_flight = Some(InFlight::Feedback(message_id));

        Ok(PendingFeedback {
            message_id,
            label: feedback.label(),
            history: self.messages[..=index].iter().map(DisplayMessage::to_chat_message).collect(),
        })
    }

    /// Keeps the mark if the action succeeded and clears it otherwise.
    pub fn complete_feedback(&mut self, message_id: u64, reply: &ActionReply) -> Notification {
        self.in_flight = None;
        if reply.is_ok() {
            return Notification::FeedbackSubmitted(reply.text.clone());
        }
        if let Some(msg) = self.messages.iter_mut().find(|msg| msg.id == message_id) {
            msg.feedback = None;
        }
        Notification::FeedbackError(FEEDBACK_ERROR.to_string())
    }

    pub async fn send(&mut self, actions: &Actions, input: &str) -> Result<&DisplayMessage, SessionError> {
        let pending = self.begin_send(input)?;
        let response = actions.send_chat(&pending.message, &pending.history).await;
        Ok(self.complete_send(response))
    }

    pub async fn give_feedback(
        &mut self,
        actions: &Actions,
        message_id: u64,
        feedback: Feedback,
    ) -> Result<Notification, SessionError> {
        let pending = self.begin_feedback(message_id, feedback)?;
        let reply = actions.submit_feedback_reply(pending.label, &pending.history).await;
        Ok(self.complete_feedback(pending.message_id, &reply))
    }

    fn push(&mut self, role: Role, content: String) -> &DisplayMessage {
        self.next_id += 1;
        self.messages.push(DisplayMessage {
            id: self.next_id,
            role,
            content,
            feedback: None,
        });
        &self.messages[self.messages.len() - 1]
    }
}
