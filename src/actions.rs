//! Caller-facing entry points.
//!
//! Each entry point takes plain, unchecked parameters and always resolves to
//! text. Flow failures are logged and replaced by a fixed apology; the
//! `*_reply` variants also carry the [`ErrorKind`] for telemetry.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::{
    error::{ErrorKind, FlowError, ValidationError},
    flow::{CarDescriptionFlow, ChatFlow, Flow, FeedbackSummaryFlow, Orchestrator},
    prompt::PromptVariant,
    schema::Contract,
    types::{CarDescriptionInput, ChatInput, ChatMessage, FeedbackRequest, FeedbackSummaryInput},
};

pub const CHAT_FALLBACK: &str = "Sorry, I encountered an error. Please try again.";
pub const FEEDBACK_FALLBACK: &str = "Sorry, I couldn't process your feedback at this time.";
pub const FEEDBACK_CONFIRMATION: &str = "Thank you for your feedback! It helps me learn and improve.";
pub const DESCRIPTION_FALLBACK: &str = "Sorry, I couldn't generate a description at this time.";

/// What an entry point resolved to. `error` is `None` on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReply {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl ActionReply {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
        }
    }

    fn failed(fallback: &str, err: &FlowError) -> Self {
        error!(
            flow = err.flow(),
            kind = ?err.kind(),
            stage = ?err.stage(),
            "Error in {} flow: {}",
            err.flow(),
            err
        );
        Self {
            text: fallback.to_string(),
            error: Some(err.kind()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Decodes a raw request body. Anything that is not JSON fails the way a
/// malformed record does, before the flow runs.
fn parse_body(flow: &'static str, schema: &'static str, body: &[u8]) -> Result<Value, FlowError> {
    serde_json::from_slice(body).map_err(|e| FlowError::InvalidInput {
        flow,
        source: ValidationError::new(schema, "<root>", format!("is not valid JSON: {}", e)),
    })
}

#[derive(Clone)]
pub struct Actions {
    orchestrator: Arc<Orchestrator>,
    chat: ChatFlow,
}

impl Actions {
    pub fn new(orchestrator: Arc<Orchestrator>, variant: PromptVariant) -> Self {
        Self {
            orchestrator,
            chat: ChatFlow::new(variant),
        }
    }

    pub async fn send_chat(&self, message: &str, history: &[ChatMessage]) -> String {
        self.send_chat_reply(message, history).await.text
    }

    pub async fn send_chat_reply(&self, message: &str, history: &[ChatMessage]) -> ActionReply {
        self.chat_json(json!({ "message": message, "history": history })).await
    }

    /// Chat on a raw `{message, history}` record.
    pub async fn chat_json(&self, raw: Value) -> ActionReply {
        match self.orchestrator.run_json(&self.chat, raw).await {
            Ok(output) => ActionReply::ok(output.response),
            Err(err) => ActionReply::failed(CHAT_FALLBACK, &err),
        }
    }

    /// Chat on an undecoded request body.
    pub async fn chat_body(&self, body: &[u8]) -> ActionReply {
        match parse_body(ChatFlow::NAME, ChatInput::schema().name, body) {
            Ok(raw) => self.chat_json(raw).await,
            Err(err) => ActionReply::failed(CHAT_FALLBACK, &err),
        }
    }

    pub async fn submit_feedback(&self, label: &str, history: &[ChatMessage]) -> String {
        self.submit_feedback_reply(label, history).await.text
    }

    pub async fn submit_feedback_reply(&self, label: &str, history: &[ChatMessage]) -> ActionReply {
        self.feedback_json(json!({ "label": label, "history": history })).await
    }

    /// Feedback on a raw `{label, history}` record. The label and history are
    /// folded into the summary flow's single `feedback` field.
    pub async fn feedback_json(&self, raw: Value) -> ActionReply {
        let result = async {
            let request = FeedbackRequest::from_value(raw).map_err(|source| FlowError::InvalidInput {
                flow: "feedback",
                source,
            })?;
            let feedback = self
                .orchestrator
                .prompts()
                .feedback_context(&request.label, &request.history)
                .map_err(|source| FlowError::Template { flow: "feedback", source })?;
            self.orchestrator
                .run(&FeedbackSummaryFlow, &FeedbackSummaryInput { feedback })
                .await
        }
        .await;

        match result {
            Ok(output) => {
                info!(summary = %output.summary, "Feedback summary");
                ActionReply::ok(FEEDBACK_CONFIRMATION)
            }
            Err(err) => ActionReply::failed(FEEDBACK_FALLBACK, &err),
        }
    }

    pub async fn feedback_body(&self, body: &[u8]) -> ActionReply {
        match parse_body("feedback", FeedbackRequest::schema().name, body) {
            Ok(raw) => self.feedback_json(raw).await,
            Err(err) => ActionReply::failed(FEEDBACK_FALLBACK, &err),
        }
    }

    pub async fn generate_car_description(&self, fields: Value) -> String {
        self.car_description_json(fields).await.text
    }

    pub async fn car_description_json(&self, fields: Value) -> ActionReply {
        match self.orchestrator.run_json(&CarDescriptionFlow, fields).await {
            Ok(output) => ActionReply::ok(output.description),
            Err(err) => ActionReply::failed(DESCRIPTION_FALLBACK, &err),
        }
    }

    pub async fn car_description_body(&self, body: &[u8]) -> ActionReply {
        match parse_body(CarDescriptionFlow::NAME, CarDescriptionInput::schema().name, body) {
            Ok(raw) => self.car_description_json(raw).await,
            Err(err) => ActionReply::failed(DESCRIPTION_FALLBACK, &err),
        }
    }
}
