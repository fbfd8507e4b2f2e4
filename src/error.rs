use serde::Serialize;
use thiserror::Error;

use crate::flow::FlowStage;

/// A record did not match its declared schema.
///
/// `field` is a path into the record (`history[1].role`), or `<root>` when the
/// record itself has the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{schema}: field `{field}` {reason}")]
pub struct ValidationError {
    pub schema: &'static str,
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(schema: &'static str, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            schema,
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failures talking to the generative-text provider.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider unreachable: {0}")]
    Unreachable(String),
    #[error("provider did not answer before the deadline")]
    Timeout,
    #[error("provider returned status {status}: {body}")]
    ProviderStatus { status: u16, body: String },
    #[error("provider reply is not valid JSON: {0}")]
    UnparseableReply(String),
    #[error("provider reply had no content")]
    MissingReply,
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Timeout
        } else if err.is_decode() {
            ModelError::UnparseableReply(err.to_string())
        } else {
            ModelError::Unreachable(err.to_string())
        }
    }
}

/// Coarse failure class exposed to callers for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Model,
    Template,
}

/// A failed flow invocation, tagged with the flow's name.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("{flow}: invalid input: {source}")]
    InvalidInput {
        flow: &'static str,
        source: ValidationError,
    },
    #[error("{flow}: failed to render prompt: {source}")]
    Template {
        flow: &'static str,
        source: minijinja::Error,
    },
    #[error("{flow}: model invocation failed: {source}")]
    Model {
        flow: &'static str,
        source: ModelError,
    },
    #[error("{flow}: invalid model output: {source}")]
    InvalidOutput {
        flow: &'static str,
        source: ValidationError,
    },
}

impl FlowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::InvalidInput { .. } | FlowError::InvalidOutput { .. } => ErrorKind::Validation,
            FlowError::Template { .. } => ErrorKind::Template,
            FlowError::Model { .. } => ErrorKind::Model,
        }
    }

    /// The last stage the invocation reached before failing.
    pub fn stage(&self) -> FlowStage {
        match self {
            FlowError::InvalidInput { .. } => FlowStage::Received,
            FlowError::Template { .. } => FlowStage::Validated,
            FlowError::Model { .. } => FlowStage::PromptBuilt,
            FlowError::InvalidOutput { .. } => FlowStage::ModelInvoked,
        }
    }

    pub fn flow(&self) -> &'static str {
        match self {
            FlowError::InvalidInput { flow, .. }
            | FlowError::Template { flow, .. }
            | FlowError::Model { flow, .. }
            | FlowError::InvalidOutput { flow, .. } => flow,
        }
    }
}

/// Rejections from the presentation-layer session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("a request is already in flight")]
    Busy,
    #[error("message is empty")]
    EmptyInput,
    #[error("no message with id {0}")]
    UnknownMessage(u64),
    #[error("message {0} was not written by the model")]
    NotModelMessage(u64),
    #[error("message {0} already has feedback")]
    FeedbackAlreadyGiven(u64),
}
