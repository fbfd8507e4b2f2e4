//! Named request/response pipelines.
//!
//! Every flow runs the same stages:
//! `Received -> Validated -> PromptBuilt -> ModelInvoked -> OutputValidated -> Returned`,
//! and can fail out of any of them. Flows differ only in the schemas and the
//! prompt template they bind. Invocations share no state; whatever context a
//! flow needs travels in its input.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    error::{FlowError, ValidationError},
    prompt::{PromptBuilder, PromptVariant},
    provider::{InvokeError, ModelInvoker, ModelProvider},
    schema::Contract,
    types::{
        CarDescriptionInput, CarDescriptionOutput, ChatInput, ChatOutput, FeedbackSummaryInput,
        FeedbackSummaryOutput,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    Received,
    Validated,
    PromptBuilt,
    ModelInvoked,
    OutputValidated,
    Returned,
}

pub trait Flow: Send + Sync {
    type Input: Contract + Serialize + Send + Sync;
    type Output: Contract + Send;

    const NAME: &'static str;

    fn build_prompt(&self, prompts: &PromptBuilder, input: &Self::Input) -> Result<String, minijinja::Error>;
}

/// Conversational chat with history. The variant picks the template.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatFlow {
    pub variant: PromptVariant,
}

impl ChatFlow {
    pub fn new(variant: PromptVariant) -> Self {
        Self { variant }
    }
}

impl Flow for ChatFlow {
    type Input = ChatInput;
    type Output = ChatOutput;

    const NAME: &'static str = "chat";

    fn build_prompt(&self, prompts: &PromptBuilder, input: &ChatInput) -> Result<String, minijinja::Error> {
        prompts.chat(self.variant, input)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CarDescriptionFlow;

impl Flow for CarDescriptionFlow {
    type Input = CarDescriptionInput;
    type Output = CarDescriptionOutput;

    const NAME: &'static str = "car_description";

    fn build_prompt(&self, prompts: &PromptBuilder, input: &CarDescriptionInput) -> Result<String, minijinja::Error> {
        prompts.car_description(input)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackSummaryFlow;

impl Flow for FeedbackSummaryFlow {
    type Input = FeedbackSummaryInput;
    type Output = FeedbackSummaryOutput;

    const NAME: &'static str = "feedback_summary";

    fn build_prompt(&self, prompts: &PromptBuilder, input: &FeedbackSummaryInput) -> Result<String, minijinja::Error> {
        prompts.feedback_summary(input)
    }
}

/// Drives flows against one provider.
pub struct Orchestrator {
    invoker: ModelInvoker,
    prompts: PromptBuilder,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Result<Self, minijinja::Error> {
        Ok(Self {
            invoker: ModelInvoker::new(provider),
            prompts: PromptBuilder::new()?,
        })
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Runs `flow` on an already-typed input. The input still goes through the
    /// schema, so typed and raw callers get identical checks.
    pub async fn run<F: Flow>(&self, flow: &F, input: &F::Input) -> Result<F::Output, FlowError> {
        let raw = serde_json::to_value(input).map_err(|e| FlowError::InvalidInput {
            flow: F::NAME,
            source: ValidationError::new(F::Input::schema().name, "<root>", e.to_string()),
        })?;
        self.run_json(flow, raw).await
    }

    /// Runs `flow` on a record nobody has checked yet.
    #[instrument(skip(self, flow, raw), fields(flow = F::NAME, provider = self.invoker.provider_name()))]
    pub async fn run_json<F: Flow>(&self, flow: &F, raw: Value) -> Result<F::Output, FlowError> {
        debug!(stage = ?FlowStage::Received);

        let input = F::Input::from_value(raw).map_err(|source| FlowError::InvalidInput { flow: F::NAME, source })?;
        debug!(stage = ?FlowStage::Validated);

        let prompt = flow
            .build_prompt(&self.prompts, &input)
            .map_err(|source| FlowError::Template { flow: F::NAME, source })?;
        debug!(stage = ?FlowStage::PromptBuilt, prompt_len = prompt.len());

        let output = self.invoker.invoke::<F::Output>(prompt).await.map_err(|e| match e {
            InvokeError::Model(source) => FlowError::Model { flow: F::NAME, source },
            InvokeError::Output(source) => FlowError::InvalidOutput { flow: F::NAME, source },
        })?;
        debug!(stage = ?FlowStage::OutputValidated);

        debug!(stage = ?FlowStage::Returned);
        Ok(output)
    }
}
