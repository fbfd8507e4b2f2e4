#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use carmate::{Actions, GenerateRequest, ModelError, ModelProvider, Orchestrator, PromptVariant};
use serde_json::Value;

/// How the stub answers every request.
pub enum StubReply {
    Json(Value),
    Timeout,
    Unreachable,
}

/// In-process provider that records prompts and answers with a canned reply.
pub struct StubProvider {
    reply: StubReply,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl StubProvider {
    pub fn replying(value: Value) -> Arc<Self> {
        Arc::new(Self { reply: StubReply::Json(value), requests: Mutex::new(Vec::new()) })
    }

    pub fn failing(reply: StubReply) -> Arc<Self> {
        Arc::new(Self { reply, requests: Mutex::new(Vec::new()) })
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> String {
        self.requests().last().expect("provider was never called").prompt.clone()
    }
}

#[async_trait]
impl ModelProvider for StubProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<Value, ModelError> {
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            StubReply::Json(value) => Ok(value.clone()),
            StubReply::Timeout => Err(ModelError::Timeout),
            StubReply::Unreachable => Err(ModelError::Unreachable("connection refused".into())),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

pub fn orchestrator(provider: Arc<StubProvider>) -> Orchestrator {
    Orchestrator::new(provider).unwrap()
}

pub fn actions(provider: Arc<StubProvider>) -> Actions {
    Actions::new(Arc::new(orchestrator(provider)), PromptVariant::Standard)
}
