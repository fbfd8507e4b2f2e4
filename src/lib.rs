//! Carmate: a chat assistant that relays prompts to a hosted language model.
//!
//! Three flows sit behind the [`actions::Actions`] entry points: chat with
//! history, car-listing description generation, and feedback summarization.
//! Each flow validates its input against a [`schema::Schema`], renders a
//! prompt, asks the [`provider::ModelProvider`] for a reply of a declared
//! shape and validates that reply before handing it back.

pub mod actions;
pub mod chat;
pub mod config;
pub mod constants;
pub mod error;
pub mod flow;
pub mod prompt;
pub mod provider;
pub mod schema;
pub mod session;
pub mod types;
pub mod web_server;

pub use actions::{ActionReply, Actions};
pub use config::Config;
pub use error::{ErrorKind, FlowError, ModelError, SessionError, ValidationError};
pub use flow::{CarDescriptionFlow, ChatFlow, FeedbackSummaryFlow, Flow, FlowStage, Orchestrator};
pub use prompt::{PromptBuilder, PromptVariant};
pub use provider::{GenerateRequest, ModelProvider, OllamaProvider};
pub use session::{ChatSession, DisplayMessage, Feedback, Notification};
pub use types::{ChatMessage, Role};
