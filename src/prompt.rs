//! Prompt templates.
//!
//! Every prompt is a minijinja template registered once at startup. Rendering is
//! pure: the same validated input always yields the same prompt text.

use std::{fmt, str::FromStr};

use minijinja::{context, AutoEscape, Environment, UndefinedBehavior};
use serde::{Deserialize, Serialize};

use crate::types::{CarDescriptionInput, ChatInput, ChatMessage, FeedbackSummaryInput};

/// Stands in for the history block when a conversation has just started.
pub const EMPTY_HISTORY: &str = "No history yet.";

const CHAT_STANDARD: &str = "chat/standard";
const CHAT_MATH: &str = "chat/math";
const CAR_DESCRIPTION: &str = "car_description";
const FEEDBACK_SUMMARY: &str = "feedback_summary";
const FEEDBACK_CONTEXT: &str = "feedback_context";

const CHAT_STANDARD_TEMPLATE: &str = r#"You are Mathe AI, a friendly and knowledgeable assistant specializing in Math. Your goal is to help users find information about math problems, compare responses, and answer their questions in a helpful and engaging manner. Be concise but informative.
{% block formatting %}{% endblock %}
Use the provided chat history to maintain context.

Chat History:
{{ history }}

Current User Message:
user: {{ message }}

Your Response:
model:"#;

const CHAT_MATH_TEMPLATE: &str = r#"{% extends "chat/standard" %}{% block formatting %}
Formatting rules:
- Use Markdown for structure: short paragraphs, numbered steps, bold for key results.
- Write inline math between single dollar signs, for example $a^2 + b^2 = c^2$.
- Put display math on its own line between double dollar signs, for example $$\int_0^1 x\,dx = \frac{1}{2}$$.
- Never put math inside code blocks.
{% endblock %}"#;

const CAR_DESCRIPTION_TEMPLATE: &str = r#"Write a detailed and engaging description of the following car for a listing:

Make: {{ make }}
Model: {{ model }}
Year: {{ year }}
Mileage: {{ mileage }}
Condition: {{ condition }}
Features: {{ features }}
Selling Points: {{ selling_points }}

Description:"#;

const FEEDBACK_SUMMARY_TEMPLATE: &str = r#"You are a chatbot administrator. Summarize the following user feedback to identify common issues and areas for improvement in the chatbot's responses.

User Feedback:

{{ feedback }}"#;

const FEEDBACK_CONTEXT_TEMPLATE: &str = r#"Chat History:
{{ history }}

User Feedback: {{ label }}"#;

/// Which chat template the chat flow binds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PromptVariant {
    /// Plain conversational instructions.
    #[default]
    Standard,
    /// Adds Markdown and LaTeX conventions for math-heavy answers.
    Math,
}

impl PromptVariant {
    fn template_name(&self) -> &'static str {
        match self {
            PromptVariant::Standard => CHAT_STANDARD,
            PromptVariant::Math => CHAT_MATH,
        }
    }
}

impl fmt::Display for PromptVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptVariant::Standard => f.write_str("standard"),
            PromptVariant::Math => f.write_str("math"),
        }
    }
}

impl FromStr for PromptVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(PromptVariant::Standard),
            "math" => Ok(PromptVariant::Math),
            other => Err(format!("unknown prompt variant '{}' (expected standard or math)", other)),
        }
    }
}

/// Renders `role: content` lines, one per message, in conversation order.
pub fn render_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|msg| format!("{}: {}", msg.role, msg.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        // Prompts are plain text; user content must reach the model verbatim.
        env.set_auto_escape_callback(|_| AutoEscape::None);

        env.add_template(CHAT_STANDARD, CHAT_STANDARD_TEMPLATE)?;
        env.add_template(CHAT_MATH, CHAT_MATH_TEMPLATE)?;
        env.add_template(CAR_DESCRIPTION, CAR_DESCRIPTION_TEMPLATE)?;
        env.add_template(FEEDBACK_SUMMARY, FEEDBACK_SUMMARY_TEMPLATE)?;
        env.add_template(FEEDBACK_CONTEXT, FEEDBACK_CONTEXT_TEMPLATE)?;

        Ok(Self { env })
    }

    pub fn chat(&self, variant: PromptVariant, input: &ChatInput) -> Result<String, minijinja::Error> {
        let history = match input.history.as_deref() {
            Some(history) if !history.is_empty() => render_history(history),
            _ => EMPTY_HISTORY.to_string(),
        };
        self.env.get_template(variant.template_name())?.render(context! {
            history => history,
            message => &input.message,
        })
    }

    pub fn car_description(&self, input: &CarDescriptionInput) -> Result<String, minijinja::Error> {
        self.env.get_template(CAR_DESCRIPTION)?.render(context! {
            make => &input.make,
            model => &input.model,
            year => input.year,
            mileage => input.mileage,
            condition => &input.condition,
            features => &input.features,
            selling_points => &input.selling_points,
        })
    }

    pub fn feedback_summary(&self, input: &FeedbackSummaryInput) -> Result<String, minijinja::Error> {
        self.env
            .get_template(FEEDBACK_SUMMARY)?
            .render(context! { feedback => &input.feedback })
    }

    /// Folds a feedback label and the conversation it refers to into the
    /// single text field the summary flow takes.
    pub fn feedback_context(&self, label: &str, history: &[ChatMessage]) -> Result<String, minijinja::Error> {
        self.env.get_template(FEEDBACK_CONTEXT)?.render(context! {
            history => render_history(history),
            label => label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> PromptBuilder {
        PromptBuilder::new().unwrap()
    }

    fn history_block(prompt: &str) -> &str {
        let start = prompt.find("Chat History:\n").unwrap() + "Chat History:\n".len();
        let end = prompt.find("\n\nCurrent User Message:").unwrap();
        &prompt[start..end]
    }

    #[test]
    fn test_chat_prompt_without_history_uses_placeholder() {
        let builder = builder();
        for history in [None, Some(vec![])] {
            let prompt = builder
                .chat(PromptVariant::Standard, &ChatInput { message: "What is 2+2?".into(), history })
                .unwrap();
            assert_eq!(history_block(&prompt), EMPTY_HISTORY);
            assert!(prompt.contains("user: What is 2+2?"));
            assert!(prompt.ends_with("Your Response:\nmodel:"));
        }
    }

    #[test]
    fn test_chat_prompt_renders_one_line_per_message() {
        let history = vec![
            ChatMessage::user("Hi"),
            ChatMessage::model("Hello! How can I help?"),
            ChatMessage::user("Explain <primes> & \"sieves\""),
        ];
        let prompt = builder()
            .chat(
                PromptVariant::Standard,
                &ChatInput { message: "Thanks".into(), history: Some(history.clone()) },
            )
            .unwrap();

        let lines: Vec<&str> = history_block(&prompt).lines().collect();
        assert_eq!(lines.len(), history.len());
        for (line, msg) in lines.iter().zip(&history) {
            assert!(line.starts_with(&format!("{}: ", msg.role)));
        }
        // No escaping of user content.
        assert!(prompt.contains("user: Explain <primes> & \"sieves\""));
        assert!(!prompt.contains(EMPTY_HISTORY));
    }

    #[test]
    fn test_chat_prompt_is_deterministic() {
        let builder = builder();
        let input = ChatInput {
            message: "integrate x".into(),
            history: Some(vec![ChatMessage::user("hello"), ChatMessage::model("hi")]),
        };
        for variant in [PromptVariant::Standard, PromptVariant::Math] {
            assert_eq!(builder.chat(variant, &input).unwrap(), builder.chat(variant, &input).unwrap());
        }
    }

    #[test]
    fn test_math_variant_only_adds_formatting_rules() {
        let builder = builder();
        let input = ChatInput { message: "solve x^2 = 4".into(), history: None };
        let standard = builder.chat(PromptVariant::Standard, &input).unwrap();
        let math = builder.chat(PromptVariant::Math, &input).unwrap();

        assert!(!standard.contains("Formatting rules:"));
        assert!(math.contains("Formatting rules:"));
        assert!(math.contains("$$"));
        assert!(standard.contains("informative.\n\nUse the provided chat history"));
        assert!(math.ends_with("user: solve x^2 = 4\n\nYour Response:\nmodel:"));
    }

    #[test]
    fn test_car_description_prompt_contains_every_field() {
        let input = CarDescriptionInput {
            make: "Toyota".into(),
            model: "Corolla".into(),
            year: 2020,
            mileage: 30000,
            condition: "good".into(),
            features: "sunroof, navigation".into(),
            selling_points: "low mileage, fuel-efficient".into(),
        };
        let prompt = builder().car_description(&input).unwrap();
        for expected in [
            "Make: Toyota",
            "Model: Corolla",
            "Year: 2020",
            "Mileage: 30000",
            "Condition: good",
            "Features: sunroof, navigation",
            "Selling Points: low mileage, fuel-efficient",
        ] {
            assert!(prompt.contains(expected), "missing {:?} in {}", expected, prompt);
        }
        assert!(prompt.ends_with("Description:"));
    }

    #[test]
    fn test_feedback_prompts() {
        let builder = builder();
        let history = vec![ChatMessage::user("2+2?"), ChatMessage::model("5")];
        let context = builder.feedback_context("Bad response", &history).unwrap();
        assert_eq!(context, "Chat History:\nuser: 2+2?\nmodel: 5\n\nUser Feedback: Bad response");

        let prompt = builder
            .feedback_summary(&FeedbackSummaryInput { feedback: context.clone() })
            .unwrap();
        assert!(prompt.starts_with("You are a chatbot administrator."));
        assert!(prompt.ends_with(&context));
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("math".parse::<PromptVariant>().unwrap(), PromptVariant::Math);
        assert_eq!(" Standard ".parse::<PromptVariant>().unwrap(), PromptVariant::Standard);
        assert!("latex".parse::<PromptVariant>().is_err());
    }
}
