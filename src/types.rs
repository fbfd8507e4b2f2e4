//! Wire-level records exchanged with the flows.

use std::fmt;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::schema::{Contract, Field, FieldType, Schema};

pub const ROLES: &[&str] = &["user", "model"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInput {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatOutput {
    pub response: String,
}

/// Structured listing fields. `features` and `selling_points` are
/// comma-separated lists kept as the seller typed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarDescriptionInput {
    pub make: String,
    pub model: String,
    pub year: i64,
    pub mileage: i64,
    pub condition: String,
    pub features: String,
    pub selling_points: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarDescriptionOutput {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSummaryInput {
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSummaryOutput {
    pub summary: String,
}

/// What the feedback entry point receives: a label plus the conversation it
/// refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub label: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

lazy_static! {
    static ref CHAT_MESSAGE: Schema = Schema::object("ChatMessage")
        .field(Field::required("role", FieldType::Enum(ROLES)))
        .field(Field::required("content", FieldType::Text));

    static ref CHAT_INPUT: Schema = Schema::object("ChatInput")
        .field(Field::required("message", FieldType::Text).describe("The latest message from the user."))
        .field(
            Field::optional("history", FieldType::array(FieldType::Object(CHAT_MESSAGE.clone())))
                .describe("The history of the conversation."),
        );

    static ref CHAT_OUTPUT: Schema = Schema::object("ChatOutput")
        .field(Field::required("response", FieldType::Text).describe("The chatbot's response to the user."));

    static ref CAR_DESCRIPTION_INPUT: Schema = Schema::object("CarDescriptionInput")
        .field(Field::required("make", FieldType::Text).describe("The make of the car."))
        .field(Field::required("model", FieldType::Text).describe("The model of the car."))
        .field(Field::required("year", FieldType::Integer).describe("The year the car was manufactured."))
        .field(Field::required("mileage", FieldType::Integer).describe("The number of miles on the car."))
        .field(
            Field::required("condition", FieldType::Text)
                .describe("The condition of the car (e.g., excellent, good, fair, poor)."),
        )
        .field(
            Field::required("features", FieldType::Text)
                .describe("A comma-separated list of the car's features (e.g., leather seats, sunroof, navigation system)."),
        )
        .field(
            Field::required("sellingPoints", FieldType::Text)
                .describe("A comma-separated list of the car's best selling points (e.g., low mileage, well-maintained, fuel-efficient)."),
        );

    static ref CAR_DESCRIPTION_OUTPUT: Schema = Schema::object("CarDescriptionOutput")
        .field(
            Field::required("description", FieldType::Text)
                .describe("A detailed and engaging description of the car for a listing."),
        );

    static ref FEEDBACK_SUMMARY_INPUT: Schema = Schema::object("FeedbackSummaryInput")
        .field(
            Field::required("feedback", FieldType::Text)
                .describe("The user feedback to summarize. This could be multiple different comments from users."),
        );

    static ref FEEDBACK_SUMMARY_OUTPUT: Schema = Schema::object("FeedbackSummaryOutput")
        .field(Field::required("summary", FieldType::Text).describe("A summary of the user feedback."));

    static ref FEEDBACK_REQUEST: Schema = Schema::object("FeedbackRequest")
        .field(Field::required("label", FieldType::Text))
        .field(Field::optional("history", FieldType::array(FieldType::Object(CHAT_MESSAGE.clone()))));
}

impl Contract for ChatMessage {
    fn schema() -> &'static Schema {
        &CHAT_MESSAGE
    }
}

impl Contract for ChatInput {
    fn schema() -> &'static Schema {
        &CHAT_INPUT
    }
}

impl Contract for ChatOutput {
    fn schema() -> &'static Schema {
        &CHAT_OUTPUT
    }
}

impl Contract for CarDescriptionInput {
    fn schema() -> &'static Schema {
        &CAR_DESCRIPTION_INPUT
    }
}

impl Contract for CarDescriptionOutput {
    fn schema() -> &'static Schema {
        &CAR_DESCRIPTION_OUTPUT
    }
}

impl Contract for FeedbackSummaryInput {
    fn schema() -> &'static Schema {
        &FEEDBACK_SUMMARY_INPUT
    }
}

impl Contract for FeedbackSummaryOutput {
    fn schema() -> &'static Schema {
        &FEEDBACK_SUMMARY_OUTPUT
    }
}

impl Contract for FeedbackRequest {
    fn schema() -> &'static Schema {
        &FEEDBACK_REQUEST
    }
}
