// Defaults for the runtime configuration, read once from the environment.

use std::env;

use lazy_static::lazy_static;

use crate::prompt::PromptVariant;

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_MODEL: &str = "gemma3:12b";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";
pub const DEFAULT_STATIC_DIR: &str = "static";

lazy_static! {
    pub static ref OLLAMA_URL: String = env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());
    pub static ref CARMATE_MODEL: String = env::var("CARMATE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    pub static ref CARMATE_PROMPT_VARIANT: String = env::var("CARMATE_PROMPT_VARIANT").unwrap_or_else(|_| PromptVariant::default().to_string());
    pub static ref CARMATE_REQUEST_TIMEOUT_SECS: String = env::var("CARMATE_REQUEST_TIMEOUT_SECS").unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_SECS.to_string());
    pub static ref CARMATE_TEMPLATE_DIR: String = env::var("CARMATE_TEMPLATE_DIR").unwrap_or_else(|_| DEFAULT_TEMPLATE_DIR.to_string());
    pub static ref CARMATE_STATIC_DIR: String = env::var("CARMATE_STATIC_DIR").unwrap_or_else(|_| DEFAULT_STATIC_DIR.to_string());
}
