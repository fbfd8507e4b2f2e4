use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{constants, prompt::PromptVariant};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    // Provider
    pub ollama_url: String,
    pub model: String,
    pub request_timeout: Duration,

    // Chat flow
    pub prompt_variant: PromptVariant,

    // Web UI
    pub template_dir: String,
    pub static_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: constants::DEFAULT_OLLAMA_URL.to_string(),
            model: constants::DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(constants::DEFAULT_REQUEST_TIMEOUT_SECS),
            prompt_variant: PromptVariant::default(),
            template_dir: constants::DEFAULT_TEMPLATE_DIR.to_string(),
            static_dir: constants::DEFAULT_STATIC_DIR.to_string(),
        }
    }
}

impl Config {
    /// Builds the configuration from `OLLAMA_URL` and the `CARMATE_*`
    /// variables, falling back to the defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let timeout_secs: u64 = constants::CARMATE_REQUEST_TIMEOUT_SECS
            .parse()
            .context("CARMATE_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;
        let prompt_variant = constants::CARMATE_PROMPT_VARIANT
            .parse::<PromptVariant>()
            .map_err(anyhow::Error::msg)
            .context("Invalid CARMATE_PROMPT_VARIANT")?;

        Ok(Self {
            ollama_url: constants::OLLAMA_URL.clone(),
            model: constants::CARMATE_MODEL.clone(),
            request_timeout: Duration::from_secs(timeout_secs),
            prompt_variant,
            template_dir: constants::CARMATE_TEMPLATE_DIR.clone(),
            static_dir: constants::CARMATE_STATIC_DIR.clone(),
        })
    }
}
