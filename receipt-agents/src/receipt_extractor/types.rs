use anyhow::Result;
use async_trait::async_trait;

/// Models tried in order until one answers.
pub const DEFAULT_MODEL_SEQUENCE: &[&str] = &[
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-2.0-flash-exp",
    "gemini-exp-1206",
];

pub fn default_model_sequence() -> Vec<String> {
    DEFAULT_MODEL_SEQUENCE.iter().map(|m| m.to_string()).collect()
}

/// Text-in, text-out access to a generative model.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send `prompt` to `model` and return its text answer.
    async fn complete(&self, model: &str, prompt: &str) -> Result<String>;
}
