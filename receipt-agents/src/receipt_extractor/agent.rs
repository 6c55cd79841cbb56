use std::sync::Arc;

use shared_types::{ExtractionError, UntrustedReceipt};

use super::system_prompt::build_extraction_prompt;
use super::types::{default_model_sequence, ModelClient};

/// Receipt extraction backed by a generative model, with model rotation.
///
/// The output is deliberately an [`UntrustedReceipt`]: nothing a model says is
/// used until it has been coerced and validated by the guardrails.
pub struct ModelReceiptExtractor {
    client: Arc<dyn ModelClient>,
    models: Vec<String>,
}

impl ModelReceiptExtractor {
    pub fn new(client: Arc<dyn ModelClient>, models: Vec<String>) -> Self {
        let models = if models.is_empty() {
            default_model_sequence()
        } else {
            models
        };
        Self { client, models }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Try each model in order until one returns non-empty text. Returns the
    /// model that answered along with its answer.
    pub async fn complete_with_rotation(
        &self,
        prompt: &str,
    ) -> Result<(String, String), ExtractionError> {
        complete_with_rotation(self.client.as_ref(), &self.models, prompt).await
    }

    /// Ask the model for a structured receipt.
    pub async fn extract(&self, receipt_text: &str) -> Result<UntrustedReceipt, ExtractionError> {
        let prompt = build_extraction_prompt(receipt_text);
        let (model, response) = self.complete_with_rotation(&prompt).await?;
        let receipt = parse_response(&response)?;
        tracing::debug!(model = %model, items = receipt.items.len(), "Model extraction parsed");
        Ok(receipt)
    }
}

/// Send `prompt` to each of `models` in order until one returns non-empty
/// text. Every failure is logged; the last one is returned if all fail.
pub async fn complete_with_rotation(
    client: &dyn ModelClient,
    models: &[String],
    prompt: &str,
) -> Result<(String, String), ExtractionError> {
    let mut last_error = String::from("no models configured");

    for model in models {
        tracing::info!(model = %model, "Trying model");
        match client.complete(model, prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                tracing::info!(model = %model, "Model succeeded");
                return Ok((model.clone(), text));
            }
            Ok(_) => {
                tracing::warn!(model = %model, "Model returned an empty response");
                last_error = format!("Empty response from model {}", model);
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(
                    model = %model,
                    error = %message.chars().take(200).collect::<String>(),
                    "Model failed"
                );
                last_error = message;
            }
        }
    }

    tracing::error!(models = ?models, "All models failed in rotation");
    Err(ExtractionError::ModelError(last_error))
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fences(response: &str) -> &str {
    let mut text = response.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse a model answer and reject one that lacks a merchant or items.
pub fn parse_response(response: &str) -> Result<UntrustedReceipt, ExtractionError> {
    let receipt: UntrustedReceipt = serde_json::from_str(strip_code_fences(response))
        .map_err(|e| ExtractionError::ParseError(format!("Model returned invalid JSON: {}", e)))?;

    let merchant_known = receipt
        .merchant
        .as_deref()
        .map(str::trim)
        .is_some_and(|m| !m.is_empty() && !m.eq_ignore_ascii_case("unknown"));
    if !merchant_known {
        return Err(ExtractionError::ModelError(
            "Could not identify merchant name".to_string(),
        ));
    }

    if receipt.items.is_empty() {
        return Err(ExtractionError::ModelError(
            "Could not extract any items".to_string(),
        ));
    }

    Ok(receipt)
}
