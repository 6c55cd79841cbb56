use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::receipt_extractor::ModelClient;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// [`ModelClient`] over the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    api_key: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key: api_key.into(),
            http,
        })
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", GEMINI_API_BASE, model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Gemini API returned {}: {}",
                status,
                error_body
            ));
        }

        let payload: Value = response.json().await?;
        candidate_text(&payload)
    }
}

/// Text of the first candidate in a `generateContent` response.
pub fn candidate_text(payload: &Value) -> Result<String> {
    let text = payload["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("No candidate text in Gemini response"))?
        .to_string();
    Ok(text)
}
