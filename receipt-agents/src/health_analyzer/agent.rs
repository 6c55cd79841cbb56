use std::sync::Arc;

use shared_types::{ExtractionError, HealthInsights, LineItem};

use super::system_prompt::build_health_prompt;
use crate::receipt_extractor::{
    complete_with_rotation, default_model_sequence, strip_code_fences, ModelClient,
};

/// Health and allergen analysis of purchased items, using the same model
/// rotation as receipt extraction.
pub struct HealthAnalyzer {
    client: Arc<dyn ModelClient>,
    models: Vec<String>,
}

impl HealthAnalyzer {
    pub fn new(client: Arc<dyn ModelClient>, models: Vec<String>) -> Self {
        let models = if models.is_empty() {
            default_model_sequence()
        } else {
            models
        };
        Self { client, models }
    }

    /// Analyze `items`. Never fails: any model or parse error yields
    /// [`HealthInsights::unavailable`].
    pub async fn analyze(&self, items: &[LineItem]) -> HealthInsights {
        match self.try_analyze(items).await {
            Ok(insights) => insights,
            Err(err) => {
                tracing::warn!(error = %err, "Health analysis failed, using the default answer");
                HealthInsights::unavailable()
            }
        }
    }

    pub async fn try_analyze(&self, items: &[LineItem]) -> Result<HealthInsights, ExtractionError> {
        let names: Vec<&str> = items
            .iter()
            .map(|item| item.name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            return Err(ExtractionError::InvalidInput("no item names to analyze".to_string()));
        }

        let prompt = build_health_prompt(&names);
        let (model, response) = complete_with_rotation(self.client.as_ref(), &self.models, &prompt).await?;
        let insights = parse_health_response(&response)?;
        tracing::info!(
            model = %model,
            health_score = insights.health_score,
            allergens = insights.allergen_alerts.len(),
            "Health analysis parsed"
        );
        Ok(insights)
    }
}

pub fn parse_health_response(response: &str) -> Result<HealthInsights, ExtractionError> {
    serde_json::from_str(strip_code_fences(response)).map_err(|e| {
        ExtractionError::ParseError(format!("Model returned invalid health JSON: {}", e))
    })
}
