use serde::{Deserialize, Deserializer, Serialize};

use crate::receipt::LooseNumber;

/// Score used when the model gives none or analysis is unavailable.
pub const NEUTRAL_HEALTH_SCORE: u8 = 50;

/// Dietary properties of a basket as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DietFlags {
    pub vegetarian_friendly: bool,
    pub vegan_friendly: bool,
    pub gluten_free: bool,
    pub high_protein: bool,
    pub low_sugar: bool,
}

/// Health and allergen analysis of the purchased items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthInsights {
    #[serde(default)]
    pub allergen_alerts: Vec<String>,
    /// 0-100, higher is healthier
    #[serde(default = "neutral_score", deserialize_with = "deserialize_score")]
    pub health_score: u8,
    #[serde(default)]
    pub health_warnings: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub diet_flags: DietFlags,
    #[serde(default)]
    pub nutritional_summary: String,
}

impl HealthInsights {
    /// Safe answer when the items could not be analyzed.
    pub fn unavailable() -> Self {
        Self {
            allergen_alerts: Vec::new(),
            health_score: NEUTRAL_HEALTH_SCORE,
            health_warnings: vec!["Unable to analyze".to_string()],
            suggestions: vec!["Review items manually".to_string()],
            diet_flags: DietFlags::default(),
            nutritional_summary: "Analysis unavailable".to_string(),
        }
    }
}

fn neutral_score() -> u8 {
    NEUTRAL_HEALTH_SCORE
}

/// Accept `85`, `85.4` or `"85"`; clamp into 0-100; anything else is neutral.
fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = LooseNumber::deserialize(deserializer)?;
    Ok(raw
        .as_f64()
        .map(|score| score.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(NEUTRAL_HEALTH_SCORE))
}
