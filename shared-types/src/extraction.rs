use serde::{Deserialize, Serialize};

use crate::receipt::ReceiptDraft;

/// Core trait for anything that turns receipt text into a structured record
pub trait ReceiptExtractor {
    /// Extract a receipt from raw OCR text
    fn extract(&self, text: &str) -> Result<ReceiptDraft, ExtractionError>;

    /// What extraction method does this extractor use?
    fn method(&self) -> ExtractionMethod;

    /// Get extractor version for tracking
    fn version(&self) -> String {
        "1.0.0".to_string()
    }
}

/// Extraction error types
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Extraction methods available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    PatternBased,
    LlmBased,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_method_serialization() {
        let method = ExtractionMethod::LlmBased;
        let json = serde_json::to_string(&method).unwrap();
        assert_eq!(json, "\"llm-based\"");

        let deserialized: ExtractionMethod = serde_json::from_str("\"pattern-based\"").unwrap();
        assert_eq!(deserialized, ExtractionMethod::PatternBased);
    }

    #[test]
    fn test_error_display() {
        let err = ExtractionError::ModelError("quota exhausted".to_string());
        assert_eq!(err.to_string(), "Model error: quota exhausted");
    }
}
