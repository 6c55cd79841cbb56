//! Receipt processing pipeline: OCR, model extraction with local fallback,
//! validation.
//!
//! Whatever path a receipt takes, the caller always gets a validated
//! [`ReceiptDraft`]. Model and OCR failures are logged and degrade to the
//! local parser; they never reach the caller as errors.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use extractors::receipt_ocr::apply_return_policy;
use extractors::{GuardrailReport, Guardrails, ReceiptParser};
use serde::Serialize;
use shared_types::{HealthInsights, ReceiptDraft};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AgentConfig;
use crate::gemini::GeminiClient;
use crate::health_analyzer::HealthAnalyzer;
use crate::ocr::{receipt_keyword_score, OcrEngine};
use crate::receipt_extractor::{ModelClient, ModelReceiptExtractor};

/// Below this many receipt keywords the text is logged as suspicious.
const MIN_KEYWORD_HITS: usize = 2;

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub receipt: ReceiptDraft,
    pub report: GuardrailReport,
    /// Why the model path was abandoned, if it was tried and failed.
    pub fallback_reason: Option<String>,
}

pub struct ReceiptPipeline {
    parser: ReceiptParser,
    model: Option<ModelReceiptExtractor>,
    health: Option<HealthAnalyzer>,
    ocr: Option<Arc<dyn OcrEngine>>,
    force_local: bool,
}

impl ReceiptPipeline {
    /// Pipeline that only uses the local parser.
    pub fn local(parser: ReceiptParser) -> Self {
        Self {
            parser,
            model: None,
            health: None,
            ocr: None,
            force_local: false,
        }
    }

    /// Build a pipeline from configuration. A Gemini client, shared by
    /// extraction and health analysis, is attached only when an API key is
    /// configured and the local parser is not forced.
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let parser = ReceiptParser::new(
            config.parser.clone(),
            Guardrails::new(config.guardrails.clone()),
        );
        let mut pipeline = Self::local(parser).force_local(config.force_local);

        match (&config.model.api_key, config.force_local) {
            (_, true) => info!("Local parser forced by configuration"),
            (Some(api_key), false) => {
                let client: Arc<dyn ModelClient> = Arc::new(GeminiClient::new(
                    api_key.clone(),
                    Duration::from_secs(config.model.timeout_secs),
                )?);
                pipeline = pipeline
                    .with_model(ModelReceiptExtractor::new(
                        client.clone(),
                        config.model.sequence.clone(),
                    ))
                    .with_health(HealthAnalyzer::new(client, config.model.sequence.clone()));
            }
            (None, false) => info!("No model API key configured, using the local parser"),
        }

        Ok(pipeline)
    }

    pub fn with_model(mut self, model: ModelReceiptExtractor) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_health(mut self, health: HealthAnalyzer) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn force_local(mut self, force_local: bool) -> Self {
        self.force_local = force_local;
        self
    }

    pub fn parser(&self) -> &ReceiptParser {
        &self.parser
    }

    pub async fn process_text(&self, text: &str) -> PipelineOutcome {
        self.process_text_on(text, Utc::now().date_naive()).await
    }

    /// Process receipt text with `today` as the fallback purchase date.
    pub async fn process_text_on(&self, text: &str, today: NaiveDate) -> PipelineOutcome {
        let score = receipt_keyword_score(text);
        if score < MIN_KEYWORD_HITS {
            warn!(score, "Text does not look like a receipt");
        } else {
            info!(score, "Receipt keyword score");
        }

        let model = match &self.model {
            Some(model) if !self.force_local => model,
            _ => return self.parse_locally(text, today, None),
        };

        if text.trim().chars().count() < self.parser.config().min_text_len {
            info!("Text too short for the model, using the local parser");
            return self.parse_locally(text, today, None);
        }

        match model.extract(text).await {
            Ok(raw) => {
                let (mut receipt, report) = self.parser.guardrails().validate_untrusted(&raw, today);
                apply_return_policy(&mut receipt);
                info!(
                    merchant = %receipt.merchant,
                    items = receipt.items.len(),
                    total = receipt.total,
                    "Model extraction validated"
                );
                PipelineOutcome {
                    receipt,
                    report,
                    fallback_reason: None,
                }
            }
            Err(err) => {
                warn!(error = %err, "Model extraction failed, falling back to the local parser");
                self.parse_locally(text, today, Some(err.to_string()))
            }
        }
    }

    pub async fn process_image(&self, image: &[u8]) -> Result<PipelineOutcome> {
        self.process_image_on(image, Utc::now().date_naive()).await
    }

    /// Run OCR and process the recognized text. An OCR failure is treated as
    /// an empty page; only a missing OCR engine is an error.
    pub async fn process_image_on(&self, image: &[u8], today: NaiveDate) -> Result<PipelineOutcome> {
        let ocr = self
            .ocr
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No OCR engine configured"))?;

        let text = match ocr.recognize(image).await {
            Ok(text) => {
                info!(chars = text.len(), "OCR completed");
                text
            }
            Err(err) => {
                warn!(error = %err, "OCR failed, treating the image as empty");
                String::new()
            }
        };

        Ok(self.process_text_on(&text, today).await)
    }

    /// Health and allergen analysis of a receipt's items. Without a model, or
    /// when forced local, the default answer is returned.
    pub async fn analyze_health(&self, receipt: &ReceiptDraft) -> HealthInsights {
        match &self.health {
            Some(health) if !self.force_local && !receipt.sample_data => {
                health.analyze(&receipt.items).await
            }
            _ => {
                info!("Health analysis skipped");
                HealthInsights::unavailable()
            }
        }
    }

    fn parse_locally(&self, text: &str, today: NaiveDate, fallback_reason: Option<String>) -> PipelineOutcome {
        let (receipt, report) = self.parser.parse_with_report(text, today);
        PipelineOutcome {
            receipt,
            report,
            fallback_reason,
        }
    }
}
