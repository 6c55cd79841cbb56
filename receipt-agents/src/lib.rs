pub mod config;
pub mod gemini;
pub mod health_analyzer;
pub mod ocr;
pub mod pipeline;
pub mod receipt_extractor;

pub use config::AgentConfig;
pub use gemini::GeminiClient;
pub use health_analyzer::HealthAnalyzer;
pub use ocr::OcrEngine;
pub use pipeline::{PipelineOutcome, ReceiptPipeline};
pub use receipt_extractor::{ModelClient, ModelReceiptExtractor};
