//! Extractors Crate
//!
//! Turns noisy OCR text from retail receipts into structured, internally
//! consistent receipt records.
//!
//! # Architecture
//!
//! - **Types**: the receipt data model and the `ReceiptExtractor` trait live in
//!   the `shared-types` crate
//! - **receipt_ocr**: denoiser, merchant/date/category heuristics, line-item
//!   and financial-value extraction, and the `ReceiptParser` that composes them
//! - **guardrails**: the validator every receipt passes through before it
//!   leaves the core, whatever produced it
//!
//! # Example
//!
//! ```rust,ignore
//! use extractors::ReceiptParser;
//!
//! let parser = ReceiptParser::with_defaults();
//! let receipt = parser.parse("4 Cheese Burger 5.99 23.96\nTotal to Pay: 25.88");
//! assert_eq!(receipt.items[0].quantity, 4);
//! ```

pub mod guardrails;
pub mod receipt_ocr;

// Re-export commonly used types
pub use guardrails::{
    coerce_untrusted, validate_and_correct, CorrectionKind, GuardrailConfig, GuardrailReport,
    GuardrailWarning, Guardrails,
};
pub use receipt_ocr::{detect_payment_method, spoken_summary, ParserConfig, ReceiptParser};

// Re-export the ReceiptExtractor trait from shared-types for convenience
pub use shared_types::ReceiptExtractor;
