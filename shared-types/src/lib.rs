//! Shared receipt data model.
//!
//! Plain, serde-serializable types passed between the heuristic extractors,
//! the guardrail validator and the orchestration layer.

pub mod extraction;
pub mod health;
pub mod receipt;

pub use extraction::{ExtractionError, ExtractionMethod, ReceiptExtractor};
pub use health::{DietFlags, HealthInsights, NEUTRAL_HEALTH_SCORE};
pub use receipt::{
    ItemCategory, LineItem, LooseNumber, PaymentMethod, ReceiptDraft, UntrustedItem,
    UntrustedReceipt,
};
