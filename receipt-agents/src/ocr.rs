use anyhow::Result;
use async_trait::async_trait;

/// External OCR engine: image bytes in, raw text out.
///
/// Implementations may fail or return an empty string. Callers treat both as
/// degenerate input, never as an error that reaches the user.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<String>;
}

/// Receipt keywords used to judge whether OCR text looks like a receipt.
const RECEIPT_KEYWORDS: &[&str] = &[
    "total", "subtotal", "tax", "receipt", "store", "date", "purchase", "$", "price",
];

/// Number of receipt keywords present in `text`.
pub fn receipt_keyword_score(text: &str) -> usize {
    let lowered = text.to_lowercase();
    RECEIPT_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(*keyword))
        .count()
}
