pub mod amounts;
pub mod category;
pub mod date;
pub mod denoise;
pub mod financials;
pub mod line_items;
pub mod merchant;
pub mod return_policy;
pub mod summary;

pub use category::categorize;
pub use date::extract_date;
pub use denoise::denoise;
pub use financials::{extract_financials, Financials};
pub use line_items::{extract_items, LineSkip, NameRejection};
pub use merchant::{identify_merchant, MerchantMatch, UNKNOWN_MERCHANT};
pub use return_policy::{apply_return_policy, return_deadline, return_policy_days};
pub use summary::spoken_summary;

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use shared_types::{
    ExtractionError, ExtractionMethod, ItemCategory, LineItem, PaymentMethod, ReceiptDraft,
    ReceiptExtractor,
};
use tracing::{debug, info, warn};

use crate::guardrails::{GuardrailReport, Guardrails};

/// Heuristic thresholds for the local parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Below this many characters the text is treated as unreadable.
    pub min_text_len: usize,
    pub min_line_len: usize,
    pub max_items: usize,
    pub max_name_len: usize,
    /// Relative tolerance for `quantity * unit_price == line_total`.
    pub line_math_tolerance: f64,
    pub min_item_price: f64,
    pub max_item_price: f64,
    /// Used when a receipt states neither tax nor a subtotal.
    pub assumed_tax_rate: f64,
    /// Merchant matches below this confidence are logged.
    pub low_confidence: f32,
    pub max_special_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_text_len: 10,
            min_line_len: 5,
            max_items: 20,
            max_name_len: 50,
            line_math_tolerance: 0.05,
            min_item_price: 0.10,
            max_item_price: 500.0,
            assumed_tax_rate: 0.10,
            low_confidence: 0.8,
            max_special_chars: 3,
        }
    }
}

static PAYMENT_MARKERS: Lazy<Vec<(PaymentMethod, Regex)>> = Lazy::new(|| {
    [
        (
            PaymentMethod::Credit,
            r"\b(?:visa|master\s?card|amex|american\s+express|discover|credit)\b",
        ),
        (PaymentMethod::Debit, r"\b(?:debit|interac)\b"),
        (PaymentMethod::Cash, r"\b(?:cash|change\s+due|change)\b"),
    ]
    .into_iter()
    .map(|(method, pattern)| (method, Regex::new(pattern).unwrap()))
    .collect()
});

/// First payment marker found; card networks win over cash.
pub fn detect_payment_method(text: &str) -> PaymentMethod {
    let lowered = text.to_lowercase();
    PAYMENT_MARKERS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&lowered))
        .map(|(method, _)| *method)
        .unwrap_or_default()
}

/// Local, heuristic receipt parser. Never fails: unreadable input yields a
/// flagged sample receipt and an empty basket yields placeholder items.
pub struct ReceiptParser {
    config: ParserConfig,
    guardrails: Guardrails,
}

impl ReceiptParser {
    pub fn new(config: ParserConfig, guardrails: Guardrails) -> Self {
        Self { config, guardrails }
    }

    pub fn with_defaults() -> Self {
        Self::new(ParserConfig::default(), Guardrails::with_defaults())
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn guardrails(&self) -> &Guardrails {
        &self.guardrails
    }

    /// Parse OCR text, dating undated receipts today.
    pub fn parse(&self, raw_text: &str) -> ReceiptDraft {
        self.parse_on(raw_text, Utc::now().date_naive())
    }

    pub fn parse_on(&self, raw_text: &str, today: NaiveDate) -> ReceiptDraft {
        self.parse_with_report(raw_text, today).0
    }

    /// Parse and return the guardrail report alongside the receipt.
    pub fn parse_with_report(
        &self,
        raw_text: &str,
        today: NaiveDate,
    ) -> (ReceiptDraft, GuardrailReport) {
        if raw_text.trim().chars().count() < self.config.min_text_len {
            info!(len = raw_text.len(), "Text too short to parse, returning sample receipt");
            return self.sample_receipt(today);
        }

        let text = denoise(raw_text);

        let merchant = identify_merchant(&text);
        if merchant.confidence < self.config.low_confidence {
            warn!(
                merchant = %merchant.name,
                confidence = merchant.confidence,
                "Low merchant confidence"
            );
        }

        let date = extract_date(&text).unwrap_or_else(|| {
            debug!("No date found, using today");
            today.format("%Y-%m-%d").to_string()
        });

        let mut items = extract_items(&text, &merchant.name, &self.config);
        let placeholder = items.is_empty();
        if placeholder {
            warn!(merchant = %merchant.name, "No line items found, using placeholder items");
            items = placeholder_items();
        }

        let financials = extract_financials(&text, &items, &self.config);
        info!(
            merchant = %merchant.name,
            items = items.len(),
            subtotal = financials.subtotal,
            tax = financials.tax,
            total = financials.total,
            "Parsed receipt"
        );

        let mut draft = ReceiptDraft::new(merchant.name, date);
        draft.items = items;
        draft.subtotal = financials.subtotal;
        draft.tax = financials.tax;
        draft.total = financials.total;
        draft.payment_method = detect_payment_method(&text);
        draft.sample_data = placeholder;

        let report = self.guardrails.validate_and_correct(&mut draft);
        apply_return_policy(&mut draft);

        (draft, report)
    }

    /// Fixed receipt returned for empty or unreadable input.
    pub fn sample_receipt(&self, today: NaiveDate) -> (ReceiptDraft, GuardrailReport) {
        let mut draft = ReceiptDraft::new("Sample Store", today.format("%Y-%m-%d").to_string());
        draft.items = vec![
            LineItem::new("Fudge Sundae", 1, Some(2.29), 2.29)
                .with_category(ItemCategory::Restaurant),
            LineItem::new("Caramel Sundae", 1, Some(2.29), 2.29)
                .with_category(ItemCategory::Restaurant),
            LineItem::new("Extra Fudge", 1, Some(0.30), 0.30)
                .with_category(ItemCategory::Restaurant),
        ];
        draft.subtotal = 4.88;
        draft.tax = 0.49;
        draft.total = 5.37;
        draft.sample_data = true;

        let report = self.guardrails.validate_and_correct(&mut draft);
        apply_return_policy(&mut draft);
        (draft, report)
    }
}

fn placeholder_items() -> Vec<LineItem> {
    (1..=2)
        .map(|n| {
            LineItem::new(format!("Sample Item {}", n), 1, Some(1.0), 1.0)
                .with_category(ItemCategory::Other)
        })
        .collect()
}

impl ReceiptExtractor for ReceiptParser {
    fn extract(&self, text: &str) -> Result<ReceiptDraft, ExtractionError> {
        Ok(self.parse(text))
    }

    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::PatternBased
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}
