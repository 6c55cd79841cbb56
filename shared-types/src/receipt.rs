use serde::{Deserialize, Serialize};

use crate::extraction::ExtractionMethod;

/// Spend category assigned to every line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemCategory {
    Groceries,
    Restaurant,
    Pharmacy,
    Retail,
    Other,
}

impl ItemCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Groceries => "groceries",
            ItemCategory::Restaurant => "restaurant",
            ItemCategory::Pharmacy => "pharmacy",
            ItemCategory::Retail => "retail",
            ItemCategory::Other => "other",
        }
    }

    /// Case-insensitive lookup used when a category arrives as free text.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "groceries" | "grocery" => Some(ItemCategory::Groceries),
            "restaurant" => Some(ItemCategory::Restaurant),
            "pharmacy" => Some(ItemCategory::Pharmacy),
            "retail" => Some(ItemCategory::Retail),
            "other" => Some(ItemCategory::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    Cash,
    Credit,
    Debit,
    #[default]
    Unknown,
}

impl PaymentMethod {
    /// Lenient parse; anything unrecognised is `Unknown`.
    pub fn parse_loose(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "cash" => PaymentMethod::Cash,
            "credit" | "credit card" | "visa" | "mastercard" | "amex" => PaymentMethod::Credit,
            "debit" | "debit card" | "interac" => PaymentMethod::Debit,
            _ => PaymentMethod::Unknown,
        }
    }
}

/// A single purchased entry on a receipt.
///
/// `price` is the authoritative line total. `unit_price` and `category` may be
/// absent while the record is a draft; validation always fills them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Option<f64>,
    pub price: f64,
    pub category: Option<ItemCategory>,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: u32, unit_price: Option<f64>, price: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
            price,
            category: None,
        }
    }

    pub fn with_category(mut self, category: ItemCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// Structured receipt record, mutable until it has been through validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptDraft {
    pub merchant: String,
    /// ISO-8601 (`YYYY-MM-DD`)
    pub date: String,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub payment_method: PaymentMethod,
    pub return_policy_days: u32,
    pub return_deadline: Option<String>,
    pub method: ExtractionMethod,
    /// Set when the record is a fallback (sample receipt or placeholder
    /// items) rather than a genuine extraction.
    #[serde(default)]
    pub sample_data: bool,
}

impl ReceiptDraft {
    pub fn new(merchant: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            merchant: merchant.into(),
            date: date.into(),
            items: Vec::new(),
            subtotal: 0.0,
            tax: 0.0,
            total: 0.0,
            payment_method: PaymentMethod::Unknown,
            return_policy_days: 0,
            return_deadline: None,
            method: ExtractionMethod::PatternBased,
            sample_data: false,
        }
    }

    /// Sum of line totals.
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(|item| item.price).sum()
    }
}

/// Numeric field as it arrives from an untrusted producer: a number, a
/// string that may or may not hold one, `null`, or something else entirely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    #[default]
    Missing,
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl LooseNumber {
    /// Finite numeric value, if one can be read. Text such as `"$1,234.50"`
    /// is accepted.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            LooseNumber::Number(n) => *n,
            LooseNumber::Text(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| !matches!(c, '$' | ',' | ' '))
                    .collect();
                cleaned.parse::<f64>().ok()?
            }
            LooseNumber::Missing | LooseNumber::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, LooseNumber::Missing)
    }

    /// Short rendering for correction logs.
    pub fn describe(&self) -> String {
        match self {
            LooseNumber::Missing => "missing".to_string(),
            LooseNumber::Number(n) => n.to_string(),
            LooseNumber::Text(s) => format!("{:?}", s),
            LooseNumber::Other(v) => v.to_string(),
        }
    }
}

impl From<f64> for LooseNumber {
    fn from(value: f64) -> Self {
        LooseNumber::Number(value)
    }
}

/// Line item exactly as an external extraction service returned it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UntrustedItem {
    pub name: Option<String>,
    pub quantity: LooseNumber,
    pub unit_price: LooseNumber,
    pub price: LooseNumber,
    pub category: Option<String>,
}

/// Receipt exactly as an external extraction service returned it. Nothing
/// here is trusted until it has been coerced and validated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UntrustedReceipt {
    pub merchant: Option<String>,
    pub date: Option<String>,
    pub items: Vec<UntrustedItem>,
    pub subtotal: LooseNumber,
    pub tax: LooseNumber,
    pub total: LooseNumber,
    pub payment_method: Option<String>,
}
