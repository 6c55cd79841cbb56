use serde::Serialize;
use tracing::warn;

/// What kind of repair the validator made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrectionKind {
    QuantityDefaulted,
    QuantityClamped,
    PriceInvalid,
    PriceBelowCent,
    UnitPriceDerived,
    CategoryFilled,
    NameDefaulted,
    NameTruncated,
    MerchantDefaulted,
    DateDefaulted,
    AmountInvalid,
    SubtotalFromItems,
    SubtotalMismatch,
    TaxNegative,
    TotalComputed,
    TotalMismatch,
    ItemsTruncated,
}

/// A single field change, with before/after rendered for audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correction {
    pub field: String,
    pub kind: CorrectionKind,
    pub before: String,
    pub after: String,
}

/// Something worth a human look that was deliberately left unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GuardrailWarning {
    SuspiciousPrice { field: String, price: f64 },
    SuspiciousTaxRate { rate: f64 },
    BogusQuantity { field: String, quantity: f64 },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GuardrailReport {
    pub corrections: Vec<Correction>,
    pub warnings: Vec<GuardrailWarning>,
}

impl GuardrailReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a correction.
    pub fn record(
        &mut self,
        field: impl Into<String>,
        kind: CorrectionKind,
        before: impl ToString,
        after: impl ToString,
    ) {
        let correction = Correction {
            field: field.into(),
            kind,
            before: before.to_string(),
            after: after.to_string(),
        };
        warn!(
            field = %correction.field,
            kind = ?correction.kind,
            before = %correction.before,
            after = %correction.after,
            "Guardrail correction"
        );
        self.corrections.push(correction);
    }

    /// Record and log a warning.
    pub fn warn(&mut self, warning: GuardrailWarning) {
        warn!(?warning, "Guardrail warning");
        self.warnings.push(warning);
    }

    pub fn has(&self, kind: CorrectionKind) -> bool {
        self.corrections.iter().any(|c| c.kind == kind)
    }

    pub fn corrections_for(&self, field: &str) -> impl Iterator<Item = &Correction> {
        let field = field.to_string();
        self.corrections.iter().filter(move |c| c.field == field)
    }

    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty() && self.warnings.is_empty()
    }

    pub fn merge(&mut self, other: GuardrailReport) {
        self.corrections.extend(other.corrections);
        self.warnings.extend(other.warnings);
    }
}
