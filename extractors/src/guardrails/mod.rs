//! Post-hoc validation of structured receipts.
//!
//! Every receipt leaving the core, whether it came from the local parser or
//! from an external model, passes through [`Guardrails::validate_and_correct`].
//! The validator never fails: it repairs what it can, flags what it should
//! not silently change, and reports both in a [`GuardrailReport`].

mod report;

pub use report::{Correction, CorrectionKind, GuardrailReport, GuardrailWarning};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared_types::{
    ExtractionMethod, ItemCategory, LineItem, LooseNumber, PaymentMethod, ReceiptDraft,
    UntrustedItem, UntrustedReceipt,
};

use crate::receipt_ocr::amounts::round2;
use crate::receipt_ocr::category::categorize;
use crate::receipt_ocr::date::{extract_date, parse_iso_date};
use crate::receipt_ocr::merchant::UNKNOWN_MERCHANT;

pub const UNKNOWN_ITEM: &str = "Unknown Item";

/// Calibration constants for the validator. These were tuned against real
/// receipts and are not correctness boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailConfig {
    /// Allowed relative gap between subtotal and the item sum.
    pub subtotal_tolerance: f64,
    /// Allowed absolute gap between total and subtotal + tax.
    pub total_tolerance: f64,
    /// Tax/subtotal ratio above which the tax is flagged.
    pub suspicious_tax_rate: f64,
    /// Line total above which an item is flagged.
    pub suspicious_price: f64,
    /// Positive prices below this are OCR artifacts.
    pub min_price: f64,
    /// Line totals above this are misreads, not purchases.
    pub max_price: f64,
    /// Receipt-level amounts above this are misreads.
    pub max_amount: f64,
    pub max_quantity: u32,
    /// Quantities above this are not just large but clearly misread.
    pub bogus_quantity: u32,
    pub max_items: usize,
    pub max_name_len: usize,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            subtotal_tolerance: 0.05,
            total_tolerance: 0.01,
            suspicious_tax_rate: 0.20,
            suspicious_price: 5000.0,
            min_price: 0.01,
            max_price: 10_000_000.0,
            max_amount: 1_000_000_000.0,
            max_quantity: 100,
            bogus_quantity: 1000,
            max_items: 20,
            max_name_len: 50,
        }
    }
}

/// Absolute slack for float comparisons on values that are already in cents.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
pub struct Guardrails {
    config: GuardrailConfig,
}

impl Guardrails {
    pub fn new(config: GuardrailConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &GuardrailConfig {
        &self.config
    }

    /// Normalize a draft in place so that every item is sane and the
    /// receipt-level amounts agree with each other and with the items.
    ///
    /// Idempotent: running it on its own output changes nothing.
    pub fn validate_and_correct(&self, draft: &mut ReceiptDraft) -> GuardrailReport {
        let mut report = GuardrailReport::new();

        if draft.merchant.trim().is_empty() {
            report.record(
                "merchant",
                CorrectionKind::MerchantDefaulted,
                &draft.merchant,
                UNKNOWN_MERCHANT,
            );
            draft.merchant = UNKNOWN_MERCHANT.to_string();
        }

        if draft.items.len() > self.config.max_items {
            report.record(
                "items",
                CorrectionKind::ItemsTruncated,
                draft.items.len(),
                self.config.max_items,
            );
            draft.items.truncate(self.config.max_items);
        }

        let merchant = draft.merchant.clone();
        for (index, item) in draft.items.iter_mut().enumerate() {
            self.validate_item(index, item, &merchant, &mut report);
        }
        let items_total = round2(draft.items_total());

        draft.subtotal = self.sanitize_amount("subtotal", draft.subtotal, &mut report);
        draft.total = self.sanitize_amount("total", draft.total, &mut report);
        if !draft.tax.is_finite() || draft.tax < 0.0 {
            report.record("tax", CorrectionKind::TaxNegative, draft.tax, 0.0);
            draft.tax = 0.0;
        } else if draft.tax > self.config.max_amount {
            report.record("tax", CorrectionKind::AmountInvalid, draft.tax, 0.0);
            draft.tax = 0.0;
        }
        draft.tax = round2(draft.tax);

        if !draft.items.is_empty() {
            self.reconcile_subtotal(draft, items_total, &mut report);
        }

        if draft.subtotal > 0.0 {
            let rate = draft.tax / draft.subtotal;
            if rate > self.config.suspicious_tax_rate {
                report.warn(GuardrailWarning::SuspiciousTaxRate {
                    rate: round2(rate),
                });
            }
        }

        let expected = round2(draft.subtotal + draft.tax);
        if (draft.total - expected).abs() > self.config.total_tolerance + EPSILON {
            let kind = if draft.total == 0.0 {
                CorrectionKind::TotalComputed
            } else {
                CorrectionKind::TotalMismatch
            };
            report.record("total", kind, draft.total, expected);
            draft.total = expected;
        }

        draft.subtotal = round2(draft.subtotal);
        draft.tax = round2(draft.tax);
        draft.total = round2(draft.total);

        report
    }

    /// Coerce a model-sourced record and validate it.
    pub fn validate_untrusted(
        &self,
        raw: &UntrustedReceipt,
        today: NaiveDate,
    ) -> (ReceiptDraft, GuardrailReport) {
        let mut report = GuardrailReport::new();
        let mut draft = coerce_untrusted(raw, today, &self.config, &mut report);
        report.merge(self.validate_and_correct(&mut draft));
        (draft, report)
    }

    fn validate_item(
        &self,
        index: usize,
        item: &mut LineItem,
        merchant: &str,
        report: &mut GuardrailReport,
    ) {
        let field = |name: &str| format!("items[{}].{}", index, name);

        if item.name.trim().is_empty() {
            report.record(field("name"), CorrectionKind::NameDefaulted, &item.name, UNKNOWN_ITEM);
            item.name = UNKNOWN_ITEM.to_string();
        } else if item.name.chars().count() > self.config.max_name_len {
            let truncated = truncate_name(item.name.trim(), self.config.max_name_len);
            report.record(field("name"), CorrectionKind::NameTruncated, &item.name, &truncated);
            item.name = truncated;
        }

        if item.quantity == 0 {
            report.record(field("quantity"), CorrectionKind::QuantityDefaulted, 0, 1);
            item.quantity = 1;
        } else if item.quantity > self.config.max_quantity {
            if item.quantity > self.config.bogus_quantity {
                report.warn(GuardrailWarning::BogusQuantity {
                    field: field("quantity"),
                    quantity: f64::from(item.quantity),
                });
            }
            report.record(
                field("quantity"),
                CorrectionKind::QuantityClamped,
                item.quantity,
                self.config.max_quantity,
            );
            item.quantity = self.config.max_quantity;
        }

        if !item.price.is_finite() || item.price < 0.0 || item.price > self.config.max_price {
            report.record(field("price"), CorrectionKind::PriceInvalid, item.price, 0.0);
            item.price = 0.0;
        } else if item.price > 0.0 && item.price < self.config.min_price {
            report.record(field("price"), CorrectionKind::PriceBelowCent, item.price, 0.0);
            item.price = 0.0;
        }
        item.price = round2(item.price);
        if item.price > self.config.suspicious_price {
            report.warn(GuardrailWarning::SuspiciousPrice {
                field: field("price"),
                price: item.price,
            });
        }

        let derived = round2(item.price / f64::from(item.quantity));
        let unit_price = match item.unit_price {
            Some(unit) if unit.is_finite() && unit >= 0.0 => {
                let unit = round2(unit);
                let implied = unit * f64::from(item.quantity);
                let consistent = (implied - item.price).abs()
                    <= (item.price * self.config.subtotal_tolerance).max(self.config.min_price)
                        + EPSILON;
                if consistent || unit == derived {
                    unit
                } else {
                    report.record(field("unit_price"), CorrectionKind::UnitPriceDerived, unit, derived);
                    derived
                }
            }
            Some(unit) => {
                report.record(field("unit_price"), CorrectionKind::UnitPriceDerived, unit, derived);
                derived
            }
            None => {
                report.record(field("unit_price"), CorrectionKind::UnitPriceDerived, "none", derived);
                derived
            }
        };
        item.unit_price = Some(unit_price);

        if item.category.is_none() {
            let category = categorize(&item.name, merchant);
            report.record(field("category"), CorrectionKind::CategoryFilled, "none", category);
            item.category = Some(category);
        }
    }

    fn sanitize_amount(&self, field: &str, value: f64, report: &mut GuardrailReport) -> f64 {
        if !value.is_finite() || value < 0.0 || value > self.config.max_amount {
            report.record(field, CorrectionKind::AmountInvalid, value, 0.0);
            return 0.0;
        }
        round2(value)
    }

    /// Items are ground truth once individually validated.
    fn reconcile_subtotal(
        &self,
        draft: &mut ReceiptDraft,
        items_total: f64,
        report: &mut GuardrailReport,
    ) {
        if draft.subtotal == 0.0 && items_total > 0.0 {
            report.record("subtotal", CorrectionKind::SubtotalFromItems, 0.0, items_total);
            draft.subtotal = items_total;
            return;
        }

        let allowed = items_total * self.config.subtotal_tolerance + EPSILON;
        if (draft.subtotal - items_total).abs() > allowed {
            report.record(
                "subtotal",
                CorrectionKind::SubtotalMismatch,
                draft.subtotal,
                items_total,
            );
            draft.subtotal = items_total;
        }
    }
}

/// Validate with the default configuration, discarding the report.
pub fn validate_and_correct(mut draft: ReceiptDraft) -> ReceiptDraft {
    Guardrails::with_defaults().validate_and_correct(&mut draft);
    draft
}

fn truncate_name(name: &str, max_len: usize) -> String {
    name.chars().take(max_len).collect::<String>().trim_end().to_string()
}

fn coerce_amount(field: &str, value: &LooseNumber, report: &mut GuardrailReport) -> f64 {
    match value.as_f64() {
        Some(v) => v,
        None if value.is_missing() => 0.0,
        None => {
            report.record(field, CorrectionKind::AmountInvalid, value.describe(), 0.0);
            0.0
        }
    }
}

fn coerce_item(
    index: usize,
    raw: &UntrustedItem,
    config: &GuardrailConfig,
    report: &mut GuardrailReport,
) -> LineItem {
    let field = |name: &str| format!("items[{}].{}", index, name);

    let name = match raw.name.as_deref().map(str::trim) {
        Some(name) if name.chars().count() > config.max_name_len => {
            let truncated = truncate_name(name, config.max_name_len);
            report.record(field("name"), CorrectionKind::NameTruncated, name, &truncated);
            truncated
        }
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            report.record(
                field("name"),
                CorrectionKind::NameDefaulted,
                format!("{:?}", raw.name),
                UNKNOWN_ITEM,
            );
            UNKNOWN_ITEM.to_string()
        }
    };

    let quantity = match raw.quantity.as_f64() {
        Some(q) if q >= 1.0 => q.round().min(f64::from(u32::MAX)) as u32,
        None if raw.quantity.is_missing() => 1,
        _ => {
            report.record(
                field("quantity"),
                CorrectionKind::QuantityDefaulted,
                raw.quantity.describe(),
                1,
            );
            1
        }
    };

    let price = match raw.price.as_f64() {
        Some(price) => price,
        None => {
            report.record(field("price"), CorrectionKind::PriceInvalid, raw.price.describe(), 0.0);
            0.0
        }
    };

    let mut item = LineItem::new(name, quantity, raw.unit_price.as_f64(), price);
    item.category = raw.category.as_deref().and_then(ItemCategory::parse);
    item
}

/// Turn a model-sourced record into a draft. Anything unreadable falls back
/// to a safe default and is recorded; numeric sanity is left to
/// [`Guardrails::validate_and_correct`].
pub fn coerce_untrusted(
    raw: &UntrustedReceipt,
    today: NaiveDate,
    config: &GuardrailConfig,
    report: &mut GuardrailReport,
) -> ReceiptDraft {
    let merchant = match raw.merchant.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() && !m.eq_ignore_ascii_case("unknown") => m.to_string(),
        other => {
            report.record(
                "merchant",
                CorrectionKind::MerchantDefaulted,
                format!("{:?}", other),
                UNKNOWN_MERCHANT,
            );
            UNKNOWN_MERCHANT.to_string()
        }
    };

    let date = match raw.date.as_deref() {
        Some(d) if parse_iso_date(d).is_some() => d.trim().to_string(),
        other => {
            let fallback = other
                .and_then(extract_date)
                .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());
            report.record("date", CorrectionKind::DateDefaulted, format!("{:?}", other), &fallback);
            fallback
        }
    };

    if raw.items.len() > config.max_items {
        report.record("items", CorrectionKind::ItemsTruncated, raw.items.len(), config.max_items);
    }

    let mut draft = ReceiptDraft::new(merchant, date);
    draft.items = raw
        .items
        .iter()
        .take(config.max_items)
        .enumerate()
        .map(|(index, item)| coerce_item(index, item, config, report))
        .collect();
    draft.subtotal = coerce_amount("subtotal", &raw.subtotal, report);
    draft.tax = coerce_amount("tax", &raw.tax, report);
    draft.total = coerce_amount("total", &raw.total, report);
    draft.payment_method = raw
        .payment_method
        .as_deref()
        .map(PaymentMethod::parse_loose)
        .unwrap_or_default();
    draft.method = ExtractionMethod::LlmBased;
    draft
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn draft(items: Vec<(&str, u32, f64)>, subtotal: f64, tax: f64, total: f64) -> ReceiptDraft {
        let mut draft = ReceiptDraft::new("Test Store", "2024-01-15");
        draft.items = items
            .into_iter()
            .map(|(name, quantity, price)| LineItem::new(name, quantity, None, price))
            .collect();
        draft.subtotal = subtotal;
        draft.tax = tax;
        draft.total = total;
        draft
    }

    fn run(mut draft: ReceiptDraft) -> (ReceiptDraft, GuardrailReport) {
        let report = Guardrails::with_defaults().validate_and_correct(&mut draft);
        (draft, report)
    }

    fn assert_consistent(draft: &ReceiptDraft) {
        assert!((draft.total - round2(draft.subtotal + draft.tax)).abs() <= 0.01 + EPSILON);
        if !draft.items.is_empty() {
            let items_total = draft.items_total();
            assert!((draft.subtotal - items_total).abs() <= 0.05 * items_total + EPSILON);
        }
    }

    #[test]
    fn test_calibration_defaults() {
        let config = GuardrailConfig::default();
        assert_eq!(config.subtotal_tolerance, 0.05);
        assert_eq!(config.suspicious_tax_rate, 0.20);
        assert_eq!(config.max_quantity, 100);
    }

    #[test]
    fn test_negative_price_zeroed() {
        let (out, report) = run(draft(vec![("Item 1", 1, -5.99)], 3.49, 0.35, 3.84));

        assert_eq!(out.items[0].price, 0.0);
        assert_eq!(out.items[0].unit_price, Some(0.0));
        assert_eq!(out.subtotal, 0.0);
        assert_eq!(out.total, 0.35);
        assert!(report.has(CorrectionKind::PriceInvalid));
        assert!(report.has(CorrectionKind::SubtotalMismatch));
        assert_consistent(&out);
    }

    #[test]
    fn test_negative_price_with_remaining_item() {
        let (out, _) = run(draft(
            vec![("Item 1", 1, -5.99), ("Item 2", 1, 3.49)],
            3.49,
            0.35,
            3.84,
        ));
        assert_eq!(out.subtotal, 3.49);
        assert_eq!(out.total, 3.84);
    }

    #[test]
    fn test_zero_quantity_defaults_to_one() {
        let (out, report) = run(draft(vec![("Item 1", 0, 5.99)], 5.99, 0.0, 5.99));
        assert_eq!(out.items[0].quantity, 1);
        assert!(report.has(CorrectionKind::QuantityDefaulted));
    }

    #[test]
    fn test_bogus_quantity_clamped_and_flagged() {
        let (out, report) = run(draft(
            vec![("Item 1", 9999, 59_894.01), ("Item 2", 1, 3.49)],
            59_897.50,
            0.0,
            59_897.50,
        ));
        assert_eq!(out.items[0].quantity, 100);
        assert!(report.has(CorrectionKind::QuantityClamped));
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, GuardrailWarning::BogusQuantity { .. })));
    }

    #[test]
    fn test_large_quantity_clamped_without_bogus_flag() {
        let (out, report) = run(draft(vec![("Napkins", 250, 3.00)], 3.00, 0.0, 3.00));
        assert_eq!(out.items[0].quantity, 100);
        assert_eq!(out.items[0].unit_price, Some(0.03));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_high_price_flagged_not_changed() {
        let (out, report) = run(draft(
            vec![("Item 1", 1, 999_999.99), ("Item 2", 1, 3.49)],
            1_000_003.48,
            80_000.28,
            1_080_003.76,
        ));
        assert_eq!(out.items[0].price, 999_999.99);
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, GuardrailWarning::SuspiciousPrice { .. })));
        assert_consistent(&out);
    }

    #[test]
    fn test_sub_cent_price_is_artifact() {
        let (out, report) = run(draft(
            vec![("Item 1", 1, 0.001), ("Item 2", 1, 3.49)],
            3.49,
            0.35,
            3.84,
        ));
        assert_eq!(out.items[0].price, 0.0);
        assert!(report.has(CorrectionKind::PriceBelowCent));
        assert_eq!(out.total, 3.84);
    }

    #[test]
    fn test_subtotal_mismatch_overwritten() {
        let (out, report) = run(draft(
            vec![("Item 1", 2, 11.98), ("Item 2", 1, 3.49)],
            100.0,
            1.55,
            101.55,
        ));
        assert_eq!(out.subtotal, 15.47);
        assert_eq!(out.total, 17.02);
        assert!(report.has(CorrectionKind::SubtotalMismatch));
        assert!(report.has(CorrectionKind::TotalMismatch));
    }

    #[test]
    fn test_subtotal_within_tolerance_kept() {
        // 5% is a calibration parameter, not a correctness boundary
        let (out, report) = run(draft(vec![("Item 1", 1, 10.0)], 10.40, 0.0, 10.40));
        assert_eq!(out.subtotal, 10.40);
        assert!(!report.has(CorrectionKind::SubtotalMismatch));
    }

    #[test]
    fn test_suspicious_tax_rate_flagged_total_recomputed() {
        let (out, report) = run(draft(
            vec![("Item 1", 1, 5.99), ("Item 2", 1, 3.49)],
            9.48,
            50.0,
            0.0,
        ));
        assert_eq!(out.tax, 50.0);
        assert_eq!(out.total, 59.48);
        assert!(report.has(CorrectionKind::TotalComputed));
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, GuardrailWarning::SuspiciousTaxRate { rate } if *rate > 5.0)));
    }

    #[test]
    fn test_correct_receipt_passes_through() {
        let mut input = draft(
            vec![("Cheese Burger", 2, 11.98), ("Soda", 1, 2.49)],
            14.47,
            1.16,
            15.63,
        );
        input.merchant = "McDonald's".to_string();
        for (item, unit) in input.items.iter_mut().zip([5.99, 2.49]) {
            item.unit_price = Some(unit);
            item.category = Some(ItemCategory::Restaurant);
        }
        let (out, report) = run(input.clone());

        assert!(report.is_clean());
        assert_eq!(out, input);
    }

    #[test]
    fn test_filled_fields_are_recorded() {
        let long_name = "Family Size Extra Crunchy Peanut Butter Granola Bars Variety Pack x24";
        let mut input = draft(vec![(long_name, 2, 4.00)], 4.00, 0.0, 4.00);
        input.merchant = "McDonald's".to_string();
        let (out, report) = run(input);

        let item = &out.items[0];
        assert!(item.name.chars().count() <= 50);
        assert_eq!(item.unit_price, Some(2.0));
        assert_eq!(item.category, Some(ItemCategory::Restaurant));

        let name: Vec<_> = report.corrections_for("items[0].name").collect();
        assert_eq!(name.len(), 1);
        assert_eq!(name[0].kind, CorrectionKind::NameTruncated);
        assert_eq!(name[0].before, long_name);
        assert_eq!(name[0].after, item.name);

        let unit: Vec<_> = report.corrections_for("items[0].unit_price").collect();
        assert_eq!(unit[0].kind, CorrectionKind::UnitPriceDerived);
        assert_eq!((unit[0].before.as_str(), unit[0].after.as_str()), ("none", "2"));

        let category: Vec<_> = report.corrections_for("items[0].category").collect();
        assert_eq!(category[0].kind, CorrectionKind::CategoryFilled);
        assert_eq!(category[0].after, "restaurant");

        // Nothing left to fill on a second pass
        let mut again = out.clone();
        assert!(Guardrails::with_defaults().validate_and_correct(&mut again).is_clean());
    }

    #[test]
    fn test_huge_prices_stay_finite() {
        let (out, report) = run(draft(
            vec![("Item 1", 1, 1e308), ("Item 2", 1, 1e308), ("Item 3", 1, 2.50)],
            f64::MAX / 2.0,
            1e300,
            1e308,
        ));

        assert_eq!(out.items[0].price, 0.0);
        assert_eq!(out.items[1].price, 0.0);
        assert_eq!(out.subtotal, 2.5);
        assert_eq!(out.tax, 0.0);
        assert_eq!(out.total, 2.5);
        assert_eq!(report.corrections_for("items[0].price").count(), 1);
        assert!(report.has(CorrectionKind::AmountInvalid));
        assert_consistent(&out);

        let json = serde_json::to_string(&out).unwrap();
        let back: ReceiptDraft = serde_json::from_str(&json).unwrap();
        assert_eq!(back, out);
    }

    #[test]
    fn test_huge_untrusted_price() {
        let raw: UntrustedReceipt = serde_json::from_str(
            r#"{"merchant": "Target", "items": [{"name": "Socks", "price": 1e308}], "total": 1e308}"#,
        )
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let (out, report) = Guardrails::with_defaults().validate_untrusted(&raw, today);

        assert_eq!(out.items[0].price, 0.0);
        assert_eq!(out.total, 0.0);
        assert!(report.has(CorrectionKind::PriceInvalid));
    }

    #[test]
    fn test_inconsistent_unit_price_rederived() {
        let mut input = draft(vec![("Soda", 2, 4.98)], 4.98, 0.0, 4.98);
        input.items[0].unit_price = Some(9.99);
        let (out, report) = run(input);
        assert_eq!(out.items[0].unit_price, Some(2.49));
        assert!(report.has(CorrectionKind::UnitPriceDerived));
    }

    #[test]
    fn test_non_finite_amounts() {
        let (out, report) = run(draft(vec![("Item 1", 1, f64::NAN)], f64::INFINITY, -1.0, -3.0));
        assert_eq!(out.items[0].price, 0.0);
        assert_eq!(out.subtotal, 0.0);
        assert_eq!(out.tax, 0.0);
        assert_eq!(out.total, 0.0);
        assert!(report.has(CorrectionKind::AmountInvalid));
        assert!(report.has(CorrectionKind::TaxNegative));
    }

    #[test]
    fn test_free_function_uses_defaults() {
        let out = validate_and_correct(draft(vec![("Milk", 1, 3.49)], 0.0, 0.0, 0.0));
        assert_eq!(out.subtotal, 3.49);
        assert_eq!(out.total, 3.49);
    }

    #[test]
    fn test_coerce_untrusted_model_output() {
        let raw: UntrustedReceipt = serde_json::from_str(
            r#"{
                "merchant": "Walmart",
                "date": "01/15/2024",
                "items": [
                    {"name": "Item 1", "price": 5.99, "quantity": -5},
                    {"name": "Item 2", "price": "3.49", "quantity": "invalid"},
                    {"price": "n/a", "category": "pharmacy"}
                ],
                "subtotal": 9.48,
                "tax": "0.76",
                "total": null,
                "payment_method": "VISA"
            }"#,
        )
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        let (out, report) = Guardrails::with_defaults().validate_untrusted(&raw, today);

        assert_eq!(out.merchant, "Walmart");
        assert_eq!(out.date, "2024-01-15");
        assert_eq!(out.method, ExtractionMethod::LlmBased);
        assert_eq!(out.payment_method, PaymentMethod::Credit);
        assert_eq!(out.items.len(), 3);
        assert!(out.items.iter().all(|i| i.quantity == 1));
        assert_eq!(out.items[1].price, 3.49);
        assert_eq!(out.items[2].name, UNKNOWN_ITEM);
        assert_eq!(out.items[2].price, 0.0);
        assert_eq!(out.items[2].category, Some(ItemCategory::Pharmacy));
        assert_eq!(out.subtotal, 9.48);
        assert_eq!(out.tax, 0.76);
        assert_eq!(out.total, 10.24);
        assert_eq!(report.corrections_for("items[0].quantity").count(), 1);
        assert!(report.has(CorrectionKind::DateDefaulted));
    }

    #[test]
    fn test_coerce_untrusted_defaults_everything() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let (out, _) =
            Guardrails::with_defaults().validate_untrusted(&UntrustedReceipt::default(), today);

        assert_eq!(out.merchant, UNKNOWN_MERCHANT);
        assert_eq!(out.date, "2024-02-01");
        assert!(out.items.is_empty());
        assert_eq!(out.total, 0.0);
    }

    #[test]
    fn test_coerce_truncates_items() {
        let raw = UntrustedReceipt {
            merchant: Some("Costco".to_string()),
            items: (0..25)
                .map(|i| UntrustedItem {
                    name: Some(format!("Item {}", i)),
                    price: LooseNumber::Number(1.0),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let (out, report) = Guardrails::with_defaults().validate_untrusted(&raw, today);

        assert_eq!(out.items.len(), 20);
        assert_eq!(out.subtotal, 20.0);
        assert!(report.has(CorrectionKind::ItemsTruncated));
    }

    fn arb_amount() -> impl Strategy<Value = f64> {
        prop_oneof![
            8 => -1_000.0..100_000.0f64,
            1 => Just(0.0),
            1 => prop_oneof![
                Just(f64::MAX / 2.0),
                Just(1e308),
                1e6..1e12f64,
            ],
            1 => prop_oneof![
                Just(f64::NAN),
                Just(f64::INFINITY),
                Just(f64::NEG_INFINITY),
                Just(-0.0),
            ],
        ]
    }

    fn arb_draft() -> impl Strategy<Value = ReceiptDraft> {
        let item = (
            "[A-Za-z ]{0,60}",
            0u32..20_000,
            arb_amount(),
            prop::option::of(arb_amount()),
        )
            .prop_map(|(name, quantity, price, unit_price)| {
                LineItem::new(name, quantity, unit_price, price)
            });

        (
            prop::collection::vec(item, 0..25),
            arb_amount(),
            arb_amount(),
            arb_amount(),
        )
            .prop_map(|(items, subtotal, tax, total)| {
                let mut draft = ReceiptDraft::new("Prop Store", "2024-01-15");
                draft.items = items;
                draft.subtotal = subtotal;
                draft.tax = tax;
                draft.total = total;
                draft
            })
    }

    proptest! {
        #[test]
        fn prop_validation_is_idempotent(draft in arb_draft()) {
            let once = validate_and_correct(draft);
            let twice = validate_and_correct(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_output_invariants(draft in arb_draft()) {
            let out = validate_and_correct(draft);

            prop_assert!((out.total - round2(out.subtotal + out.tax)).abs() <= 0.01 + EPSILON);
            prop_assert!(out.subtotal >= 0.0 && out.tax >= 0.0 && out.total >= 0.0);
            prop_assert!(out.subtotal.is_finite() && out.tax.is_finite() && out.total.is_finite());
            prop_assert!(out.items.len() <= 20);
            if !out.items.is_empty() {
                let items_total = out.items_total();
                prop_assert!((out.subtotal - items_total).abs() <= 0.05 * items_total + 1e-6);
            }
            for item in &out.items {
                prop_assert!((1..=100).contains(&item.quantity));
                prop_assert!(item.price >= 0.0 && item.price.is_finite());
                prop_assert!(item.unit_price.is_some_and(|u| u >= 0.0));
                prop_assert!(item.category.is_some());
                prop_assert!(!item.name.is_empty() && item.name.chars().count() <= 50);
            }
        }
    }
}
