use once_cell::sync::Lazy;
use regex::Regex;
use shared_types::LineItem;
use tracing::debug;

use super::amounts::{last_amount, round2};
use super::ParserConfig;

/// Receipt-level amounts after reconciliation. All non-negative, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Financials {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

/// Raw values found by the keyword scan, before any derivation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FinancialScan {
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub total: Option<f64>,
    /// Sum of discount lines, always <= 0.
    pub discounts: f64,
    /// Sum of shipping/fee lines, always >= 0.
    pub charges: f64,
    specific_total: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    SpecificTotal,
    Subtotal,
    Tax,
    Discount,
    Charge,
    Total,
}

/// Keyword families in precedence order. A line belongs to the first family
/// it matches, so "Total Tax" is tax and "Subtotal" is never a bare total.
/// "Amount due" and "balance due" are left out: after payment they print the
/// remaining balance, usually 0.00, not the receipt total.
static FAMILIES: Lazy<Vec<(Family, Regex)>> = Lazy::new(|| {
    [
        (
            Family::SpecificTotal,
            r"total\s+to\s+pay|grand\s+total",
        ),
        (Family::Subtotal, r"sub\s*-?\s*total"),
        (Family::Tax, r"\b(?:tax(?:es)?|gst|pst|hst|qst|vat|tps|tvq)\b"),
        (
            Family::Discount,
            r"discount|coupon|savings|loyalty|promo|rebate|instant\s+saving",
        ),
        (
            Family::Charge,
            r"delivery|shipping|service\s+(?:charge|fee)|bag\s+fee|surcharge|\bfee\b|deposit|\btip\b|gratuity",
        ),
        (Family::Total, r"^\s*total\b"),
    ]
    .into_iter()
    .map(|(family, pattern)| (family, Regex::new(pattern).unwrap()))
    .collect()
});

static HAS_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]{2,}").unwrap());

fn family_of(line: &str) -> Option<Family> {
    let lowered = line.to_lowercase();
    FAMILIES
        .iter()
        .find(|(_, pattern)| pattern.is_match(&lowered))
        .map(|(family, _)| *family)
}

/// Amount for the label on `lines[index]`: the last amount on the same line,
/// or a bare amount printed alone on the next line.
fn amount_for_label(lines: &[&str], index: usize) -> Option<f64> {
    last_amount(lines[index]).or_else(|| {
        let next = lines.get(index + 1)?;
        if family_of(next).is_some() || HAS_WORD.is_match(next) {
            return None;
        }
        last_amount(next)
    })
}

/// Scan every line for subtotal/tax/total/discount/charge values.
pub fn scan_financials(text: &str) -> FinancialScan {
    let lines: Vec<&str> = text.lines().collect();
    let mut scan = FinancialScan::default();

    for index in 0..lines.len() {
        let Some(family) = family_of(lines[index]) else {
            continue;
        };
        let Some(value) = amount_for_label(&lines, index) else {
            continue;
        };
        debug!(?family, value, "Financial value");

        match family {
            Family::SpecificTotal => {
                if !scan.specific_total {
                    scan.total = Some(value);
                    scan.specific_total = true;
                }
            }
            Family::Subtotal => {
                if scan.subtotal.is_none() {
                    scan.subtotal = Some(value);
                }
            }
            Family::Tax => {
                scan.tax = Some(round2(scan.tax.unwrap_or(0.0) + value));
            }
            Family::Discount => scan.discounts = round2(scan.discounts - value.abs()),
            Family::Charge => scan.charges = round2(scan.charges + value.abs()),
            Family::Total => {
                if scan.total.is_none() {
                    scan.total = Some(value);
                }
            }
        }
    }

    scan
}

/// Fill in whatever the scan did not find from what it did, falling back to
/// the item sum. Every derived value is rounded as it is computed.
pub fn reconcile(scan: &FinancialScan, items_total: f64, assumed_tax_rate: f64) -> Financials {
    let discounts = scan.discounts;
    let charges = scan.charges;
    let clamp = |v: f64| round2(v).max(0.0);

    let (subtotal, tax, total) = if let Some(total) = scan.total {
        let total = round2(total);
        match (scan.subtotal, scan.tax) {
            (Some(subtotal), Some(tax)) => (subtotal, tax, total),
            (Some(subtotal), None) => {
                let tax = round2(total - subtotal - charges - discounts);
                (subtotal, tax, total)
            }
            (None, None) if charges == 0.0 && discounts == 0.0 => {
                let subtotal = round2(total / (1.0 + assumed_tax_rate));
                (subtotal, round2(total - subtotal), total)
            }
            (None, tax) => {
                let tax = tax.unwrap_or(0.0);
                (round2(total - tax - charges - discounts), tax, total)
            }
        }
    } else if let Some(subtotal) = scan.subtotal {
        let tax = scan.tax.unwrap_or(0.0);
        (subtotal, tax, round2(subtotal + discounts + tax + charges))
    } else if items_total > 0.0 {
        let subtotal = round2(items_total);
        let tax = scan
            .tax
            .unwrap_or_else(|| round2(subtotal * assumed_tax_rate));
        (subtotal, tax, round2(subtotal + discounts + tax + charges))
    } else {
        (0.0, 0.0, 0.0)
    };

    Financials {
        subtotal: clamp(subtotal),
        tax: clamp(tax),
        total: clamp(total),
    }
}

/// Extract and reconcile subtotal, tax and total.
pub fn extract_financials(text: &str, items: &[LineItem], config: &ParserConfig) -> Financials {
    let items_total: f64 = items.iter().map(|item| item.price).sum();
    reconcile(&scan_financials(text), items_total, config.assumed_tax_rate)
}
