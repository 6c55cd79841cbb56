use once_cell::sync::Lazy;
use regex::Regex;
use shared_types::LineItem;
use tracing::debug;

use super::amounts::{find_amounts, parse_amount, round2, within_tolerance};
use super::category::categorize;
use super::ParserConfig;

/// Why a line produced no item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSkip {
    TooShort,
    /// A total-like line was already seen above this one.
    AfterTotal,
    TotalLine,
    StopWord,
    WeightAnnotation,
    Header,
    Noisy,
    NoPattern,
    BadName(NameRejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRejection {
    NoLetters,
    TooShort,
}

const SPECIAL_CHARS: &str = "—=*~@#$%^&()[]{}|\\<>";

static STOP_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:subtotal|total|tax(?:es)?|gst|pst|hst|qst|vat|amount|balance|change|tender|payment|cash|credit|debit|visa|mastercard|amex|card|received|refund|discount|coupon|savings|remaining|due|paid|ref\s*num|cashier|thank|visit|receipt|transaction|invoice|order|take\s*home|made\s*from|authentic|taste\s*of|delivery|shipping)\b",
    )
    .unwrap()
});

static WEIGHT_ANNOTATIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d+(?:\.\d+)?\s*(?:kg|g|lb|lbs|oz)\b.*@",
        r"^@\s*\$?\d+\.\d{2}",
        r"^\$?\d+\.\d{2}\s*/\s*(?:kg|lb|oz|ea|unit)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:qty|item|price|amount|description|table|card|phone|address|tel|store|cashier|server|date|time)\b",
    )
    .unwrap()
});

static TAX_FLAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d\.\d{2})\s+[A-Za-z]{1,2}$").unwrap());

static QTY_UNIT_TOTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3})\s*[xX]?\s+(.+?)\s+\$?(\d+\.\d{2})\s+\$?(\d+\.\d{2})$").unwrap()
});

static MULTIPLIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})\s*[xX]\s+(.+?)\s+\$?(\d+\.\d{2})$").unwrap());

static AT_UNIT_PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)\s+(\d{1,3})\s*@\s*\$?(\d+\.\d{2})(?:\s+\$?(\d+\.\d{2}))?$").unwrap()
});

static LEADING_QTY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}\s*[xX]?\s+").unwrap());
static TRAILING_QTY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\d+$").unwrap());
static TWO_LETTERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]{2,}").unwrap());

/// An item as a structural pattern read it, before name cleanup.
#[derive(Debug, Clone, PartialEq)]
struct RawItem {
    name: String,
    quantity: u32,
    unit_price: f64,
    price: f64,
}

/// One structural item shape. Patterns are tried in table order; the first
/// that returns `Some` claims the line.
struct ItemPattern {
    name: &'static str,
    extract: fn(&str, &ParserConfig) -> Option<RawItem>,
}

const ITEM_PATTERNS: &[ItemPattern] = &[
    ItemPattern {
        name: "qty_unit_total",
        extract: qty_unit_total,
    },
    ItemPattern {
        name: "trailing_price",
        extract: trailing_price,
    },
    ItemPattern {
        name: "multiplier",
        extract: multiplier,
    },
    ItemPattern {
        name: "at_unit_price",
        extract: at_unit_price,
    },
];

/// `4 Cheese Burger 5.99 23.96`: accepted only when the arithmetic holds.
fn qty_unit_total(line: &str, config: &ParserConfig) -> Option<RawItem> {
    let caps = QTY_UNIT_TOTAL.captures(line)?;
    let quantity: u32 = caps[1].parse().ok().filter(|q| *q > 0)?;
    let unit_price = parse_amount(&caps[3])?;
    let price = parse_amount(&caps[4])?;

    if !within_tolerance(quantity as f64 * unit_price, price, config.line_math_tolerance) {
        debug!(line, quantity, unit_price, price, "Line math does not add up");
        return None;
    }

    Some(RawItem {
        name: caps[2].to_string(),
        quantity,
        unit_price,
        price,
    })
}

/// `Bananas 1.49`: the last amount is the price, the text before the first
/// amount is the name.
fn trailing_price(line: &str, config: &ParserConfig) -> Option<RawItem> {
    if MULTIPLIER.is_match(line) || line.contains('@') {
        return None;
    }

    let amounts = find_amounts(line);
    let first = amounts.first()?;
    let last = amounts.last()?;
    if last.end != line.len() {
        return None;
    }
    if !(config.min_item_price..=config.max_item_price).contains(&last.value) {
        return None;
    }

    Some(RawItem {
        name: line[..first.start].to_string(),
        quantity: 1,
        unit_price: last.value,
        price: last.value,
    })
}

/// `3 x Donut 4.47`: the price is the line total.
fn multiplier(line: &str, config: &ParserConfig) -> Option<RawItem> {
    let caps = MULTIPLIER.captures(line)?;
    let quantity: u32 = caps[1].parse().ok().filter(|q| *q > 0)?;
    let price = parse_amount(&caps[3])?;
    let unit_price = round2(price / quantity as f64);

    if !(config.min_item_price..=config.max_item_price).contains(&unit_price) {
        return None;
    }

    Some(RawItem {
        name: caps[2].to_string(),
        quantity,
        unit_price,
        price,
    })
}

/// `Coffee 2 @ 1.50 3.00`, the line total being optional.
fn at_unit_price(line: &str, config: &ParserConfig) -> Option<RawItem> {
    let caps = AT_UNIT_PRICE.captures(line)?;
    let quantity: u32 = caps[2].parse().ok().filter(|q| *q > 0)?;
    let unit_price = parse_amount(&caps[3])?;
    let expected = round2(quantity as f64 * unit_price);

    let price = match caps.get(4) {
        Some(total) => {
            let total = parse_amount(total.as_str())?;
            if !within_tolerance(expected, total, config.line_math_tolerance) {
                return None;
            }
            total
        }
        None => expected,
    };

    if !(config.min_item_price..=config.max_item_price).contains(&unit_price) {
        return None;
    }

    Some(RawItem {
        name: caps[1].to_string(),
        quantity,
        unit_price,
        price,
    })
}

/// Strip quantity tokens and currency symbols from a raw item name and
/// reject what is obviously OCR garbage.
pub fn clean_name(raw: &str, max_len: usize) -> Result<String, NameRejection> {
    let without_symbols = raw.replace('$', " ");
    let name = LEADING_QTY.replace(without_symbols.trim(), "");
    let name = TRAILING_QTY.replace(&name, "");
    let name = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| matches!(c, ':' | '-' | '@' | '.' | ',' | '*'))
        .trim()
        .to_string();

    if !TWO_LETTERS.is_match(&name) {
        return Err(NameRejection::NoLetters);
    }
    if name.chars().count() < 3 {
        return Err(NameRejection::TooShort);
    }

    Ok(name
        .chars()
        .take(max_len)
        .collect::<String>()
        .trim_end()
        .to_string())
}

/// Line-by-line item scanner. Holds the "seen total" sentinel: once a
/// total-like line is passed, nothing below it is read as an item.
pub struct LineScanner<'a> {
    config: &'a ParserConfig,
    merchant: &'a str,
    seen_total: bool,
}

impl<'a> LineScanner<'a> {
    pub fn new(config: &'a ParserConfig, merchant: &'a str) -> Self {
        Self {
            config,
            merchant,
            seen_total: false,
        }
    }

    /// Read one line as an item, or say why it is not one.
    pub fn classify(&mut self, line: &str) -> Result<LineItem, LineSkip> {
        let line = line.trim();
        let lowered = line.to_lowercase();

        if line.chars().count() < self.config.min_line_len {
            return Err(LineSkip::TooShort);
        }
        if self.seen_total {
            return Err(LineSkip::AfterTotal);
        }
        if lowered.contains("total") && (lowered.contains("pay") || !find_amounts(line).is_empty())
        {
            self.seen_total = true;
            return Err(LineSkip::TotalLine);
        }
        if STOP_WORDS.is_match(&lowered) {
            return Err(LineSkip::StopWord);
        }
        if WEIGHT_ANNOTATIONS.iter().any(|re| re.is_match(&lowered)) {
            return Err(LineSkip::WeightAnnotation);
        }
        // A priced line is an item even when it starts like a column header
        if HEADER.is_match(&lowered) && find_amounts(line).is_empty() {
            return Err(LineSkip::Header);
        }
        if line.chars().filter(|c| SPECIAL_CHARS.contains(*c)).count() > self.config.max_special_chars {
            return Err(LineSkip::Noisy);
        }

        let body = TAX_FLAG.replace(line, "$1");
        let (pattern, raw) = ITEM_PATTERNS
            .iter()
            .find_map(|p| (p.extract)(&body, self.config).map(|raw| (p.name, raw)))
            .ok_or(LineSkip::NoPattern)?;

        let name = clean_name(&raw.name, self.config.max_name_len).map_err(LineSkip::BadName)?;
        debug!(pattern, name = %name, price = raw.price, "Matched line item");

        let category = categorize(&name, self.merchant);
        Ok(LineItem::new(name, raw.quantity, Some(round2(raw.unit_price)), round2(raw.price))
            .with_category(category))
    }
}

/// Extract line items in receipt order, at most `config.max_items`.
pub fn extract_items(text: &str, merchant: &str, config: &ParserConfig) -> Vec<LineItem> {
    let mut scanner = LineScanner::new(config, merchant);
    let mut items = Vec::new();

    for line in text.lines() {
        if items.len() >= config.max_items {
            break;
        }
        match scanner.classify(line) {
            Ok(item) => items.push(item),
            Err(LineSkip::TooShort) | Err(LineSkip::AfterTotal) => {}
            Err(reason) => debug!(line, ?reason, "Skipped line"),
        }
    }

    items
}
