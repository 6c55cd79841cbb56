use once_cell::sync::Lazy;
use regex::Regex;

/// Currency amount with exactly two decimals, optional sign and `$`,
/// optional thousands separators: `23.96`, `$1,044.93`, `-2.00`.
static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(-)?(?:\$\s?)?((?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2})\b").unwrap()
});

/// A currency amount found in a line, with its byte span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amount {
    pub value: f64,
    pub start: usize,
    pub end: usize,
}

/// Round to whole cents. Never returns negative zero.
pub fn round2(value: f64) -> f64 {
    let cents = (value * 100.0).round();
    if !cents.is_finite() {
        return value + 0.0;
    }
    cents / 100.0 + 0.0
}

/// Parse a currency string such as `"$1,234.50"`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Every currency amount in `line`, left to right.
pub fn find_amounts(line: &str) -> Vec<Amount> {
    AMOUNT_RE
        .captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let magnitude = parse_amount(caps.get(2)?.as_str())?;
            let value = if caps.get(1).is_some() { -magnitude } else { magnitude };
            Some(Amount {
                value,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// The last amount on the line, if the line carries one.
pub fn last_amount(line: &str) -> Option<f64> {
    find_amounts(line).last().map(|a| a.value)
}

/// Relative closeness check with a one-cent absolute floor.
pub fn within_tolerance(actual: f64, expected: f64, tolerance: f64) -> bool {
    let diff = (actual - expected).abs();
    diff <= 0.01 + 1e-9 || diff <= expected.abs() * tolerance
}
