use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// A date shape and the chrono formats to try on each match, in order.
struct DateFormat {
    pattern: Regex,
    formats: &'static [&'static str],
    /// Month spelled out; punctuation is dropped before parsing.
    textual: bool,
}

const MONTH: &str = r"(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?";

static DATE_FORMATS: Lazy<Vec<DateFormat>> = Lazy::new(|| {
    let table: [(String, &'static [&'static str], bool); 8] = [
        (r"\b\d{4}-\d{2}-\d{2}\b".to_string(), &["%Y-%m-%d"], false),
        (r"\b\d{1,2}/\d{1,2}/\d{4}\b".to_string(), &["%m/%d/%Y", "%d/%m/%Y"], false),
        (r"\b\d{4}/\d{1,2}/\d{1,2}\b".to_string(), &["%Y/%m/%d"], false),
        (r"\b\d{1,2}-\d{1,2}-\d{4}\b".to_string(), &["%m-%d-%Y", "%d-%m-%Y"], false),
        (r"\b\d{1,2}\.\d{1,2}\.\d{4}\b".to_string(), &["%d.%m.%Y"], false),
        (r"\b\d{1,2}/\d{1,2}/\d{2}\b".to_string(), &["%m/%d/%y", "%d/%m/%y"], false),
        (format!(r"(?i)\b{MONTH}\s+\d{{1,2}},?\s+\d{{4}}\b"), &["%b %d %Y"], true),
        (format!(r"(?i)\b\d{{1,2}}\s+{MONTH},?\s+\d{{4}}\b"), &["%d %b %Y"], true),
    ];

    table
        .into_iter()
        .map(|(pattern, formats, textual)| DateFormat {
            pattern: Regex::new(&pattern).unwrap(),
            formats,
            textual,
        })
        .collect()
});

/// Find the first parseable date in `text`, formatted as `YYYY-MM-DD`.
///
/// Shapes are tried in table order and every match of a shape is attempted
/// before moving on, so a malformed first candidate (an invoice number that
/// looks like a date) does not hide a valid one further down.
pub fn extract_date(text: &str) -> Option<String> {
    DATE_FORMATS.iter().find_map(|shape| {
        shape.pattern.find_iter(text).find_map(|m| {
            let candidate = if shape.textual {
                normalize_textual(m.as_str())
            } else {
                m.as_str().to_string()
            };
            shape
                .formats
                .iter()
                .filter_map(|format| NaiveDate::parse_from_str(&candidate, format).ok())
                .find(is_plausible)
        })
    })
    .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Parse an ISO `YYYY-MM-DD` string.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// `"Sept. 5, 2024"` -> `"Sep 5 2024"`
fn normalize_textual(raw: &str) -> String {
    raw.replace([',', '.'], " ")
        .split_whitespace()
        .map(|token| {
            if token.starts_with(|c: char| c.is_alphabetic()) {
                token.chars().take(3).collect()
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn is_plausible(date: &NaiveDate) -> bool {
    (1990..=2100).contains(&date.year())
}
