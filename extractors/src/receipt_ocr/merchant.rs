use once_cell::sync::Lazy;
use regex::Regex;

/// Display name returned when no pattern matches.
pub const UNKNOWN_MERCHANT: &str = "Unknown Store";

/// A known merchant and how much a match on its pattern is trusted.
#[derive(Debug)]
pub struct MerchantPattern {
    pub display_name: &'static str,
    pub pattern: Regex,
    pub confidence: f32,
}

/// Result of merchant identification.
#[derive(Debug, Clone, PartialEq)]
pub struct MerchantMatch {
    pub name: String,
    pub confidence: f32,
}

impl MerchantMatch {
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_MERCHANT.to_string(),
            confidence: 0.0,
        }
    }

    pub fn is_known(&self) -> bool {
        self.confidence > 0.0
    }
}

/// Ordered merchant table, matched against lower-cased text. Specific chains
/// come first so that generic fallbacks ("pharmacy", "grill") only fire when
/// no chain name is present.
static MERCHANT_PATTERNS: Lazy<Vec<MerchantPattern>> = Lazy::new(|| {
    let table: &[(&'static str, &str, f32)] = &[
        ("Walmart", r"wal[\s\-]?mart", 0.95),
        ("McDonald's", r"mc\s?donald", 0.95),
        ("Tim Hortons", r"tim\s*horton", 0.95),
        ("Starbucks", r"starbucks", 0.95),
        ("Costco", r"costco", 0.95),
        ("Whole Foods", r"whole\s*foods", 0.95),
        ("Trader Joe's", r"trader\s*joe", 0.95),
        ("Shoppers Drug Mart", r"shoppers\s*drug", 0.95),
        ("Home Depot", r"home\s*depot", 0.95),
        ("Best Buy", r"best\s*buy", 0.95),
        ("Walgreens", r"walgreens", 0.95),
        ("Rite Aid", r"rite\s*aid", 0.95),
        ("Safeway", r"safeway", 0.9),
        ("Kroger", r"kroger", 0.9),
        ("Loblaws", r"loblaws", 0.9),
        ("No Frills", r"no\s*frills", 0.9),
        ("IKEA", r"\bikea\b", 0.9),
        ("CVS", r"\bcvs\b", 0.9),
        ("Chipotle", r"chipotle", 0.9),
        ("Wendy's", r"wendy'?s", 0.9),
        ("Pizza Hut", r"pizza\s*hut", 0.9),
        ("Subway", r"\bsubway\b", 0.85),
        ("KFC", r"\bkfc\b", 0.85),
        ("Target", r"\btarget\b", 0.85),
        ("Pharmacy", r"pharmacy|\bdrug\s*store", 0.5),
        ("Restaurant", r"restaurant|\bgrill\b|\bdiner\b|\bcafe\b", 0.4),
        ("Grocery Store", r"grocery|supermarket|\bmarket\b", 0.4),
    ];

    table
        .iter()
        .map(|(display_name, pattern, confidence)| MerchantPattern {
            display_name,
            pattern: Regex::new(pattern).unwrap(),
            confidence: *confidence,
        })
        .collect()
});

/// The static merchant table, in match order.
pub fn merchant_patterns() -> &'static [MerchantPattern] {
    &MERCHANT_PATTERNS
}

/// Identify the merchant; first matching pattern wins.
pub fn identify_merchant(text: &str) -> MerchantMatch {
    let lowered = text.to_lowercase();

    merchant_patterns()
        .iter()
        .find(|entry| entry.pattern.is_match(&lowered))
        .map(|entry| MerchantMatch {
            name: entry.display_name.to_string(),
            confidence: entry.confidence,
        })
        .unwrap_or_else(MerchantMatch::unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walmart_supercenter() {
        let found = identify_merchant("WALMART SUPERCENTER #4521\n123 Main St");
        assert_eq!(found.name, "Walmart");
        assert!(found.confidence >= 0.9);
    }

    #[test]
    fn test_spelling_variants() {
        assert_eq!(identify_merchant("Wal-Mart Stores").name, "Walmart");
        assert_eq!(identify_merchant("McDONALDS #12345").name, "McDonald's");
        assert_eq!(identify_merchant("TIM HORTONS 0921").name, "Tim Hortons");
    }

    #[test]
    fn test_chain_precedes_generic_fallback() {
        let found = identify_merchant("CVS/pharmacy #0042");
        assert_eq!(found.name, "CVS");

        let generic = identify_merchant("Main Street Pharmacy");
        assert_eq!(generic.name, "Pharmacy");
        assert!(generic.confidence < 0.8);
    }

    #[test]
    fn test_word_boundaries_prevent_collisions() {
        // "target" inside another word must not identify Target
        assert_eq!(identify_merchant("Targeted savings").name, UNKNOWN_MERCHANT);
    }

    #[test]
    fn test_unknown_merchant() {
        let found = identify_merchant("ACME HARDWARE\nHammer 12.99");
        assert_eq!(found, MerchantMatch::unknown());
        assert!(!found.is_known());
    }

    #[test]
    fn test_confidences_are_weights() {
        for entry in merchant_patterns() {
            assert!((0.0..=1.0).contains(&entry.confidence), "{}", entry.display_name);
        }
    }
}
