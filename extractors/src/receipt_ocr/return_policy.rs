use chrono::Duration;
use shared_types::ReceiptDraft;

use super::date::parse_iso_date;

pub const DEFAULT_RETURN_DAYS: u32 = 30;

/// Merchant substring -> return window in days.
const RETURN_POLICIES: &[(&str, u32)] = &[
    ("walmart", 90),
    ("target", 90),
    ("costco", 90),
    ("amazon", 30),
    ("best buy", 15),
    ("home depot", 90),
    ("lowes", 90),
    ("tj maxx", 30),
    ("marshalls", 30),
    ("gap", 45),
    ("old navy", 45),
    ("nordstrom", 90),
    ("macy's", 30),
    ("whole foods", 90),
    ("trader joe's", 30),
    ("cvs", 60),
    ("walgreens", 30),
    ("rite aid", 30),
];

pub fn return_policy_days(merchant: &str) -> u32 {
    let merchant = merchant.to_lowercase();
    RETURN_POLICIES
        .iter()
        .find(|(store, _)| merchant.contains(store))
        .map(|(_, days)| *days)
        .unwrap_or(DEFAULT_RETURN_DAYS)
}

/// `date + days` as `YYYY-MM-DD`, or `None` if `date` is not an ISO date.
pub fn return_deadline(date: &str, days: u32) -> Option<String> {
    let purchased = parse_iso_date(date)?;
    let deadline = purchased.checked_add_signed(Duration::days(i64::from(days)))?;
    Some(deadline.format("%Y-%m-%d").to_string())
}

/// Fill `return_policy_days` and `return_deadline` from the merchant and date.
pub fn apply_return_policy(draft: &mut ReceiptDraft) {
    draft.return_policy_days = return_policy_days(&draft.merchant);
    draft.return_deadline = return_deadline(&draft.date, draft.return_policy_days);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_merchants() {
        assert_eq!(return_policy_days("Walmart"), 90);
        assert_eq!(return_policy_days("Best Buy #221"), 15);
        assert_eq!(return_policy_days("CVS"), 60);
    }

    #[test]
    fn test_default_window() {
        assert_eq!(return_policy_days("Unknown Store"), DEFAULT_RETURN_DAYS);
        assert_eq!(return_policy_days(""), DEFAULT_RETURN_DAYS);
    }

    #[test]
    fn test_deadline() {
        assert_eq!(return_deadline("2024-01-15", 90), Some("2024-04-14".to_string()));
        assert_eq!(return_deadline("2024-02-20", 30), Some("2024-03-21".to_string()));
        assert_eq!(return_deadline("not a date", 30), None);
    }

    #[test]
    fn test_apply_return_policy() {
        let mut draft = ReceiptDraft::new("Costco", "2024-06-01");
        apply_return_policy(&mut draft);
        assert_eq!(draft.return_policy_days, 90);
        assert_eq!(draft.return_deadline.as_deref(), Some("2024-08-30"));
    }
}
