use std::fmt::Write;

use shared_types::ReceiptDraft;

const MAX_SPOKEN_ITEMS: usize = 5;

/// Plain-language rendering of a receipt, suitable for text-to-speech.
pub fn spoken_summary(receipt: &ReceiptDraft) -> String {
    let count = receipt.items.len();
    let mut summary = format!(
        "Receipt from {} on {}. Total: ${:.2}. You purchased {} item{}.",
        receipt.merchant,
        receipt.date,
        receipt.total,
        count,
        if count == 1 { "" } else { "s" }
    );

    if count > 0 {
        let listed: Vec<String> = receipt
            .items
            .iter()
            .take(MAX_SPOKEN_ITEMS)
            .map(|item| format!("{} for ${:.2}", item.name, item.price))
            .collect();
        let _ = write!(summary, " Items: {}", listed.join(", "));
        if count > MAX_SPOKEN_ITEMS {
            let _ = write!(summary, ", and {} more items", count - MAX_SPOKEN_ITEMS);
        }
        summary.push('.');
    }

    if receipt.return_policy_days > 0 {
        let _ = write!(
            summary,
            " This item can be returned within {} days.",
            receipt.return_policy_days
        );
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::LineItem;

    #[test]
    fn test_summary_lists_items() {
        let mut receipt = ReceiptDraft::new("Walmart", "2024-01-15");
        receipt.items.push(LineItem::new("Milk", 1, Some(3.49), 3.49));
        receipt.items.push(LineItem::new("Bread", 1, Some(2.5), 2.5));
        receipt.total = 6.5;
        receipt.return_policy_days = 90;

        assert_eq!(
            spoken_summary(&receipt),
            "Receipt from Walmart on 2024-01-15. Total: $6.50. You purchased 2 items. \
             Items: Milk for $3.49, Bread for $2.50. \
             This item can be returned within 90 days."
        );
    }

    #[test]
    fn test_summary_truncates_long_baskets() {
        let mut receipt = ReceiptDraft::new("Costco", "2024-01-15");
        for i in 0..7 {
            receipt
                .items
                .push(LineItem::new(format!("Item {}", i), 1, Some(1.0), 1.0));
        }

        let summary = spoken_summary(&receipt);
        assert!(summary.contains("Item 4 for $1.00, and 2 more items."));
        assert!(!summary.contains("Item 5"));
    }

    #[test]
    fn test_summary_single_item_without_policy() {
        let mut receipt = ReceiptDraft::new("Acme", "2024-01-15");
        receipt.items.push(LineItem::new("Hammer", 1, Some(12.99), 12.99));

        let summary = spoken_summary(&receipt);
        assert!(summary.contains("You purchased 1 item."));
        assert!(!summary.contains("returned"));
    }
}
