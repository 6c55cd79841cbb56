pub fn build_extraction_prompt(receipt_text: &str) -> String {
    format!(
        r#"You are a receipt data extractor. Extract ONLY the following information from this receipt text in JSON format:

{{
    "merchant": "store name (must be present)",
    "date": "YYYY-MM-DD",
    "items": [
        {{
            "name": "item name",
            "quantity": 1,
            "price": 0.00,
            "category": "groceries|restaurant|retail|pharmacy|other"
        }}
    ],
    "subtotal": 0.00,
    "tax": 0.00,
    "total": 0.00,
    "payment_method": "cash|credit|debit|unknown"
}}

## Rules

1. merchant and date are REQUIRED. If the merchant cannot be read, set it to "Unknown"
2. Extract ALL purchased items, in the order they appear
3. `price` is the line total for the item (quantity times unit price)
4. Amounts are plain numbers without currency symbols
5. If a field is unclear, use null
6. Categorize items from the merchant and the item names
7. Return ONLY valid JSON, no commentary

## Receipt Text

{receipt_text}

JSON Output:"#
    )
}
