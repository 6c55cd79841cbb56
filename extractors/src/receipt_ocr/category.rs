use shared_types::ItemCategory;

/// Merchant-name signals, checked before the item name.
const MERCHANT_SIGNALS: &[(ItemCategory, &[&str])] = &[
    (
        ItemCategory::Restaurant,
        &[
            "mcdonald", "burger", "wendy", "subway", "pizza", "starbucks", "coffee", "cafe",
            "restaurant", "taco", "kfc", "tim horton", "chipotle", "grill", "diner",
        ],
    ),
    (
        ItemCategory::Groceries,
        &[
            "walmart", "target", "costco", "whole foods", "trader joe", "kroger", "safeway",
            "grocery", "market", "supermarket", "loblaws", "no frills",
        ],
    ),
    (
        ItemCategory::Pharmacy,
        &["cvs", "walgreens", "rite aid", "pharmacy", "drug"],
    ),
];

/// Item-name keywords. Iteration order decides ties: "cheese burger" is
/// groceries because groceries is checked first.
const CATEGORY_KEYWORDS: &[(ItemCategory, &[&str])] = &[
    (
        ItemCategory::Groceries,
        &[
            "milk", "bread", "eggs", "cheese", "butter", "yogurt", "flour", "sugar", "rice",
            "pasta", "cereal", "fruit", "vegetable", "meat", "chicken", "beef", "pork", "fish",
            "salmon", "tuna", "apple", "banana", "orange", "tomato", "lettuce", "carrot",
            "potato", "onion", "garlic", "oil", "salt", "pepper",
        ],
    ),
    (
        ItemCategory::Restaurant,
        &[
            "burger", "fries", "pizza", "sandwich", "taco", "burrito", "salad", "sundae",
            "ice cream", "shake", "soda", "coffee", "tea", "latte", "cappuccino", "espresso",
            "mocha", "combo", "meal", "nuggets", "wings", "wrap", "sub", "hot dog", "nachos",
            "quesadilla", "smoothie", "juice", "caramel", "fudge", "chocolate", "vanilla",
            "strawberry",
        ],
    ),
    (
        ItemCategory::Pharmacy,
        &[
            "medicine", "prescription", "tablet", "capsule", "syrup", "cream", "ointment",
            "bandage", "vitamins", "supplement", "aspirin", "ibuprofen", "antibiotic", "inhaler",
            "drops", "lotion", "sunscreen", "sanitizer", "mask", "thermometer",
        ],
    ),
    (
        ItemCategory::Retail,
        &[
            "shirt", "pants", "shoes", "socks", "jacket", "dress", "hat", "bag", "wallet", "belt",
            "watch", "glasses", "towel", "pillow", "blanket", "lamp", "candle", "book", "toy",
            "game", "electronics", "phone", "charger", "cable", "battery", "pen", "paper",
            "notebook", "folder",
        ],
    ),
];

fn first_match(table: &[(ItemCategory, &[&str])], haystack: &str) -> Option<ItemCategory> {
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| haystack.contains(keyword)))
        .map(|(category, _)| *category)
}

/// Category implied by the merchant alone, if any.
pub fn category_for_merchant(merchant: &str) -> Option<ItemCategory> {
    if merchant.trim().is_empty() {
        return None;
    }
    first_match(MERCHANT_SIGNALS, &merchant.to_lowercase())
}

/// Categorize an item. The merchant wins over the item name; `Other` when
/// neither says anything.
pub fn categorize(item_name: &str, merchant: &str) -> ItemCategory {
    category_for_merchant(merchant)
        .or_else(|| first_match(CATEGORY_KEYWORDS, &item_name.to_lowercase()))
        .unwrap_or(ItemCategory::Other)
}
