pub fn build_health_prompt(item_names: &[&str]) -> String {
    format!(
        r#"Analyze these grocery/food items for health and allergen information:

Items: {items}

Provide a JSON response with:
{{
    "allergen_alerts": ["potential allergens found: dairy, nuts, gluten, soy, eggs, shellfish, etc."],
    "health_score": 0,
    "health_warnings": ["specific warnings like 'High sugar', 'High sodium', 'Processed foods'"],
    "suggestions": ["specific, actionable suggestions for healthier alternatives"],
    "diet_flags": {{
        "vegetarian_friendly": false,
        "vegan_friendly": false,
        "gluten_free": false,
        "high_protein": false,
        "low_sugar": false
    }},
    "nutritional_summary": "brief 1-2 sentence summary"
}}

## Rules

1. `health_score` is an integer from 0 to 100, higher is healthier
2. Be specific and practical
3. Return ONLY the JSON object

JSON Output:"#,
        items = item_names.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_items() {
        let prompt = build_health_prompt(&["Whole Milk", "Peanut Butter"]);
        assert!(prompt.contains("Items: Whole Milk, Peanut Butter"));
        assert!(prompt.contains("\"diet_flags\""));
    }
}
