//! Pre-pass over raw OCR output that undoes the most common letter/digit
//! misreads and normalises spacing. Line breaks are preserved because every
//! downstream extractor scans line by line.

/// Letters that OCR engines emit in place of digits.
const DIGIT_CONFUSIONS: &[(char, char)] = &[('l', '1'), ('I', '1'), ('O', '0'), ('S', '5')];

/// Correct character substitutions and collapse whitespace, line by line.
pub fn denoise(text: &str) -> String {
    text.lines().map(denoise_line).collect::<Vec<_>>().join("\n")
}

fn denoise_line(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut fixed = String::with_capacity(line.len());

    for (i, &c) in chars.iter().enumerate() {
        let digit = DIGIT_CONFUSIONS
            .iter()
            .find(|(letter, _)| *letter == c)
            .map(|(_, digit)| *digit);

        match digit {
            Some(digit) if in_numeric_context(&chars, i) => fixed.push(digit),
            _ => fixed.push(c),
        }
    }

    fixed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A confusable letter counts as a digit when it starts a token (or follows
/// another digit) and a digit, or a decimal separator plus digit, follows it.
fn in_numeric_context(chars: &[char], i: usize) -> bool {
    if i > 0 && chars[i - 1].is_alphabetic() {
        return false;
    }

    match chars.get(i + 1) {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') | Some(',') => chars.get(i + 2).is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixes_letters_inside_numbers() {
        assert_eq!(denoise("Soda l2.99"), "Soda 12.99");
        assert_eq!(denoise("Milk $O.99"), "Milk $0.99");
        assert_eq!(denoise("Bread S.49"), "Bread 5.49");
        assert_eq!(denoise("Eggs 1O.25"), "Eggs 10.25");
    }

    #[test]
    fn test_leaves_words_alone() {
        assert_eq!(denoise("Total2 SODA"), "Total2 SODA");
        assert_eq!(denoise("OLIVE OIL 5.99"), "OLIVE OIL 5.99");
        assert_eq!(denoise("Subtotal: 23.96"), "Subtotal: 23.96");
    }

    #[test]
    fn test_collapses_whitespace_and_keeps_lines() {
        let raw = "  McDONALDS   #12345 \n\n4\tCheese   Burger    5.99\t23.96\r\nTotal  25.88";
        assert_eq!(
            denoise(raw),
            "McDONALDS #12345\n\n4 Cheese Burger 5.99 23.96\nTotal 25.88"
        );
    }

    #[test]
    fn test_idempotent() {
        let raw = "WALMART  l2/O5/2024\nBananas  S.49\nlOlO";
        let once = denoise(raw);
        assert_eq!(denoise(&once), once);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(denoise(""), "");
    }
}
