/// Digit read for a glyph OCR commonly confuses with one.
pub fn substitute_glyph(c: char) -> Option<char> {
    let digit = match c {
        'O' | 'o' | 'D' | 'Q' => '0',
        'I' | 'l' | 'i' | '|' | '!' => '1',
        'Z' | 'z' => '2',
        'S' | 's' => '5',
        'G' | 'b' => '6',
        'T' => '7',
        'B' => '8',
        'g' | 'q' => '9',
        _ => return None,
    };
    Some(digit)
}

/// Numeric branch: substitute confusable glyphs, then drop every non-digit.
pub fn normalize_numeric(text: &str) -> String {
    text.chars()
        .map(|c| substitute_glyph(c).unwrap_or(c))
        .filter(char::is_ascii_digit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_digits_are_unchanged() {
        for s in ["1887", "0042", "9"] {
            assert_eq!(normalize_numeric(s), s);
        }
    }

    #[test]
    fn confusables_map_deterministically() {
        assert_eq!(normalize_numeric("O"), "0");
        assert_eq!(normalize_numeric("oDQ"), "000");
        assert_eq!(normalize_numeric("I8S7"), "1857");
        assert_eq!(normalize_numeric("Zg"), "29");
        assert_eq!(normalize_numeric("1 8-B 7"), "1887");
        assert_eq!(normalize_numeric("x?"), "");
    }
}
