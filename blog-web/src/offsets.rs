//! Conversion between browser selection offsets and char offsets
//!
//! `selectionStart`/`selectionEnd` count UTF-16 code units; the host trait
//! speaks in chars.

/// Char index at UTF-16 offset `units`, clamped to the text
pub fn utf16_to_char(text: &str, units: u32) -> usize {
    let mut seen = 0u32;
    for (index, c) in text.chars().enumerate() {
        if seen >= units {
            return index;
        }
        seen += c.len_utf16() as u32;
    }
    text.chars().count()
}

/// UTF-16 offset of char index `chars`, clamped to the text
pub fn char_to_utf16(text: &str, chars: usize) -> u32 {
    text.chars()
        .take(chars)
        .map(|c| c.len_utf16() as u32)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_offsets_are_identical() {
        assert_eq!(utf16_to_char("hello", 3), 3);
        assert_eq!(char_to_utf16("hello", 3), 3);
    }

    #[test]
    fn test_astral_chars_take_two_units() {
        let text = "a😀b";
        assert_eq!(char_to_utf16(text, 2), 3);
        assert_eq!(utf16_to_char(text, 3), 2);
        assert_eq!(utf16_to_char(text, 4), 3);
    }

    #[test]
    fn test_offsets_clamp_to_text() {
        assert_eq!(utf16_to_char("abc", 10), 3);
        assert_eq!(char_to_utf16("abc", 10), 3);
        assert_eq!(utf16_to_char("", 0), 0);
    }
}
