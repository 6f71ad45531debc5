//! Text helpers for names recovered from dumps.

/// Decode bytes with one character per byte. Every byte value maps to the
/// Unicode code point of the same value so offsets are preserved.
pub fn decode_single_byte(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| byte as char).collect()
}

/// Decode a name stored as UTF-8, dropping anything that is not valid.
pub fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// Remove control characters and surrounding whitespace.
pub fn clean_name(text: &str) -> String {
    let printable: String = text.chars().filter(|c| !c.is_control()).collect();
    printable.trim().to_owned()
}

/// Limit the text to a number of characters.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Escape text for use inside a C string literal.
pub fn escape_c_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            c if c.is_ascii() && !c.is_ascii_control() => escaped.push(c),
            c => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    escaped.push_str(&format!("\\x{byte:02X}\"\""));
                }
            }
        }
    }
    escaped
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_byte() {
        assert_eq!(decode_single_byte(b"A11 Brass"), "A11 Brass");
        let text = decode_single_byte(&[0x41, 0xe9, 0xff]);
        assert_eq!(text.chars().count(), 3);
        assert_eq!(text.chars().nth(1), Some('\u{e9}'));
    }

    #[test]
    fn lossy() {
        assert_eq!(decode_lossy(b"Str\xffings"), "Strings");
        assert_eq!(decode_lossy("Caf\u{e9}".as_bytes()), "Caf\u{e9}");
    }

    #[test]
    fn clean() {
        assert_eq!(clean_name("  A11 Brass\t\x01 "), "A11 Brass");
        assert_eq!(clean_name("\x00\x00"), "");
    }

    #[test]
    fn truncate() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        assert_eq!(truncate_chars("\u{e9}\u{e9}\u{e9}\u{e9}", 2), "\u{e9}\u{e9}");
    }

    #[test]
    fn escape() {
        assert_eq!(escape_c_string("A11 \"Brass\""), "A11 \\\"Brass\\\"");
        assert_eq!(escape_c_string("a\\b"), "a\\\\b");
        assert_eq!(escape_c_string("\u{e9}"), "\\xC3\"\"\\xA9\"\"");
    }
}
