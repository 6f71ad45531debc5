//! Recovering patch names.
//!
//! Names are salvage data. Recovery never fails: whatever cannot be found is
//! replaced with a placeholder so positions stay correct.

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;

use crate::anomaly::{Anomaly, DecodeReport};
use crate::io::source::Source;
use crate::patch::PatchRecord;
use crate::slot::SlotCode;
use crate::text::{clean_name, decode_lossy, decode_single_byte, truncate_chars};
use crate::PATCH_COUNT;

/// Bytes searched for the terminator of a container name.
pub const NAME_WINDOW: usize = 32;

/// Width of a container name with no terminator.
pub const FIXED_NAME_LENGTH: usize = 16;

/// Longest name taken from a listing. Longer matches have usually run into
/// the next name.
pub const LISTING_NAME_LENGTH_MAX: usize = 30;

lazy_static! {
    static ref BRACKETED: Regex = Regex::new(r"\[(.*?)\]").unwrap();
    static ref SLOT_NAME: Regex = Regex::new(r"([AB][1-8][1-8])\s+([ -~]+)").unwrap();
}

/// Take a name from the start of a container entry.
///
/// The name ends at a zero byte within the window. Without one the name is a
/// fixed width field. Returns the name and the number of bytes it used.
pub fn container_name(window: &[u8]) -> (String, usize) {
    let window = &window[..window.len().min(NAME_WINDOW)];
    match window.iter().position(|byte| *byte == 0) {
        Some(end) => (decode_lossy(&window[..end]), end + 1),
        None => {
            let length = window.len().min(FIXED_NAME_LENGTH);
            trace!("No name terminator, using {length} bytes");
            let name = decode_lossy(&window[..length]);
            (name.trim_end().to_owned(), length)
        }
    }
}

/// All bracketed hex runs of a listing joined into one blob.
pub fn listing_bytes(source: &Source, report: &mut DecodeReport) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (line_number, line) in source.lines() {
        let Some(captures) = BRACKETED.captures(&line) else {
            continue;
        };
        // Digits are paired after removing all whitespace, so a stray single
        // digit shifts the rest of the line by one nibble.
        let digits: Vec<char> = captures[1].chars().filter(|c| !c.is_whitespace()).collect();
        for pair in digits.chunks(2) {
            let token: String = pair.iter().collect();
            match parse_hex_token(&token) {
                Some(byte) => bytes.push(byte),
                None => report.push(Anomaly::InvalidTokenSkip {
                    line: line_number,
                    token,
                }),
            }
        }
    }
    debug!("Listing holds {} bytes", bytes.len());
    bytes
}

/// Find `<slot> <name>` runs anywhere in the text. When a slot matches more
/// than once the first match is used.
pub fn find_names(text: &str) -> HashMap<SlotCode, String> {
    let mut names = HashMap::new();
    for captures in SLOT_NAME.captures_iter(text) {
        let Ok(slot) = captures[1].parse::<SlotCode>() else {
            continue;
        };
        let full_name = format!("{} {}", &captures[1], &captures[2]);
        let name = truncate_chars(full_name.trim(), LISTING_NAME_LENGTH_MAX).to_owned();
        if let Some(first) = names.get(&slot) {
            debug!("Ignoring {name:?}, already have {first:?}");
        } else {
            names.insert(slot, name);
        }
    }
    names
}

/// One name per slot in dump order. Slots without a name get a placeholder.
pub fn reconcile(found: &HashMap<SlotCode, String>, report: &mut DecodeReport) -> Vec<String> {
    SlotCode::all()
        .map(|slot| match found.get(&slot) {
            Some(name) => name.clone(),
            None => {
                report.push(Anomaly::NameRecoveryMiss { slot });
                slot.placeholder_name()
            }
        })
        .collect()
}

/// Recover all 128 names from an annotated listing.
pub fn recover_listing_names(source: &Source, report: &mut DecodeReport) -> Vec<String> {
    let bytes = listing_bytes(source, report);
    let found = find_names(&decode_single_byte(&bytes));
    debug!("Found {} of {PATCH_COUNT} names", found.len());
    reconcile(&found, report)
}

/// Give records the names of the same slot.
pub fn apply_names(records: &mut [PatchRecord], names: &[String]) {
    for (record, name) in records.iter_mut().zip(names) {
        record.name = clean_name(name);
    }
}

/// A two character hexadecimal byte.
pub(crate) fn parse_hex_token(token: &str) -> Option<u8> {
    if token.len() == 2 && token.chars().all(|c| c.is_ascii_hexdigit()) {
        u8::from_str_radix(token, 16).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn hex(text: &str) -> String {
        text.bytes()
            .map(|byte| format!("{byte:02x}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn terminated_container_name() {
        assert_eq!(container_name(b"A11\x00\x01\x02"), ("A11".to_owned(), 4));
        assert_eq!(container_name(b"\x00rest"), (String::new(), 1));
    }

    #[test]
    fn fixed_container_name() {
        let window = b"A11 Brass 1     XXXXXXXXXXXXXXXXXXXXXXXX";
        assert_eq!(
            container_name(window),
            ("A11 Brass 1".to_owned(), FIXED_NAME_LENGTH)
        );
    }

    #[test]
    fn terminator_outside_window() {
        let mut window = vec![b'x'; NAME_WINDOW];
        window.push(0);
        let (name, used) = container_name(&window);
        assert_eq!(used, FIXED_NAME_LENGTH);
        assert_eq!(name.len(), FIXED_NAME_LENGTH);
    }

    #[test]
    fn names_in_text() {
        let names = find_names("\x01\x02A11 Brass 1\x00\x00B88 Last\x00junk");
        assert_eq!(names.len(), 2);
        assert_eq!(names[&"A11".parse().unwrap()], "A11 Brass 1");
        assert_eq!(names[&"B88".parse().unwrap()], "B88 Last");
    }

    #[test]
    fn first_match_wins() {
        let names = find_names("A11 First\x00A11 Second\x00");
        assert_eq!(names[&"A11".parse().unwrap()], "A11 First");
    }

    #[test]
    fn long_match_truncated() {
        let names = find_names("A12 Strings and more strings and even more\x00");
        let name = &names[&"A12".parse().unwrap()];
        assert_eq!(name.len(), LISTING_NAME_LENGTH_MAX);
        assert!(name.starts_with("A12 Strings"));
    }

    #[test]
    fn reconcile_fills_placeholders() {
        let mut found = HashMap::new();
        found.insert("A12".parse().unwrap(), "A12 Strings".to_owned());
        let mut report = DecodeReport::default();
        let names = reconcile(&found, &mut report);
        assert_eq!(names.len(), PATCH_COUNT);
        assert_eq!(names[0], "A11 Unknown");
        assert_eq!(names[1], "A12 Strings");
        assert_eq!(names[127], "B88 Unknown");
        assert_eq!(report.name_miss_count(), PATCH_COUNT - 1);
    }

    #[test]
    fn listing() {
        let text = format!(
            "Library dump\n3: 3: [{}]\n4: Set 1 [{} zz]\nno brackets 41 31 31\n",
            hex("A11 Brass 1\0"),
            hex("B27 Organ\0")
        );
        let source = Source::new(text.into_bytes(), None);
        let mut report = DecodeReport::default();
        let names = recover_listing_names(&source, &mut report);
        assert_eq!(names.len(), PATCH_COUNT);
        assert_eq!(names[0], "A11 Brass 1");
        assert_eq!(names[64 + 8 + 6], "B27 Organ");
        assert_eq!(report.skipped_token_count(), 1);
        assert_eq!(report.name_miss_count(), PATCH_COUNT - 2);
    }

    #[test]
    fn listing_digits_paired_across_tokens() {
        let source = Source::new(b"1: [41 3 31 31]\n".to_vec(), None);
        let mut report = DecodeReport::default();
        assert_eq!(listing_bytes(&source, &mut report), vec![0x41, 0x33, 0x13]);
        assert_eq!(report.skipped_token_count(), 1);
    }

    #[test]
    fn apply() {
        let mut records = vec![PatchRecord::placeholder("x"), PatchRecord::placeholder("y")];
        apply_names(&mut records, &["A11 Brass ".to_owned()]);
        assert_eq!(records[0].name, "A11 Brass");
        assert_eq!(records[1].name, "y");
    }

    #[test]
    fn hex_token() {
        assert_eq!(parse_hex_token("7F"), Some(0x7f));
        assert_eq!(parse_hex_token("0a"), Some(0x0a));
        assert_eq!(parse_hex_token("+1"), None);
        assert_eq!(parse_hex_token("1"), None);
        assert_eq!(parse_hex_token("100"), None);
        assert_eq!(parse_hex_token("g0"), None);
    }
}
