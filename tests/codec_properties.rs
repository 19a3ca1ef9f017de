//! Property tests for the hex rendering helpers.

use proptest::prelude::*;
use serial_tool::codec::{bytes_to_hex_display, hex_text_to_bytes};
use serial_tool::error::ParseError;

proptest! {
    #[test]
    fn hex_display_parses_back(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let shown = bytes_to_hex_display(&bytes);
        prop_assert_eq!(hex_text_to_bytes(&shown).unwrap(), bytes);
    }

    #[test]
    fn hex_display_is_pairs_and_spaces(bytes in proptest::collection::vec(any::<u8>(), 1..256)) {
        let shown = bytes_to_hex_display(&bytes);
        prop_assert_eq!(shown.len(), bytes.len() * 3 - 1);
        prop_assert!(shown
            .split(' ')
            .all(|pair| pair.len() == 2 && pair.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())));
    }

    #[test]
    fn whitespace_is_ignored(digits in "([0-9a-fA-F]{2}){0,32}", gaps in "[ \t\r\n]{0,4}") {
        let spaced: String = digits
            .as_bytes()
            .chunks(2)
            .map(|pair| format!("{}{}", std::str::from_utf8(pair).unwrap(), gaps))
            .collect();
        prop_assert_eq!(hex_text_to_bytes(&spaced).unwrap(), hex_text_to_bytes(&digits).unwrap());
    }

    #[test]
    fn canonical_form_is_stable(text in "[0-9a-fA-F ]{0,64}") {
        let bytes = hex_text_to_bytes(&text).unwrap();
        let canonical = bytes_to_hex_display(&bytes);
        prop_assert_eq!(bytes_to_hex_display(&hex_text_to_bytes(&canonical).unwrap()), canonical);
    }

    #[test]
    fn non_hex_character_is_rejected(prefix in "[0-9a-f]{0,8}", bad in "[g-zG-Z]") {
        let text = format!("{prefix}{bad}");
        let expected = bad.chars().next().unwrap();
        prop_assert_eq!(hex_text_to_bytes(&text), Err(ParseError::InvalidCharacter(expected)));
    }
}

#[test]
fn odd_digit_count_is_left_padded() {
    assert_eq!(hex_text_to_bytes("1").unwrap(), vec![0x01]);
    assert_eq!(hex_text_to_bytes("123").unwrap(), vec![0x01, 0x23]);
    assert_eq!(hex_text_to_bytes("  \r\n").unwrap(), Vec::<u8>::new());
}

#[test]
fn non_hex_pair_names_first_bad_character() {
    assert_eq!(hex_text_to_bytes("GG"), Err(ParseError::InvalidCharacter('G')));
    assert_eq!(hex_text_to_bytes("41 4x"), Err(ParseError::InvalidCharacter('x')));
}
