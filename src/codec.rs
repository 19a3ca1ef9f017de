//! Rendering helpers shared by the console and the terminal front-end.
//!
//! Hex display is two uppercase digits per byte separated by single spaces.
//! Hex input is lenient: whitespace anywhere is ignored, and an odd number of
//! digits is left-padded with one `0`, so `"123"` means `01 23`.

use crate::error::ParseError;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt;

/// `[0x41, 0x0A]` → `"41 0A"`. Empty input gives an empty string.
pub fn bytes_to_hex_display(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse hex digits typed by the user into bytes.
///
/// Whitespace (spaces, tabs, CR, LF) is stripped first. Any other non-hex
/// character fails with [`ParseError::InvalidCharacter`]. An odd digit count
/// is left-padded with a single `0`.
pub fn hex_text_to_bytes(text: &str) -> Result<Vec<u8>, ParseError> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ParseError::InvalidCharacter(bad));
    }

    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits
    };
    hex::decode(padded).map_err(from_hex_error)
}

fn from_hex_error(err: hex::FromHexError) -> ParseError {
    match err {
        hex::FromHexError::InvalidHexCharacter { c, .. } => ParseError::InvalidCharacter(c),
        _ => ParseError::InvalidCharacter(char::REPLACEMENT_CHARACTER),
    }
}

/// Decode bytes as UTF-8, replacing invalid sequences with U+FFFD.
pub fn bytes_to_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Hex display or lossy text, depending on `hex`.
pub fn render_payload(bytes: &[u8], hex: bool) -> String {
    if hex {
        bytes_to_hex_display(bytes)
    } else {
        bytes_to_text(bytes)
    }
}

/// Check that chrono can render `pattern`.
pub fn validate_timestamp_format(pattern: &str) -> Result<(), ParseError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(ParseError::InvalidTimestampFormat(pattern.to_string()));
    }
    Ok(())
}

/// Render `now` with a strftime-style `pattern`, e.g. `[%H:%M:%S]`.
pub fn timestamp_prefix<Tz>(pattern: &str, now: &DateTime<Tz>) -> Result<String, ParseError>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(ParseError::InvalidTimestampFormat(pattern.to_string()));
    }
    Ok(now.format_with_items(items.iter()).to_string())
}

/// Pretty-print JSON with four-space indentation. Key order and non-ASCII
/// text are kept as typed.
pub fn format_json(text: &str) -> Result<String, ParseError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    String::from_utf8(out).map_err(|e| ParseError::InvalidJson(e.to_string()))
}
