//! Fixed-width text formatting of field values.
//!
//! Encoding is kind-aware (numeric left-pads with `0`, everything else right-pads with
//! spaces). Decoding is not: a decoded value is always the trimmed literal text.

use crate::schema::FieldKind;

/// Render `value` into exactly `length` characters.
///
/// Blank input yields `length` spaces whatever the kind; a numeric field left empty is sent
/// as spaces, not zeros.
pub fn format_value(value: &str, length: usize, kind: &FieldKind) -> String {
    if value.trim().is_empty() {
        return " ".repeat(length);
    }
    let truncated: String = value.chars().take(length).collect();
    let pad = length - truncated.chars().count();
    let mut out = String::with_capacity(length);
    if kind.is_numeric() {
        out.extend(std::iter::repeat('0').take(pad));
        out.push_str(&truncated);
    } else {
        out.push_str(&truncated);
        out.extend(std::iter::repeat(' ').take(pad));
    }
    out
}

/// Characters `[start, start + length)` of `raw`, trimmed. Out-of-range parts are empty.
pub fn extract(raw: &str, start: usize, length: usize) -> String {
    let slice: String = raw.chars().skip(start).take(length).collect();
    slice.trim().to_string()
}

/// Same as [`extract`] over a pre-split character buffer.
pub(crate) fn extract_chars(raw: &[char], start: usize, length: usize) -> String {
    let from = start.min(raw.len());
    let to = start.saturating_add(length).min(raw.len());
    let slice: String = raw[from..to].iter().collect();
    slice.trim().to_string()
}

/// Leading decimal digits of `text` (after trimming) as a count; anything else is 0.
/// A value too large for `usize` saturates instead of wrapping to zero.
pub fn parse_count(text: &str) -> usize {
    text.trim()
        .chars()
        .map_while(|c| c.to_digit(10))
        .fold(0usize, |n, d| n.saturating_mul(10).saturating_add(d as usize))
}
