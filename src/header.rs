//! Header block: the fixed leading fields of every message.

use crate::codec::{Diagnostic, Diagnostics};
use crate::format::{extract_chars, format_value};
use crate::schema::HeaderLayout;
use crate::value::Record;

/// Width of the header: declared total when positive, else the sum of field lengths.
pub fn header_length(layout: &HeaderLayout) -> usize {
    layout.length()
}

/// Decode the header fields from the start of `raw`.
pub fn decode_header(layout: &HeaderLayout, raw: &str) -> Record {
    let chars: Vec<char> = raw.chars().collect();
    decode_header_chars(layout, &chars, &mut Diagnostics::default())
}

/// Encode `data` into the header block. Missing fields are blank.
pub fn encode_header(layout: &HeaderLayout, data: &Record) -> String {
    let mut out = String::new();
    encode_header_into(layout, data, &mut out, &mut Diagnostics::default());
    out
}

pub(crate) fn decode_header_chars(
    layout: &HeaderLayout,
    raw: &[char],
    diags: &mut Diagnostics,
) -> Record {
    report_length_mismatch(layout, diags);
    let header = &raw[..header_length(layout).min(raw.len())];
    let mut out = Record::new();
    let mut pos = 0;
    for f in &layout.fields {
        out.insert(f.name.clone(), extract_chars(header, pos, f.length));
        pos += f.length;
    }
    out
}

pub(crate) fn encode_header_into(
    layout: &HeaderLayout,
    data: &Record,
    out: &mut String,
    diags: &mut Diagnostics,
) {
    report_length_mismatch(layout, diags);
    for f in &layout.fields {
        if !f.kind.is_recognized() {
            diags.push(Diagnostic::UnrecognizedFieldKind {
                field: f.name.clone(),
                kind: f.kind.to_string(),
            });
        }
        let value = data.text(&f.name).unwrap_or("");
        out.push_str(&format_value(value, f.length, &f.kind));
    }
}

fn report_length_mismatch(layout: &HeaderLayout, diags: &mut Diagnostics) {
    if let Some((declared, computed)) = layout.length_mismatch() {
        diags.push(Diagnostic::LengthMismatch {
            scope: "header".to_string(),
            declared,
            computed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;

    fn layout() -> HeaderLayout {
        HeaderLayout::new(vec![
            FieldDef::alpha("SERVICIO", 4),
            FieldDef::numeric("LONGITUD", 5),
            FieldDef::alpha("CANAL", 3),
        ])
    }

    #[test]
    fn decode_walks_fields_in_order() {
        let h = decode_header(&layout(), "1004 0042WEBtrailing body");
        assert_eq!(h.text("SERVICIO"), Some("1004"));
        assert_eq!(h.text("LONGITUD"), Some("0042"));
        assert_eq!(h.text("CANAL"), Some("WEB"));
        assert_eq!(h.keys().collect::<Vec<_>>(), vec!["SERVICIO", "LONGITUD", "CANAL"]);
    }

    #[test]
    fn encode_formats_by_kind_and_blanks_missing() {
        let data = Record::new().with("SERVICIO", "1004").with("LONGITUD", "42");
        assert_eq!(encode_header(&layout(), &data), "100400042   ");
    }

    #[test]
    fn declared_total_bounds_decode_and_mismatch_is_reported() {
        let layout = layout().with_total_length(9);
        let chars: Vec<char> = "1004 0042WEB".chars().collect();
        let mut diags = Diagnostics::default();
        let h = decode_header_chars(&layout, &chars, &mut diags);
        assert_eq!(h.text("CANAL"), Some(""));
        assert_eq!(
            diags.into_vec(),
            vec![Diagnostic::LengthMismatch {
                scope: "header".to_string(),
                declared: 9,
                computed: 12
            }]
        );
    }

    #[test]
    fn encode_reports_computed_width() {
        let layout = layout().with_total_length(20);
        assert_eq!(encode_header(&layout, &Record::new()).len(), 12);
    }
}
