//! Whole-message handling: pick the section from the header, decode, and a cheap
//! pre-flight check of a raw return string before it is decoded.

use crate::codec::{Codec, CodecError, Diagnostic};
use crate::config::SectionRules;
use crate::format::parse_count;
use crate::header::decode_header;
use crate::schema::Schema;
use crate::value::Record;
use tracing::debug;

/// Smallest raw message worth inspecting.
pub const MIN_FRAME_LEN: usize = 20;
/// Status code plus record count at the start of the body.
pub const MIN_BODY_LEN: usize = 4;
/// Lower bound on the width of one record when sizing a frame.
pub const MIN_RECORD_LEN: usize = 10;

/// Result of decoding a message whose section was inferred from its header.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub section: String,
    pub header: Record,
    pub body: Record,
    pub diagnostics: Vec<Diagnostic>,
}

/// Section a header belongs to: a failing return code or the response marker selects the
/// response section, anything else the request section.
pub fn detect_section<'r>(rules: &'r SectionRules, header: &Record) -> &'r str {
    let return_code = header.text(&rules.return_code_field).unwrap_or("");
    if !return_code.is_empty() && return_code != rules.success_code {
        return &rules.response;
    }
    if header.text(&rules.message_type_field) == Some(rules.response_marker.as_str()) {
        return &rules.response;
    }
    &rules.request
}

/// Decode `raw`, choosing the section with [`detect_section`].
pub fn decode_frame(codec: &Codec, raw: &str) -> Result<DecodedFrame, CodecError> {
    let header = decode_header(&codec.schema().header, raw);
    let section = detect_section(&codec.config().sections, &header).to_string();
    debug!(section = %section, "detected section");
    let outcome = codec.decode_with_diagnostics(&section, raw)?;
    Ok(DecodedFrame {
        section,
        header: outcome.value.header,
        body: outcome.value.body,
        diagnostics: outcome.diagnostics,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameCheckError {
    #[error("message is empty")]
    Empty,
    #[error("message too short ({len} characters, at least {min} expected)")]
    TooShort { len: usize, min: usize },
    #[error("header incomplete: {header} characters required, {len} present")]
    HeaderIncomplete { header: usize, len: usize },
    #[error("no body after the header")]
    BodyMissing,
    #[error("body too short: at least {min} characters expected")]
    BodyTooShort { min: usize },
    #[error("status code {0:?} is not a 2-digit number")]
    InvalidStatusCode(String),
    #[error("record count {0:?} is not numeric")]
    InvalidRecordCount(String),
    #[error("{len} characters cannot hold {count} records")]
    IncompleteData { len: usize, count: usize },
}

/// Structural sanity check of a raw return string. Checks run in order and the first
/// failure is returned.
pub fn check_frame(schema: &Schema, raw: &str) -> Result<(), FrameCheckError> {
    let chars: Vec<char> = raw.chars().collect();
    let len = chars.len();
    if raw.trim().is_empty() {
        return Err(FrameCheckError::Empty);
    }
    if len < MIN_FRAME_LEN {
        return Err(FrameCheckError::TooShort {
            len,
            min: MIN_FRAME_LEN,
        });
    }
    let header = schema.header_length();
    if len < header {
        return Err(FrameCheckError::HeaderIncomplete { header, len });
    }
    if len == header {
        return Err(FrameCheckError::BodyMissing);
    }
    if len < header + MIN_BODY_LEN {
        return Err(FrameCheckError::BodyTooShort { min: MIN_BODY_LEN });
    }
    let status: String = chars[header..header + 2].iter().collect();
    if !status.chars().all(|c| c.is_ascii_digit()) {
        return Err(FrameCheckError::InvalidStatusCode(status));
    }
    let count_text: String = chars[header + 2..header + 4].iter().collect();
    if !count_text.trim_start().starts_with(|c: char| c.is_ascii_digit()) {
        return Err(FrameCheckError::InvalidRecordCount(count_text));
    }
    let count = parse_count(&count_text);
    if len < header + MIN_BODY_LEN + count * MIN_RECORD_LEN {
        return Err(FrameCheckError::IncompleteData { len, count });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, HeaderLayout};

    fn schema() -> Schema {
        Schema::new(HeaderLayout::new(vec![
            FieldDef::alpha("SERVICIO", 10),
            FieldDef::alpha("TIPO-MENSAJE", 4),
            FieldDef::numeric("CODIGO-RETORNO", 2),
        ]))
    }

    #[test]
    fn section_follows_return_code_then_marker() {
        let rules = SectionRules::default();
        let h = |tipo: &str, code: &str| {
            Record::new()
                .with("TIPO-MENSAJE", tipo)
                .with("CODIGO-RETORNO", code)
        };
        assert_eq!(detect_section(&rules, &h("REQ", "00")), "request");
        assert_eq!(detect_section(&rules, &h("REQ", "")), "request");
        assert_eq!(detect_section(&rules, &h("REQ", "05")), "response");
        assert_eq!(detect_section(&rules, &h("RESP", "00")), "response");
        assert_eq!(detect_section(&rules, &Record::new()), "request");
    }

    #[test]
    fn check_frame_reports_first_failure() {
        let s = schema();
        let header = format!("{:<10}RESP00", "SRV");
        assert_eq!(check_frame(&s, "   "), Err(FrameCheckError::Empty));
        assert!(matches!(
            check_frame(&s, "SHORT"),
            Err(FrameCheckError::TooShort { len: 5, .. })
        ));
        assert!(matches!(
            check_frame(&s, &header),
            Err(FrameCheckError::TooShort { len: 16, .. })
        ));
        let wide = Schema::new(HeaderLayout::default().with_total_length(30));
        assert_eq!(
            check_frame(&wide, &"x".repeat(25)),
            Err(FrameCheckError::HeaderIncomplete { header: 30, len: 25 })
        );
        assert_eq!(check_frame(&wide, &"x".repeat(30)), Err(FrameCheckError::BodyMissing));
        assert_eq!(
            check_frame(&wide, &"x".repeat(32)),
            Err(FrameCheckError::BodyTooShort { min: MIN_BODY_LEN })
        );
        assert_eq!(
            check_frame(&s, &format!("{}OK01", header)),
            Err(FrameCheckError::InvalidStatusCode("OK".to_string()))
        );
        assert_eq!(
            check_frame(&s, &format!("{}00AB", header)),
            Err(FrameCheckError::InvalidRecordCount("AB".to_string()))
        );
        assert_eq!(
            check_frame(&s, &format!("{}0002{}", header, "x".repeat(19))),
            Err(FrameCheckError::IncompleteData { len: 39, count: 2 })
        );
        assert_eq!(check_frame(&s, &format!("{}0002{}", header, "x".repeat(20))), Ok(()));
    }
}
