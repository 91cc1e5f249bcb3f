//! Post-decode cleanup of records: drop blank fields and padding children.
//!
//! Fixed-width responses are mostly padding. A blank or all-zero field carries no data, and
//! a group child with nothing else left is a reserved slot (the decoder fills those in on
//! short input too). The header is never cleaned.

use crate::codec::Message;
use crate::value::{Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanMode {
    /// Drop blank and all-zero fields everywhere, then children left empty, then groups
    /// left empty.
    #[default]
    Aggressive,
    /// Keep every field; only drop group children whose fields are all blank or zero, and
    /// groups left empty.
    OccurrencesOnly,
}

/// Blank (empty or whitespace) or made only of `0`s.
pub fn is_blank_value(value: &str) -> bool {
    value.trim().is_empty() || value.chars().all(|c| c == '0')
}

/// Cleaned copy of `record`. Surviving children keep their original `index`.
pub fn clean_record(record: &Record, mode: CleanMode) -> Record {
    let mut out = record.index().map(Record::child).unwrap_or_default();
    for (name, value) in record.iter() {
        match value {
            Value::Text(s) => {
                if mode == CleanMode::OccurrencesOnly || !is_blank_value(s) {
                    out.insert(name, s.as_str());
                }
            }
            Value::Group(children) => {
                let kept: Vec<Record> = children
                    .iter()
                    .map(|c| clean_record(c, mode))
                    .filter(has_content)
                    .collect();
                if !kept.is_empty() {
                    out.insert(name, kept);
                }
            }
        }
    }
    out
}

/// Clean the body of `message`; the header is copied as is.
pub fn clean_message(message: &Message, mode: CleanMode) -> Message {
    Message::new(message.header.clone(), clean_record(&message.body, mode))
}

fn has_content(record: &Record) -> bool {
    record.iter().any(|(_, v)| match v {
        Value::Text(s) => !is_blank_value(s),
        Value::Group(children) => !children.is_empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded() -> Record {
        Record::new()
            .with("ESTADO", "OK")
            .with("CANT-REG", "02")
            .with("IMPORTE", "0000")
            .with("OBS", "")
            .with(
                "occ_1",
                vec![
                    Record::child(1).with("F1", "ABC").with("F2", "0000"),
                    Record::child(2).with("F1", "").with("F2", "00"),
                    Record::child(3).with("F1", "DE").with("occ_1_1", Vec::<Record>::new()),
                ],
            )
            .with("occ_2", vec![Record::child(1).with("G", " ")])
    }

    #[test]
    fn blank_and_zero_values() {
        assert!(is_blank_value(""));
        assert!(is_blank_value("   "));
        assert!(is_blank_value("000"));
        assert!(!is_blank_value("0010"));
        assert!(!is_blank_value("A"));
    }

    #[test]
    fn aggressive_drops_blank_fields_children_and_groups() {
        let cleaned = clean_record(&decoded(), CleanMode::Aggressive);
        let expected = Record::new()
            .with("ESTADO", "OK")
            .with("CANT-REG", "02")
            .with(
                "occ_1",
                vec![Record::child(1).with("F1", "ABC"), Record::child(3).with("F1", "DE")],
            );
        assert_eq!(cleaned, expected);
    }

    #[test]
    fn occurrences_only_keeps_fields() {
        let cleaned = clean_record(&decoded(), CleanMode::OccurrencesOnly);
        assert_eq!(cleaned.text("IMPORTE"), Some("0000"));
        assert_eq!(cleaned.text("OBS"), Some(""));
        let children = cleaned.group("occ_1").expect("group");
        assert_eq!(children.len(), 2);
        assert_eq!(children[0], Record::child(1).with("F1", "ABC").with("F2", "0000"));
        assert_eq!(children[1].index(), Some(3));
        assert_eq!(children[1].group("occ_1_1"), None);
        assert_eq!(cleaned.group("occ_2"), None);
    }

    #[test]
    fn header_is_left_untouched() {
        let message = Message::new(
            Record::new().with("CODIGO-RETORNO", "00").with("CANAL", ""),
            decoded(),
        );
        let cleaned = clean_message(&message, CleanMode::default());
        assert_eq!(cleaned.header, message.header);
        assert_eq!(cleaned.body.text("IMPORTE"), None);
    }
}
