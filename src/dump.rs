//! Human-readable text for decoded records (CLI output, logs).

use crate::value::{Record, Value};

/// Indented tree of `record`: one `name: "value"` line per field, `id [n]` per group and
/// `#index` per child. Fields keep their schema order.
pub fn dump_record(record: &Record) -> String {
    let mut lines = Vec::new();
    push_record(record, 0, &mut lines);
    lines.join("\n")
}

fn push_record(record: &Record, indent: usize, lines: &mut Vec<String>) {
    let pad = "  ".repeat(indent);
    for (name, value) in record.iter() {
        match value {
            Value::Text(s) => lines.push(format!("{}{}: {:?}", pad, name, s)),
            Value::Group(children) => {
                lines.push(format!("{}{} [{}]", pad, name, children.len()));
                for (i, child) in children.iter().enumerate() {
                    let index = child.index().unwrap_or(i + 1);
                    lines.push(format!("{}  #{}", pad, index));
                    push_record(child, indent + 2, lines);
                }
            }
        }
    }
}

/// One-line summary (for a log line or a list entry): the plain fields joined by spaces,
/// groups shown as `id[n]`.
pub fn record_summary_line(record: &Record) -> String {
    record
        .iter()
        .map(|(name, value)| match value {
            Value::Text(s) => format!("{}={}", name, s),
            Value::Group(children) => format!("{}[{}]", name, children.len()),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
