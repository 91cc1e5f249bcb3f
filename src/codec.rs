//! Encode/decode fixed-width MQ messages from a [`Schema`].
//!
//! Handles the header block, section bodies, repeating groups (nested to any depth) whose
//! count comes from a counter field or the schema, and best-effort recovery of short or
//! inconsistent input. Only a missing section and a zero count followed by data are fatal;
//! everything else is recorded as a [`Diagnostic`].

use crate::config::CodecConfig;
use crate::dump::record_summary_line;
use crate::format::{extract_chars, format_value};
use crate::header::{decode_header_chars, encode_header_into};
use crate::occurrence::{
    blank_child, counter_field, effective_count, find_occurrence_data, reconcile,
    trailing_fields_length,
};
use crate::schema::{ElementDef, OccurrenceDef, Schema, SectionLayout};
use crate::value::Record;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Schema missing: {0}")]
    SchemaMissing(String),
    #[error(
        "Occurrence count violation: {id} has a count of 0 but {remaining} characters of data follow (tolerance {slack})"
    )]
    OccurrenceCountViolation {
        id: String,
        remaining: usize,
        slack: usize,
    },
}

/// Non-fatal condition found while decoding or encoding. The call still returns a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Diagnostic {
    #[error("{scope}: declared length {declared} differs from computed length {computed}")]
    LengthMismatch {
        scope: String,
        declared: usize,
        computed: usize,
    },
    #[error("field {field}: unrecognized kind {kind}, formatted as alphanumeric")]
    UnrecognizedFieldKind { field: String, kind: String },
    #[error("occurrence {id}: {expected} children expected but input holds only {available}; the rest are blank")]
    OccurrenceShortfall {
        id: String,
        expected: usize,
        available: usize,
    },
    #[error("occurrence {id}: {supplied} children supplied, only {declared} fit")]
    OccurrenceOverflow {
        id: String,
        supplied: usize,
        declared: usize,
    },
    #[error("occurrence {id}: not the first group of its scope, skipped")]
    SkippedOccurrence { id: String },
    #[error("occurrence {id}: counter asks for {requested} children, capped at {max}")]
    OccurrenceCapped {
        id: String,
        requested: usize,
        max: usize,
    },
}

/// Collects diagnostics for one call; each distinct diagnostic is kept and logged once.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub(crate) fn push(&mut self, d: Diagnostic) {
        if !self.0.contains(&d) {
            warn!("{}", d);
            self.0.push(d);
        }
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

/// A result together with the non-fatal diagnostics produced along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

/// Header and body of one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub header: Record,
    #[serde(default, alias = "data")]
    pub body: Record,
}

impl Message {
    pub fn new(header: Record, body: Record) -> Self {
        Message { header, body }
    }
}

/// Codec bound to one schema. Cheap to share: every call works on its own cursor and output.
#[derive(Debug, Clone)]
pub struct Codec {
    schema: Schema,
    config: CodecConfig,
}

impl Codec {
    pub fn new(schema: Schema) -> Self {
        Self::with_config(schema, CodecConfig::default())
    }

    pub fn with_config(schema: Schema, config: CodecConfig) -> Self {
        Codec { schema, config }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn engine(&self) -> Engine<'_> {
        Engine {
            schema: &self.schema,
            config: &self.config,
        }
    }

    /// Decode a whole message (header + body of `section`).
    pub fn decode(&self, section: &str, raw: &str) -> Result<Message, CodecError> {
        self.decode_with_diagnostics(section, raw).map(|o| o.value)
    }

    pub fn decode_with_diagnostics(
        &self,
        section: &str,
        raw: &str,
    ) -> Result<Outcome<Message>, CodecError> {
        self.engine().decode(section, raw)
    }

    /// Decode body text only (no header).
    pub fn decode_body(&self, section: &str, body: &str) -> Result<Record, CodecError> {
        self.decode_body_with_diagnostics(section, body).map(|o| o.value)
    }

    pub fn decode_body_with_diagnostics(
        &self,
        section: &str,
        body: &str,
    ) -> Result<Outcome<Record>, CodecError> {
        self.engine().decode_body(section, body)
    }

    /// Encode a whole message. Missing fields are written blank.
    pub fn encode(&self, section: &str, message: &Message) -> Result<String, CodecError> {
        self.encode_with_diagnostics(section, message).map(|o| o.value)
    }

    pub fn encode_with_diagnostics(
        &self,
        section: &str,
        message: &Message,
    ) -> Result<Outcome<String>, CodecError> {
        self.engine().encode(section, message)
    }

    /// Encode body only (no header).
    pub fn encode_body(&self, section: &str, record: &Record) -> Result<String, CodecError> {
        self.encode_body_with_diagnostics(section, record).map(|o| o.value)
    }

    pub fn encode_body_with_diagnostics(
        &self,
        section: &str,
        record: &Record,
    ) -> Result<Outcome<String>, CodecError> {
        self.engine().encode_body(section, record)
    }
}

/// Decode with the default configuration.
pub fn decode(schema: &Schema, section: &str, raw: &str) -> Result<Message, CodecError> {
    let config = CodecConfig::default();
    Engine { schema, config: &config }
        .decode(section, raw)
        .map(|o| o.value)
}

/// Encode with the default configuration.
pub fn encode(schema: &Schema, section: &str, message: &Message) -> Result<String, CodecError> {
    let config = CodecConfig::default();
    Engine { schema, config: &config }
        .encode(section, message)
        .map(|o| o.value)
}

struct Engine<'a> {
    schema: &'a Schema,
    config: &'a CodecConfig,
}

impl<'a> Engine<'a> {
    fn section(&self, name: &str) -> Result<&'a SectionLayout, CodecError> {
        self.schema
            .section(name)
            .ok_or_else(|| CodecError::SchemaMissing(format!("section {:?}", name)))
    }

    fn decode(&self, section: &str, raw: &str) -> Result<Outcome<Message>, CodecError> {
        let layout = self.section(section)?;
        let chars: Vec<char> = raw.chars().collect();
        let header_len = self.schema.header_length().min(chars.len());
        debug!(section, len = chars.len(), header_len, "decoding message");
        let mut diags = Diagnostics::default();
        let header = decode_header_chars(&self.schema.header, &chars, &mut diags);
        let body = self.decode_section(section, layout, &chars[header_len..], &mut diags)?;
        Ok(Outcome {
            value: Message { header, body },
            diagnostics: diags.into_vec(),
        })
    }

    fn decode_body(&self, section: &str, body: &str) -> Result<Outcome<Record>, CodecError> {
        let layout = self.section(section)?;
        let chars: Vec<char> = body.chars().collect();
        let mut diags = Diagnostics::default();
        let value = self.decode_section(section, layout, &chars, &mut diags)?;
        Ok(Outcome {
            value,
            diagnostics: diags.into_vec(),
        })
    }

    fn decode_section(
        &self,
        name: &str,
        layout: &SectionLayout,
        body: &[char],
        diags: &mut Diagnostics,
    ) -> Result<Record, CodecError> {
        report_section_mismatch(name, layout, diags);
        let mut decoder = Decoder {
            config: self.config,
            body,
            diags,
        };
        let (record, end) = decoder.decode_scope(&layout.elements, 0, body.len(), None)?;
        debug!(
            section = name,
            consumed = end,
            len = body.len(),
            summary = %record_summary_line(&record),
            "decoded body"
        );
        Ok(record)
    }

    fn encode(&self, section: &str, message: &Message) -> Result<Outcome<String>, CodecError> {
        let layout = self.section(section)?;
        let mut diags = Diagnostics::default();
        let mut out = String::new();
        encode_header_into(&self.schema.header, &message.header, &mut out, &mut diags);
        self.encode_section(section, layout, &message.body, &mut out, &mut diags);
        debug!(section, len = out.chars().count(), "encoded message");
        Ok(Outcome {
            value: out,
            diagnostics: diags.into_vec(),
        })
    }

    fn encode_body(&self, section: &str, record: &Record) -> Result<Outcome<String>, CodecError> {
        let layout = self.section(section)?;
        let mut diags = Diagnostics::default();
        let mut out = String::new();
        self.encode_section(section, layout, record, &mut out, &mut diags);
        Ok(Outcome {
            value: out,
            diagnostics: diags.into_vec(),
        })
    }

    fn encode_section(
        &self,
        name: &str,
        layout: &SectionLayout,
        record: &Record,
        out: &mut String,
        diags: &mut Diagnostics,
    ) {
        report_section_mismatch(name, layout, diags);
        let mut encoder = Encoder {
            config: self.config,
            out,
            diags,
        };
        encoder.encode_scope(&layout.elements, Some(record));
    }
}

fn report_section_mismatch(name: &str, layout: &SectionLayout, diags: &mut Diagnostics) {
    if let Some((declared, computed)) = layout.length_mismatch() {
        diags.push(Diagnostic::LengthMismatch {
            scope: format!("section {}", name),
            declared,
            computed,
        });
    }
}

/// Recursive-descent body reader. Positions are character offsets into `body`; each step
/// returns the position after what it consumed.
struct Decoder<'a, 'd> {
    config: &'a CodecConfig,
    body: &'a [char],
    diags: &'d mut Diagnostics,
}

impl Decoder<'_, '_> {
    /// Decode one scope starting at `start`. `limit` bounds the bytes this scope may claim
    /// (the body for a section, the enclosing child block for nested groups).
    fn decode_scope(
        &mut self,
        elements: &[ElementDef],
        start: usize,
        limit: usize,
        index: Option<usize>,
    ) -> Result<(Record, usize), CodecError> {
        let mut record = index.map(Record::child).unwrap_or_default();
        let mut pos = start;
        let mut counter: Option<String> = None;
        let mut seen_occurrence = false;
        for element in elements {
            match element {
                ElementDef::Field(f) => {
                    if f.length == 0 {
                        continue;
                    }
                    let value = extract_chars(self.body, pos, f.length);
                    if !seen_occurrence && self.config.counter.matches(&f.name) {
                        trace!(field = %f.name, value = %value, "counter field");
                        counter = Some(value.clone());
                    }
                    record.insert(f.name.clone(), value);
                    pos += f.length;
                }
                ElementDef::Occurrence(o) if seen_occurrence => {
                    self.diags
                        .push(Diagnostic::SkippedOccurrence { id: o.id.clone() });
                }
                ElementDef::Occurrence(o) => {
                    seen_occurrence = true;
                    let effective = effective_count(counter.as_deref(), o);
                    let trailing = trailing_fields_length(elements);
                    let (children, next) = self.decode_occurrence(o, effective, pos, limit, trailing)?;
                    record.insert(o.id.clone(), children);
                    pos = next;
                }
            }
        }
        Ok((record, pos))
    }

    fn decode_occurrence(
        &mut self,
        occ: &OccurrenceDef,
        effective: usize,
        start: usize,
        limit: usize,
        trailing: usize,
    ) -> Result<(Vec<Record>, usize), CodecError> {
        let end = limit.min(self.body.len());
        let block = occ.child_block_length();
        trace!(id = %occ.id, effective, block, start, end, "decoding occurrence");

        if effective == 0 {
            let excess_from = start.saturating_add(trailing).min(end);
            let remaining = significant_len(&self.body[excess_from..end]);
            if remaining > self.config.zero_count_slack {
                return Err(CodecError::OccurrenceCountViolation {
                    id: occ.id.clone(),
                    remaining,
                    slack: self.config.zero_count_slack,
                });
            }
            return Ok((Vec::new(), start));
        }

        let effective = if effective > self.config.max_occurrences {
            self.diags.push(Diagnostic::OccurrenceCapped {
                id: occ.id.clone(),
                requested: effective,
                max: self.config.max_occurrences,
            });
            self.config.max_occurrences
        } else {
            effective
        };

        let available = end.saturating_sub(start);
        let supportable = if block == 0 { effective } else { available / block };
        if available < effective.saturating_mul(block) {
            self.diags.push(Diagnostic::OccurrenceShortfall {
                id: occ.id.clone(),
                expected: effective,
                available: supportable,
            });
        }

        let mut children = Vec::with_capacity(effective.min(supportable.saturating_add(1)));
        let mut pos = start;
        for i in 1..=effective {
            if block > 0 && pos >= end {
                children.push(blank_child(&occ.elements, Some(i), &self.config.counter));
                continue;
            }
            let child_limit = pos.saturating_add(block).min(end);
            let (child, _) = self.decode_scope(&occ.elements, pos, child_limit, Some(i))?;
            children.push(child);
            pos = pos.saturating_add(block);
        }
        Ok((
            reconcile(children, effective, occ, &self.config.counter),
            pos,
        ))
    }
}

/// Length of `chars` without trailing whitespace.
fn significant_len(chars: &[char]) -> usize {
    chars
        .iter()
        .rposition(|c| !c.is_whitespace())
        .map_or(0, |i| i + 1)
}

/// Body writer: mirrors [`Decoder`] over a caller record.
struct Encoder<'a, 'o> {
    config: &'a CodecConfig,
    out: &'o mut String,
    diags: &'o mut Diagnostics,
}

impl Encoder<'_, '_> {
    /// Encode one scope. `data` is `None` for padding children, which are written fully
    /// blank (counter fields included).
    fn encode_scope(&mut self, elements: &[ElementDef], data: Option<&Record>) {
        let counter = data.and_then(|d| {
            let (field, occ) = counter_field(elements, &self.config.counter)?;
            let supplied = find_occurrence_data(d, occ, &self.config.occurrence_key_tokens).len();
            let count = supplied.min(occ.declared_count);
            trace!(field = %field.name, count, "recomputed counter");
            Some((field.name.as_str(), count.to_string()))
        });

        for element in elements {
            match element {
                ElementDef::Field(f) => {
                    if f.length == 0 {
                        continue;
                    }
                    if !f.kind.is_recognized() {
                        self.diags.push(Diagnostic::UnrecognizedFieldKind {
                            field: f.name.clone(),
                            kind: f.kind.to_string(),
                        });
                    }
                    let value = match &counter {
                        Some((name, count)) if *name == f.name => count.as_str(),
                        _ => data.and_then(|d| d.text(&f.name)).unwrap_or(""),
                    };
                    self.out.push_str(&format_value(value, f.length, &f.kind));
                }
                ElementDef::Occurrence(o) => {
                    let children = data
                        .map(|d| find_occurrence_data(d, o, &self.config.occurrence_key_tokens))
                        .unwrap_or(&[]);
                    if children.len() > o.declared_count {
                        self.diags.push(Diagnostic::OccurrenceOverflow {
                            id: o.id.clone(),
                            supplied: children.len(),
                            declared: o.declared_count,
                        });
                    }
                    for i in 0..o.declared_count {
                        self.encode_scope(&o.elements, children.get(i));
                    }
                }
            }
        }
    }
}
