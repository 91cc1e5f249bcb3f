//! Schema model for fixed-width MQ messages: header layout plus named sections.
//!
//! A [`Schema`] is built once per message type (from JSON emitted by the spreadsheet
//! ingestion tool, from the layout notation in [`crate::parser`], or by hand) and is never
//! mutated by the codec.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of a fixed-width field. Only affects encoding (padding direction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    /// Digits, zero-padded on the left.
    Numeric,
    /// Characters, space-padded on the right.
    Alphanumeric,
    /// Kind text the codec does not know (or no kind at all). Formats as alphanumeric.
    Unrecognized(String),
}

impl FieldKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Numeric)
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, FieldKind::Unrecognized(_))
    }
}

impl Default for FieldKind {
    fn default() -> Self {
        FieldKind::Unrecognized(String::new())
    }
}

impl From<&str> for FieldKind {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "numerico" | "numérico" | "numeric" | "num" | "n" | "9" => FieldKind::Numeric,
            "alfanumerico" | "alfanumérico" | "alphanumeric" | "alpha" | "a" | "x" => {
                FieldKind::Alphanumeric
            }
            _ => FieldKind::Unrecognized(s.trim().to_string()),
        }
    }
}

impl From<String> for FieldKind {
    fn from(s: String) -> Self {
        FieldKind::from(s.as_str())
    }
}

impl From<FieldKind> for String {
    fn from(k: FieldKind) -> Self {
        match k {
            FieldKind::Numeric => "numerico".to_string(),
            FieldKind::Alphanumeric => "alfanumerico".to_string(),
            FieldKind::Unrecognized(s) => s,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Numeric => f.write_str("numeric"),
            FieldKind::Alphanumeric => f.write_str("alphanumeric"),
            FieldKind::Unrecognized(s) if s.is_empty() => f.write_str("<missing>"),
            FieldKind::Unrecognized(s) => write!(f, "{:?}", s),
        }
    }
}

/// A single fixed-width field. `length == 0` fields never touch the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub length: usize,
    /// Section elements carry the kind under `fieldType`; header fields under `type`.
    #[serde(default, rename = "fieldType", alias = "type", alias = "kind")]
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, length: usize, kind: FieldKind) -> Self {
        FieldDef {
            name: name.into(),
            length,
            kind,
        }
    }

    pub fn numeric(name: impl Into<String>, length: usize) -> Self {
        Self::new(name, length, FieldKind::Numeric)
    }

    pub fn alpha(name: impl Into<String>, length: usize) -> Self {
        Self::new(name, length, FieldKind::Alphanumeric)
    }
}

/// A repeating group. `elements` may nest further occurrences to any depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceDef {
    pub id: String,
    /// Position of the group in the authored schema; used for the `occurrence_<index>` key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Schema-authored cardinality, used when no counter field is found.
    #[serde(rename = "count", default)]
    pub declared_count: usize,
    #[serde(rename = "fields", alias = "elements", default)]
    pub elements: Vec<ElementDef>,
}

impl OccurrenceDef {
    pub fn new(id: impl Into<String>, declared_count: usize, elements: Vec<ElementDef>) -> Self {
        OccurrenceDef {
            id: id.into(),
            index: None,
            declared_count,
            elements,
        }
    }

    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Width of one child block: field lengths plus, for nested groups, child width times
    /// their declared count.
    pub fn child_block_length(&self) -> usize {
        elements_length(&self.elements)
    }

    /// Key used by callers that address the group by position rather than by id.
    pub fn positional_key(&self) -> String {
        match self.positional_index() {
            Some(i) => format!("occurrence_{}", i),
            None => format!("occurrence_{}", self.id),
        }
    }

    fn positional_index(&self) -> Option<String> {
        if let Some(i) = self.index {
            return Some(i.to_string());
        }
        let tail = self.id.rsplit('_').next()?;
        (!tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit())).then(|| tail.to_string())
    }
}

/// One entry of a section (or occurrence) element list. List order is wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementDef {
    Field(FieldDef),
    Occurrence(OccurrenceDef),
}

impl ElementDef {
    pub fn name(&self) -> &str {
        match self {
            ElementDef::Field(f) => &f.name,
            ElementDef::Occurrence(o) => &o.id,
        }
    }

    /// Width this element occupies on the wire when every group is at its declared count.
    pub fn wire_length(&self) -> usize {
        match self {
            ElementDef::Field(f) => f.length,
            ElementDef::Occurrence(o) => o.child_block_length() * o.declared_count,
        }
    }
}

impl From<FieldDef> for ElementDef {
    fn from(f: FieldDef) -> Self {
        ElementDef::Field(f)
    }
}

impl From<OccurrenceDef> for ElementDef {
    fn from(o: OccurrenceDef) -> Self {
        ElementDef::Occurrence(o)
    }
}

/// Sum of [`ElementDef::wire_length`] over a list.
pub fn elements_length(elements: &[ElementDef]) -> usize {
    elements.iter().map(ElementDef::wire_length).sum()
}

/// The fixed leading block shared by every section of a message type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderLayout {
    #[serde(rename = "totalLength", default, skip_serializing_if = "Option::is_none")]
    pub total_length: Option<usize>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl HeaderLayout {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        HeaderLayout {
            total_length: None,
            fields,
        }
    }

    #[must_use]
    pub fn with_total_length(mut self, total: usize) -> Self {
        self.total_length = Some(total);
        self
    }

    /// Sum of the field lengths.
    pub fn computed_length(&self) -> usize {
        self.fields.iter().map(|f| f.length).sum()
    }

    /// Declared total when present and positive, else the computed sum.
    pub fn length(&self) -> usize {
        match self.total_length {
            Some(n) if n > 0 => n,
            _ => self.computed_length(),
        }
    }

    /// `(declared, computed)` when a positive declared total disagrees with the fields.
    pub fn length_mismatch(&self) -> Option<(usize, usize)> {
        match self.total_length {
            Some(n) if n > 0 && n != self.computed_length() => Some((n, self.computed_length())),
            _ => None,
        }
    }
}

/// Body layout of one logical section (e.g. `request`, `response`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionLayout {
    #[serde(rename = "totalLength", default, skip_serializing_if = "Option::is_none")]
    pub total_length: Option<usize>,
    #[serde(rename = "fields", alias = "elements", default)]
    pub elements: Vec<ElementDef>,
}

impl SectionLayout {
    pub fn new(elements: Vec<ElementDef>) -> Self {
        SectionLayout {
            total_length: None,
            elements,
        }
    }

    #[must_use]
    pub fn with_total_length(mut self, total: usize) -> Self {
        self.total_length = Some(total);
        self
    }

    /// Body width with every occurrence at its declared count.
    pub fn body_length(&self) -> usize {
        elements_length(&self.elements)
    }

    pub fn length_mismatch(&self) -> Option<(usize, usize)> {
        match self.total_length {
            Some(n) if n > 0 && n != self.body_length() => Some((n, self.body_length())),
            _ => None,
        }
    }
}

/// Complete description of a message type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default, alias = "header_structure")]
    pub header: HeaderLayout,
    #[serde(default)]
    pub sections: BTreeMap<String, SectionLayout>,
}

impl Schema {
    pub fn new(header: HeaderLayout) -> Self {
        Schema {
            header,
            sections: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_section(mut self, name: impl Into<String>, section: SectionLayout) -> Self {
        self.sections.insert(name.into(), section);
        self
    }

    pub fn section(&self, name: &str) -> Option<&SectionLayout> {
        self.sections.get(name)
    }

    pub fn header_length(&self) -> usize {
        self.header.length()
    }

    /// Full encoded width of a message for `section`: header plus declared body.
    pub fn message_length(&self, section: &str) -> Option<usize> {
        self.section(section)
            .map(|s| self.header_length() + s.body_length())
    }

    /// Parse the JSON shape produced by the spreadsheet ingestion tool.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> OccurrenceDef {
        OccurrenceDef::new(
            "occ_1",
            3,
            vec![
                FieldDef::alpha("A", 4).into(),
                OccurrenceDef::new("occ_1_2", 2, vec![FieldDef::numeric("B", 3).into()]).into(),
            ],
        )
    }

    #[test]
    fn child_block_length_multiplies_nested_counts() {
        assert_eq!(nested().child_block_length(), 4 + 2 * 3);
    }

    #[test]
    fn section_body_length_uses_declared_counts() {
        let s = SectionLayout::new(vec![FieldDef::alpha("X", 2).into(), nested().into()]);
        assert_eq!(s.body_length(), 2 + 3 * 10);
        assert_eq!(s.clone().with_total_length(32).length_mismatch(), None);
        assert_eq!(s.with_total_length(40).length_mismatch(), Some((40, 32)));
    }

    #[test]
    fn header_length_prefers_positive_declared_total() {
        let h = HeaderLayout::new(vec![FieldDef::alpha("A", 3), FieldDef::numeric("B", 2)]);
        assert_eq!(h.length(), 5);
        assert_eq!(h.clone().with_total_length(0).length(), 5);
        assert_eq!(h.with_total_length(8).length(), 8);
    }

    #[test]
    fn kind_parsing_is_lenient() {
        assert_eq!(FieldKind::from("NUMERICO"), FieldKind::Numeric);
        assert_eq!(FieldKind::from(" alfanumerico "), FieldKind::Alphanumeric);
        assert_eq!(
            FieldKind::from("fecha"),
            FieldKind::Unrecognized("fecha".to_string())
        );
        assert!(!FieldKind::default().is_recognized());
    }

    #[test]
    fn positional_key_falls_back_to_id_suffix() {
        assert_eq!(nested().positional_key(), "occurrence_1");
        assert_eq!(nested().with_index(7).positional_key(), "occurrence_7");
        let named = OccurrenceDef::new("detalle", 1, vec![]);
        assert_eq!(named.positional_key(), "occurrence_detalle");
    }

    #[test]
    fn deserializes_ingestion_json() {
        let json = r#"{
            "header": {"totalLength": 6, "fields": [{"name": "SERV", "length": 6, "type": "alfanumerico"}]},
            "sections": {
                "response": {
                    "totalLength": 0,
                    "elements": [
                        {"type": "field", "index": 1, "name": "CANT-REG", "length": 2, "fieldType": "numerico"},
                        {"type": "occurrence", "index": 2, "id": "occ_2", "count": 4, "level": 1,
                         "fields": [{"type": "field", "name": "F", "length": 3, "fieldType": "alfanumerico"}]}
                    ]
                }
            }
        }"#;
        let schema = Schema::from_json(json).expect("json");
        assert_eq!(schema.header_length(), 6);
        assert_eq!(schema.header.fields[0].kind, FieldKind::Alphanumeric);
        let section = schema.section("response").expect("section");
        match &section.elements[1] {
            ElementDef::Occurrence(o) => {
                assert_eq!(o.declared_count, 4);
                assert_eq!(o.index, Some(2));
                assert_eq!(o.child_block_length(), 3);
            }
            other => panic!("expected occurrence, got {:?}", other),
        }
        assert_eq!(schema.message_length("response"), Some(6 + 2 + 12));
    }
}
