//! Runtime values for encoding/decoding (codec representation).

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Metadata key carrying the 1-based position of an occurrence child.
pub const INDEX_KEY: &str = "index";

/// A decoded value: a trimmed text leaf or the children of a repeating group.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Group(Vec<Record>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&[Record]> {
        match self {
            Value::Group(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Record>> for Value {
    fn from(v: Vec<Record>) -> Self {
        Value::Group(v)
    }
}

/// Ordered mapping from field / occurrence name to [`Value`].
///
/// Occurrence children carry `index` (1-based position at decode time); it is metadata
/// and never written to the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    index: Option<usize>,
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty occurrence child at 1-based position `index`.
    pub fn child(index: usize) -> Self {
        Record {
            index: Some(index),
            entries: Vec::new(),
        }
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn set_index(&mut self, index: Option<usize>) {
        self.index = index;
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace, keeping the original position of a replaced entry.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    pub fn group(&self, name: &str) -> Option<&[Record]> {
        self.get(name).and_then(Value::as_group)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(self.index.is_some());
        let mut map = serializer.serialize_map(Some(self.entries.len() + extra))?;
        if let Some(i) = self.index {
            map.serialize_entry(INDEX_KEY, &i)?;
        }
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Group(children) => children.serialize(serializer),
        }
    }
}

/// Deserialization-only view: keeps integers apart so `index` can be told from a field.
enum Leaf {
    Integer(u64),
    Value(Value),
}

impl<'de> Deserialize<'de> for Leaf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LeafVisitor;

        impl<'de> Visitor<'de> for LeafVisitor {
            type Value = Leaf;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string, number, boolean, null or array of records")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Leaf, E> {
                Ok(Leaf::Value(Value::Text(v.to_string())))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Leaf, E> {
                Ok(Leaf::Value(Value::Text(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Leaf, E> {
                Ok(Leaf::Integer(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Leaf, E> {
                match u64::try_from(v) {
                    Ok(u) => Ok(Leaf::Integer(u)),
                    Err(_) => Ok(Leaf::Value(Value::Text(v.to_string()))),
                }
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Leaf, E> {
                Ok(Leaf::Value(Value::Text(v.to_string())))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Leaf, E> {
                Ok(Leaf::Value(Value::Text(v.to_string())))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Leaf, E> {
                Ok(Leaf::Value(Value::Text(String::new())))
            }

            fn visit_none<E: de::Error>(self) -> Result<Leaf, E> {
                self.visit_unit()
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Leaf, A::Error> {
                let mut children = Vec::new();
                while let Some(child) = seq.next_element::<Record>()? {
                    children.push(child);
                }
                Ok(Leaf::Value(Value::Group(children)))
            }
        }

        deserializer.deserialize_any(LeafVisitor)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Leaf::deserialize(deserializer)? {
            Leaf::Integer(n) => Value::Text(n.to_string()),
            Leaf::Value(v) => v,
        })
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of field values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Record, A::Error> {
                let mut record = Record::new();
                while let Some(key) = map.next_key::<String>()? {
                    match map.next_value::<Leaf>()? {
                        Leaf::Integer(n) if key == INDEX_KEY => {
                            record.index = usize::try_from(n).ok();
                        }
                        Leaf::Integer(n) => record.insert(key, n.to_string()),
                        Leaf::Value(v) => record.insert(key, v),
                    }
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut r = Record::new().with("A", "1").with("B", "2");
        r.insert("A", "3");
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(r.text("A"), Some("3"));
    }

    #[test]
    fn json_keeps_order_and_index() {
        let r = Record::new()
            .with("Z", "z")
            .with("occ_1", vec![Record::child(1).with("F", "x")]);
        let json = serde_json::to_string(&r).expect("serialize");
        assert_eq!(json, r#"{"Z":"z","occ_1":[{"index":1,"F":"x"}]}"#);
        let back: Record = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, r);
    }

    #[test]
    fn json_scalars_become_text() {
        let r: Record =
            serde_json::from_str(r#"{"N": 12, "B": true, "E": null, "index": "7"}"#).expect("de");
        assert_eq!(r.text("N"), Some("12"));
        assert_eq!(r.text("B"), Some("true"));
        assert_eq!(r.text("E"), Some(""));
        assert_eq!(r.index(), None);
        assert_eq!(r.text("index"), Some("7"));
    }
}
