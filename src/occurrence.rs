//! Occurrence resolution: which field declares a repeating group's count, how many children
//! the group gets, and where a caller keeps the children on encode.
//!
//! Counter detection is a name heuristic ([`CounterMatcher`]); it is kept behind
//! [`is_counter_field`] / [`counter_field`] so an explicit schema attribute can replace it
//! without touching the codec.

use crate::config::CounterMatcher;
use crate::format::parse_count;
use crate::schema::{ElementDef, FieldDef, OccurrenceDef};
use crate::value::Record;

/// Default heuristic: the name contains `cant` and `reg`, case-insensitively.
pub fn is_counter_field(name: &str) -> bool {
    CounterMatcher::default().matches(name)
}

/// First occurrence of a scope with its position in the element list.
pub fn first_occurrence(elements: &[ElementDef]) -> Option<(usize, &OccurrenceDef)> {
    elements.iter().enumerate().find_map(|(i, e)| match e {
        ElementDef::Occurrence(o) => Some((i, o)),
        ElementDef::Field(_) => None,
    })
}

/// Counter field for the first occurrence of a scope: the last field before that occurrence
/// whose name matches. Zero-length fields never count.
pub fn counter_field<'a>(
    elements: &'a [ElementDef],
    matcher: &CounterMatcher,
) -> Option<(&'a FieldDef, &'a OccurrenceDef)> {
    let (at, occ) = first_occurrence(elements)?;
    elements[..at]
        .iter()
        .filter_map(|e| match e {
            ElementDef::Field(f) if f.length > 0 && matcher.matches(&f.name) => Some(f),
            _ => None,
        })
        .last()
        .map(|f| (f, occ))
}

/// Count to use for `occ`: the counter value when a counter field exists, else the
/// schema-authored default.
pub fn effective_count(counter_value: Option<&str>, occ: &OccurrenceDef) -> usize {
    match counter_value {
        Some(v) => parse_count(v),
        None => occ.declared_count,
    }
}

/// Total width of the plain fields that follow the first occurrence of a scope.
pub fn trailing_fields_length(elements: &[ElementDef]) -> usize {
    let Some((at, _)) = first_occurrence(elements) else {
        return 0;
    };
    elements[at + 1..]
        .iter()
        .map(|e| match e {
            ElementDef::Field(f) => f.length,
            ElementDef::Occurrence(_) => 0,
        })
        .sum()
}

/// Child with every field blank, as if decoded from an all-space block. A nested group
/// driven by a counter is empty; one without a counter gets its declared count of blank
/// children.
pub fn blank_child(elements: &[ElementDef], index: Option<usize>, matcher: &CounterMatcher) -> Record {
    let mut out = index.map(Record::child).unwrap_or_default();
    let counted = counter_field(elements, matcher).is_some();
    let mut seen_occurrence = false;
    for e in elements {
        match e {
            ElementDef::Field(f) if f.length > 0 => out.insert(f.name.clone(), ""),
            ElementDef::Field(_) => {}
            ElementDef::Occurrence(o) if !seen_occurrence => {
                seen_occurrence = true;
                let n = if counted { 0 } else { o.declared_count };
                let children = (1..=n)
                    .map(|i| blank_child(&o.elements, Some(i), matcher))
                    .collect::<Vec<_>>();
                out.insert(o.id.clone(), children);
            }
            ElementDef::Occurrence(_) => {}
        }
    }
    out
}

/// Force `children` to exactly `effective` entries: truncate extras, pad with blank
/// children. Surviving children are renumbered 1..=effective.
pub fn reconcile(
    mut children: Vec<Record>,
    effective: usize,
    occ: &OccurrenceDef,
    matcher: &CounterMatcher,
) -> Vec<Record> {
    children.truncate(effective);
    while children.len() < effective {
        let i = children.len() + 1;
        children.push(blank_child(&occ.elements, Some(i), matcher));
    }
    for (i, child) in children.iter_mut().enumerate() {
        child.set_index(Some(i + 1));
    }
    children
}

/// Caller-supplied children for `occ`, looked up by (a) the id, (b) the positional key
/// `occurrence_<index>`, then (c) a group-valued key containing one of `key_tokens` whose
/// numeric suffix, if any, matches the group's index. Missing data is an empty slice.
pub fn find_occurrence_data<'a>(
    data: &'a Record,
    occ: &OccurrenceDef,
    key_tokens: &[String],
) -> &'a [Record] {
    if let Some(children) = data.group(&occ.id) {
        return children;
    }
    let positional = occ.positional_key();
    if let Some(children) = data.group(&positional) {
        return children;
    }
    let wanted = positional.trim_start_matches("occurrence_");
    for (key, value) in data.iter() {
        let Some(children) = value.as_group() else {
            continue;
        };
        let Some(token) = key_tokens.iter().find(|t| key.contains(t.as_str())) else {
            continue;
        };
        let suffix = key[key.find(token.as_str()).unwrap_or(0) + token.len()..]
            .trim_start_matches(|c: char| c == '-' || c == '_');
        if suffix.is_empty() || suffix == wanted {
            return children;
        }
    }
    &[]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;

    fn scope() -> Vec<ElementDef> {
        vec![
            FieldDef::alpha("ESTADO", 2).into(),
            FieldDef::numeric("CANT-REG", 2).into(),
            OccurrenceDef::new(
                "occ_1",
                3,
                vec![FieldDef::alpha("F1", 5).into(), FieldDef::numeric("F2", 4).into()],
            )
            .into(),
            FieldDef::alpha("FIN", 3).into(),
        ]
    }

    fn occ(elements: &[ElementDef]) -> &OccurrenceDef {
        first_occurrence(elements).map(|(_, o)| o).expect("occurrence")
    }

    #[test]
    fn counter_field_must_precede_first_occurrence() {
        let m = CounterMatcher::default();
        let elements = scope();
        let (f, o) = counter_field(&elements, &m).expect("counter");
        assert_eq!(f.name, "CANT-REG");
        assert_eq!(o.id, "occ_1");

        let mut late = scope();
        late.swap(1, 2);
        assert!(counter_field(&late, &m).is_none());
        assert!(is_counter_field("Cant_Registros"));
    }

    #[test]
    fn counter_value_overrides_declared_count() {
        let elements = scope();
        assert_eq!(effective_count(Some("02"), occ(&elements)), 2);
        assert_eq!(effective_count(Some(""), occ(&elements)), 0);
        assert_eq!(effective_count(None, occ(&elements)), 3);
    }

    #[test]
    fn reconcile_pads_and_truncates() {
        let m = CounterMatcher::default();
        let elements = scope();
        let o = occ(&elements);
        let padded = reconcile(vec![Record::new().with("F1", "A")], 3, o, &m);
        assert_eq!(padded.len(), 3);
        assert_eq!(padded[0].text("F1"), Some("A"));
        assert_eq!(padded[2], Record::child(3).with("F1", "").with("F2", ""));

        let cut = reconcile(padded, 1, o, &m);
        assert_eq!(cut.len(), 1);
        assert_eq!(cut[0].index(), Some(1));
    }

    #[test]
    fn trailing_fields_after_group_are_measured() {
        assert_eq!(trailing_fields_length(&scope()), 3);
        assert_eq!(trailing_fields_length(&[FieldDef::alpha("X", 2).into()]), 0);
    }

    #[test]
    fn lookup_prefers_id_then_position_then_token() {
        let elements = scope();
        let o = occ(&elements);
        let tokens = vec!["CANT-OCURR".to_string()];
        let child = || vec![Record::new().with("F1", "x")];

        let by_id = Record::new().with("occ_1", child());
        assert_eq!(find_occurrence_data(&by_id, o, &tokens).len(), 1);

        let by_position = Record::new().with("occurrence_1", child());
        assert_eq!(find_occurrence_data(&by_position, o, &tokens).len(), 1);

        let by_token = Record::new().with("CANT-OCURR-1", child());
        assert_eq!(find_occurrence_data(&by_token, o, &tokens).len(), 1);

        let other_token = Record::new().with("CANT-OCURR-2", child());
        assert!(find_occurrence_data(&other_token, o, &tokens).is_empty());
        assert!(find_occurrence_data(&Record::new(), o, &tokens).is_empty());
    }
}
