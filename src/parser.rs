//! Parse layout notation into a [`Schema`] using PEST.
//!
//! ```text
//! header length 12 {
//!     SERVICIO: alpha(4);
//!     LONGITUD: numeric(8);
//! }
//!
//! section response {
//!     ESTADO: alpha(2);
//!     CANT-REG: numeric(2);
//!     occurrence occ_1 index 3 count 5 {
//!         F1: alpha(5);
//!         occurrence occ_1_2 count 2 { G: numeric(3); }
//!     }
//! }
//! ```

use crate::schema::*;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct LayoutParser;

/// Parse layout source into a schema.
pub fn parse_layout(source: &str) -> Result<Schema, String> {
    let pairs = LayoutParser::parse(Rule::schema, source)
        .map_err(|e| format!("Parse error: {}", e))?;
    let pair = pairs.into_iter().next().ok_or("Empty parse")?;
    build_schema(pair)
}

fn build_schema(pair: pest::iterators::Pair<Rule>) -> Result<Schema, String> {
    let mut header = None;
    let mut schema = Schema::default();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::header_section => {
                if header.is_some() {
                    return Err("Duplicate header section".to_string());
                }
                header = Some(build_header(inner)?);
            }
            Rule::section => {
                let (name, section) = build_section(inner)?;
                if schema.sections.contains_key(&name) {
                    return Err(format!("Duplicate section name: {}", name));
                }
                schema.sections.insert(name, section);
            }
            _ => {}
        }
    }
    schema.header = header.unwrap_or_default();
    Ok(schema)
}

fn build_header(pair: pest::iterators::Pair<Rule>) -> Result<HeaderLayout, String> {
    let mut layout = HeaderLayout::default();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::length_spec => layout.total_length = Some(parse_spec_int(inner)?),
            Rule::field => layout.fields.push(build_field(inner)?),
            _ => {}
        }
    }
    Ok(layout)
}

fn build_section(pair: pest::iterators::Pair<Rule>) -> Result<(String, SectionLayout), String> {
    let mut name = String::new();
    let mut layout = SectionLayout::default();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::length_spec => layout.total_length = Some(parse_spec_int(inner)?),
            Rule::field | Rule::occurrence => layout.elements.push(build_element(inner)?),
            _ => {}
        }
    }
    if name.is_empty() {
        return Err("section: missing name".to_string());
    }
    Ok((name, layout))
}

fn build_element(pair: pest::iterators::Pair<Rule>) -> Result<ElementDef, String> {
    match pair.as_rule() {
        Rule::field => build_field(pair).map(ElementDef::Field),
        Rule::occurrence => build_occurrence(pair).map(ElementDef::Occurrence),
        other => Err(format!("unexpected element: {:?}", other)),
    }
}

fn build_field(pair: pest::iterators::Pair<Rule>) -> Result<FieldDef, String> {
    let mut name = None;
    let mut kind = FieldKind::default();
    let mut length = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = Some(inner.as_str().to_string()),
            Rule::kind => kind = FieldKind::from(inner.as_str()),
            Rule::int => length = Some(parse_int(inner.as_str())?),
            _ => {}
        }
    }
    Ok(FieldDef {
        name: name.ok_or("field: missing name")?,
        length: length.ok_or("field: missing length")?,
        kind,
    })
}

fn build_occurrence(pair: pest::iterators::Pair<Rule>) -> Result<OccurrenceDef, String> {
    let mut id = None;
    let mut index = None;
    let mut count = None;
    let mut elements = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => id = Some(inner.as_str().to_string()),
            Rule::index_spec => index = Some(parse_spec_int(inner)?),
            Rule::count_spec => count = Some(parse_spec_int(inner)?),
            Rule::field | Rule::occurrence => elements.push(build_element(inner)?),
            _ => {}
        }
    }
    Ok(OccurrenceDef {
        id: id.ok_or("occurrence: missing id")?,
        index,
        declared_count: count.ok_or("occurrence: missing count")?,
        elements,
    })
}

fn parse_spec_int(spec: pest::iterators::Pair<Rule>) -> Result<usize, String> {
    let lit = spec
        .into_inner()
        .find(|p| p.as_rule() == Rule::int)
        .ok_or("spec: missing number")?;
    parse_int(lit.as_str())
}

fn parse_int(s: &str) -> Result<usize, String> {
    s.parse().map_err(|_| format!("number out of range: {}", s))
}
