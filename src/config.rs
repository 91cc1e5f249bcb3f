//! Codec configuration.
//!
//! Defaults reproduce the conventions of the legacy back end; every knob can be overridden
//! with the `with_*` builders or deserialized from JSON (missing keys keep their default).

use serde::{Deserialize, Serialize};

/// Name heuristic for the field that carries a sibling occurrence's count.
///
/// A field is a counter when its lower-cased name contains both tokens
/// (e.g. `CANT-REG`, `CANTIDAD-REGISTROS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterMatcher {
    pub count_token: String,
    pub record_token: String,
}

impl Default for CounterMatcher {
    fn default() -> Self {
        CounterMatcher {
            count_token: "cant".to_string(),
            record_token: "reg".to_string(),
        }
    }
}

impl CounterMatcher {
    pub fn matches(&self, field_name: &str) -> bool {
        let name = field_name.to_lowercase();
        name.contains(&self.count_token.to_lowercase())
            && name.contains(&self.record_token.to_lowercase())
    }
}

/// Header fields used to pick the section of a whole message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionRules {
    pub request: String,
    pub response: String,
    /// A non-empty value different from `success_code` marks a response.
    pub return_code_field: String,
    pub success_code: String,
    /// A value equal to `response_marker` marks a response.
    pub message_type_field: String,
    pub response_marker: String,
}

impl Default for SectionRules {
    fn default() -> Self {
        SectionRules {
            request: "request".to_string(),
            response: "response".to_string(),
            return_code_field: "CODIGO-RETORNO".to_string(),
            success_code: "00".to_string(),
            message_type_field: "TIPO-MENSAJE".to_string(),
            response_marker: "RESP".to_string(),
        }
    }
}

/// Configuration for a [`crate::Codec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Significant characters tolerated after a group whose count is zero.
    pub zero_count_slack: usize,
    pub counter: CounterMatcher,
    /// Record keys that mark caller-supplied occurrence data on encode.
    pub occurrence_key_tokens: Vec<String>,
    /// Upper bound on the children materialised for one group on decode. Larger counter
    /// values are capped and reported.
    pub max_occurrences: usize,
    pub sections: SectionRules,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            zero_count_slack: 10,
            counter: CounterMatcher::default(),
            occurrence_key_tokens: vec!["CANT-OCURR".to_string(), "CANT_OCURR".to_string()],
            max_occurrences: 9999,
            sections: SectionRules::default(),
        }
    }
}

impl CodecConfig {
    #[must_use]
    pub fn with_zero_count_slack(mut self, slack: usize) -> Self {
        self.zero_count_slack = slack;
        self
    }

    #[must_use]
    pub fn with_counter_tokens(
        mut self,
        count_token: impl Into<String>,
        record_token: impl Into<String>,
    ) -> Self {
        self.counter = CounterMatcher {
            count_token: count_token.into(),
            record_token: record_token.into(),
        };
        self
    }

    #[must_use]
    pub fn with_occurrence_key_tokens(mut self, tokens: Vec<String>) -> Self {
        self.occurrence_key_tokens = tokens;
        self
    }

    #[must_use]
    pub fn with_max_occurrences(mut self, max: usize) -> Self {
        self.max_occurrences = max;
        self
    }

    #[must_use]
    pub fn with_section_rules(mut self, rules: SectionRules) -> Self {
        self.sections = rules;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_matcher_is_case_insensitive() {
        let m = CounterMatcher::default();
        assert!(m.matches("CANT-REG"));
        assert!(m.matches("cantidad_registros"));
        assert!(!m.matches("CANTIDAD"));
        assert!(!m.matches("REGISTRO"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = CodecConfig::from_json(r#"{"zero_count_slack": 0, "counter": {"count_token": "num"}}"#)
            .expect("config");
        assert_eq!(c.zero_count_slack, 0);
        assert_eq!(c.counter.count_token, "num");
        assert_eq!(c.counter.record_token, "reg");
        assert_eq!(c.sections, SectionRules::default());
        assert_eq!(c.max_occurrences, 9999);
    }
}
