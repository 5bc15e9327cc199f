//! Declarative request validation.
//!
//! A [`ValidationChain`] is an ordered list of steps: field rules and
//! sanitizers. Running a chain evaluates every rule (no short-circuit) and
//! returns all failures in declaration order, so a client can show every
//! field error at once. Sanitizers rewrite the working copy of the record in
//! place, so rules declared after a sanitizer see the sanitized value.

pub mod chains;
mod checks;
mod extract;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::GateError;

pub use chains::Operation;
pub use extract::{ValidatedBody, ValidatedPath, ValidatedQuery};

/// When a rule runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    /// Always runs; an absent field is checked as an empty value.
    Required,
    /// Skipped when the field is absent.
    Optional,
    /// Skipped when the field is absent or falsy (`""`, `0`, `false`, `null`).
    OptionalIfFalsy,
}

/// Primitive check kinds. Values are checked in their string form.
#[derive(Debug, Clone)]
pub enum Check {
    /// Non-empty string form.
    NotEmpty,
    /// The field must not be present at all.
    Absent,
    /// Decimal number within the inclusive bounds.
    Float { min: Option<f64>, max: Option<f64> },
    /// Integer within the inclusive bounds.
    Int { min: Option<i64>, max: Option<i64> },
    /// Character count within the inclusive bounds.
    Length { min: Option<usize>, max: Option<usize> },
    /// http, https or ftp URL with a dotted host. The scheme may be omitted.
    Url,
    Email,
    Matches(Regex),
    OneOf(&'static [&'static str]),
    /// Calendar date or RFC 3339 timestamp.
    Iso8601,
    /// Named custom predicate on the string form.
    Predicate(&'static str, fn(&str) -> bool),
}

impl Check {
    fn passes(&self, value: Option<&Value>) -> bool {
        let text = match self {
            Check::Absent => return value.is_none(),
            _ => checks::string_form(value),
        };
        match self {
            Check::Absent => false,
            Check::NotEmpty => !text.is_empty(),
            Check::Float { min, max } => checks::float_in_range(&text, *min, *max),
            Check::Int { min, max } => checks::int_in_range(&text, *min, *max),
            Check::Length { min, max } => {
                let len = text.chars().count();
                min.is_none_or(|m| len >= m) && max.is_none_or(|m| len <= m)
            }
            Check::Url => checks::is_url(&text),
            Check::Email => checks::is_email(&text),
            Check::Matches(regex) => regex.is_match(&text),
            Check::OneOf(allowed) => allowed.contains(&text.as_str()),
            Check::Iso8601 => checks::is_iso8601(&text),
            Check::Predicate(_, predicate) => predicate(&text),
        }
    }
}

/// Value rewrites applied to present string fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sanitizer {
    Trim,
    /// Fold an address to its canonical mailbox (provider aliases removed,
    /// lowercased). Left lowercased as-is if it has no usable mailbox part.
    NormalizeEmail,
}

impl Sanitizer {
    fn apply(self, value: &mut Value) {
        if let Value::String(s) = value {
            *s = match self {
                Sanitizer::Trim => s.trim().to_string(),
                Sanitizer::NormalizeEmail => {
                    checks::normalize_email(s).unwrap_or_else(|| s.to_lowercase())
                }
            };
        }
    }
}

/// A named field check.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    pub field: &'static str,
    pub check: Check,
    pub message: &'static str,
    pub applicability: Applicability,
}

impl ValidationRule {
    fn applies_to(&self, value: Option<&Value>) -> bool {
        match self.applicability {
            Applicability::Required => true,
            Applicability::Optional => value.is_some(),
            Applicability::OptionalIfFalsy => value.is_some_and(|v| !checks::is_falsy(v)),
        }
    }
}

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
    #[serde(rename = "value", skip_serializing_if = "Option::is_none")]
    pub offending_value: Option<Value>,
}

#[derive(Debug, Clone)]
enum Step {
    Rule(ValidationRule),
    Sanitize(&'static str, Sanitizer),
}

/// Ordered rules and sanitizers for one operation.
#[derive(Debug, Clone, Default)]
pub struct ValidationChain {
    steps: Vec<Step>,
}

impl ValidationChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(
        mut self,
        field: &'static str,
        applicability: Applicability,
        check: Check,
        message: &'static str,
    ) -> Self {
        self.steps.push(Step::Rule(ValidationRule {
            field,
            check,
            message,
            applicability,
        }));
        self
    }

    pub fn required(self, field: &'static str, check: Check, message: &'static str) -> Self {
        self.rule(field, Applicability::Required, check, message)
    }

    pub fn optional(self, field: &'static str, check: Check, message: &'static str) -> Self {
        self.rule(field, Applicability::Optional, check, message)
    }

    pub fn optional_if_falsy(
        self,
        field: &'static str,
        check: Check,
        message: &'static str,
    ) -> Self {
        self.rule(field, Applicability::OptionalIfFalsy, check, message)
    }

    /// Reject the record if `field` is present at all.
    pub fn forbidden(self, field: &'static str, message: &'static str) -> Self {
        self.rule(field, Applicability::Required, Check::Absent, message)
    }

    pub fn sanitize(mut self, field: &'static str, sanitizer: Sanitizer) -> Self {
        self.steps.push(Step::Sanitize(field, sanitizer));
        self
    }

    pub fn trim(self, field: &'static str) -> Self {
        self.sanitize(field, Sanitizer::Trim)
    }

    /// Evaluate every rule and return all failures in rule order.
    pub fn run(&self, record: &Value) -> Vec<ValidationFailure> {
        self.evaluate(record.clone()).1
    }

    /// Run the chain; on success return the sanitized record.
    pub fn apply(&self, record: Value) -> Result<Value, GateError> {
        let (record, failures) = self.evaluate(record);
        if failures.is_empty() {
            Ok(record)
        } else {
            Err(GateError::ValidationFailed(failures))
        }
    }

    fn evaluate(&self, mut record: Value) -> (Value, Vec<ValidationFailure>) {
        let mut failures = Vec::new();
        for step in &self.steps {
            match step {
                Step::Sanitize(field, sanitizer) => {
                    if let Some(value) = record.get_mut(*field) {
                        sanitizer.apply(value);
                    }
                }
                Step::Rule(rule) => {
                    let value = record.get(rule.field);
                    if rule.applies_to(value) && !rule.check.passes(value) {
                        failures.push(ValidationFailure {
                            field: rule.field.to_string(),
                            message: rule.message.to_string(),
                            offending_value: value.cloned(),
                        });
                    }
                }
            }
        }
        (record, failures)
    }
}

/// Build a record from string key/value pairs (query strings, path
/// parameters, form bodies).
pub fn record_from_pairs<I, K, V>(pairs: I) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    Value::Object(
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain() -> ValidationChain {
        ValidationChain::new()
            .forbidden("id", "no id")
            .required("name", Check::NotEmpty, "name required")
            .trim("name")
            .optional(
                "calories",
                Check::Float {
                    min: Some(0.0),
                    max: None,
                },
                "calories positive",
            )
            .optional_if_falsy("link", Check::Url, "bad link")
    }

    #[test]
    fn test_empty_failure_set_on_valid_record() {
        let record = json!({"name": "Oats", "calories": 389, "link": ""});
        assert!(chain().run(&record).is_empty());
    }

    #[test]
    fn test_all_rules_run_in_order() {
        let record = json!({"id": 3, "calories": -1, "link": "nope"});
        let failures = chain().run(&record);
        let fields: Vec<_> = failures.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, ["id", "name", "calories", "link"]);
    }

    #[test]
    fn test_offending_value_only_when_present() {
        let failures = chain().run(&json!({"id": null}));
        assert_eq!(failures[0].field, "id");
        assert_eq!(failures[0].offending_value, Some(Value::Null));
        assert_eq!(failures[1].field, "name");
        assert_eq!(failures[1].offending_value, None);

        let rendered = serde_json::to_value(&failures[1]).unwrap();
        assert_eq!(rendered, json!({"field": "name", "message": "name required"}));
    }

    #[test]
    fn test_optional_skips_absent_but_not_empty() {
        let chain = ValidationChain::new().optional("name", Check::NotEmpty, "empty");
        assert!(chain.run(&json!({})).is_empty());
        assert_eq!(chain.run(&json!({"name": ""})).len(), 1);
        assert_eq!(chain.run(&json!({"name": null})).len(), 1);
    }

    #[test]
    fn test_optional_if_falsy_skips_falsy_values() {
        let chain = ValidationChain::new().optional_if_falsy("link", Check::Url, "bad");
        for value in [json!(""), json!(0), json!(false), json!(null)] {
            assert!(chain.run(&json!({"link": value})).is_empty());
        }
        assert_eq!(chain.run(&json!({"link": "not a url"})).len(), 1);
    }

    #[test]
    fn test_sanitizer_affects_later_rules_and_output() {
        let chain = ValidationChain::new()
            .optional("first", Check::NotEmpty, "unused")
            .trim("first")
            .optional(
                "first",
                Check::Length {
                    min: Some(1),
                    max: Some(50),
                },
                "length",
            );
        assert_eq!(chain.run(&json!({"first": "   "})).len(), 1);

        let record = chain.apply(json!({"first": "  Ada "})).unwrap();
        assert_eq!(record, json!({"first": "Ada"}));
    }

    #[test]
    fn test_apply_returns_all_failures() {
        let err = chain().apply(json!({"id": 1})).unwrap_err();
        match err {
            GateError::ValidationFailed(failures) => assert_eq!(failures.len(), 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_object_record_treats_fields_as_absent() {
        let failures = chain().run(&json!([1, 2, 3]));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field, "name");
    }

    #[test]
    fn test_record_from_pairs() {
        let record = record_from_pairs([("page", "2"), ("limit", "10")]);
        assert_eq!(record, json!({"page": "2", "limit": "10"}));
    }
}
