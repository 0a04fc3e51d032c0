//! Two-phase shape validator.
//!
//! 1. Structural: the value is checked against `Shape::json_schema` with the
//!    `jsonschema` crate. A null schema means no structural constraint.
//! 2. Semantic: every `ShapeRule` is evaluated in order.
//!
//! All failures are collected before returning, so a rejected tool call
//! reports every problem with its arguments at once.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use switchyard_contracts::{
    error::SwitchyardResult,
    shape::{Shape, ShapeRuleType, ValidationFailure, ValidationReport},
};
use switchyard_core::traits::ShapeValidator;

/// A caller-supplied check. Returns `Some(message)` on failure.
pub type CustomRuleFn = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

pub struct SchemaValidator {
    custom_rules: HashMap<String, CustomRuleFn>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self {
            custom_rules: HashMap::new(),
        }
    }

    /// Register `f` under `name`, replacing any earlier function of that
    /// name. `ShapeRuleType::Custom` rules refer to it by `name`.
    pub fn register_rule(&mut self, name: impl Into<String>, f: CustomRuleFn) {
        self.custom_rules.insert(name.into(), f);
    }

    /// Builder-style `register_rule`.
    pub fn with_rule(mut self, name: impl Into<String>, f: CustomRuleFn) -> Self {
        self.register_rule(name, f);
        self
    }

    /// Resolve a dotted path (`"location.lat"`). Missing segments and JSON
    /// null both resolve to `None`.
    fn resolve_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
        let mut current = value;
        for segment in path.split('.') {
            match current.get(segment) {
                Some(v) if !v.is_null() => current = v,
                _ => return None,
            }
        }
        Some(current)
    }

    fn structural_failures(value: &Value, shape: &Shape) -> Vec<ValidationFailure> {
        if shape.json_schema.is_null() {
            return Vec::new();
        }
        match jsonschema::validator_for(&shape.json_schema) {
            Ok(validator) => validator
                .iter_errors(value)
                .map(|error| {
                    let message = format!("schema violation at '{}': {}", error.instance_path, error);
                    warn!(shape_id = %shape.shape_id, %message, "structural validation failure");
                    ValidationFailure { rule_id: "json-schema".to_string(), message }
                })
                .collect(),
            Err(e) => {
                let message = format!("invalid JSON Schema document: {e}");
                warn!(shape_id = %shape.shape_id, %message, "schema compilation failure");
                vec![ValidationFailure { rule_id: "json-schema".to_string(), message }]
            }
        }
    }

    fn check_rule(&self, value: &Value, rule_type: &ShapeRuleType) -> Option<String> {
        match rule_type {
            ShapeRuleType::RequiredField { field_path } => Self::resolve_path(value, field_path)
                .is_none()
                .then(|| format!("required field '{field_path}' is missing or null")),

            ShapeRuleType::NonEmptyString { field_path } => match Self::resolve_path(value, field_path) {
                Some(Value::String(s)) if !s.trim().is_empty() => None,
                Some(Value::String(_)) => Some(format!("field '{field_path}' is blank")),
                Some(other) => Some(format!("field '{field_path}' is not a string: {other}")),
                None => Some(format!("field '{field_path}' is missing or null")),
            },

            ShapeRuleType::AllowedValues { field_path, allowed } => {
                match Self::resolve_path(value, field_path) {
                    None => Some(format!(
                        "field '{field_path}' is missing; cannot check allowed values"
                    )),
                    Some(actual) if allowed.contains(actual) => None,
                    Some(actual) => Some(format!(
                        "field '{field_path}' has value {actual} which is not in the allowed set"
                    )),
                }
            }

            ShapeRuleType::Custom { function_name } => match self.custom_rules.get(function_name) {
                Some(f) => f(value),
                None => Some(format!(
                    "no custom rule registered for function name '{function_name}'"
                )),
            },
        }
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeValidator for SchemaValidator {
    fn validate(&self, value: &Value, shape: &Shape) -> SwitchyardResult<ValidationReport> {
        let mut failures = Self::structural_failures(value, shape);

        for rule in &shape.rules {
            debug!(rule_id = %rule.rule_id, description = %rule.description, "evaluating shape rule");
            if let Some(message) = self.check_rule(value, &rule.rule_type) {
                warn!(rule_id = %rule.rule_id, %message, "shape rule failed");
                failures.push(ValidationFailure { rule_id: rule.rule_id.clone(), message });
            }
        }

        let passed = failures.is_empty();
        debug!(
            shape_id = %shape.shape_id,
            passed,
            failure_count = failures.len(),
            "validation complete"
        );

        Ok(ValidationReport { passed, failures })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use switchyard_contracts::shape::{Shape, ShapeRule, ShapeRuleType};
    use switchyard_core::traits::ShapeValidator;

    use super::SchemaValidator;

    fn weather_input() -> Shape {
        Shape::from_json_schema(
            "fetch-weather-input-v1",
            json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "object",
                        "properties": {
                            "lat": { "type": "number" },
                            "long": { "type": "number" }
                        },
                        "required": ["lat", "long"]
                    }
                },
                "required": ["location"]
            }),
        )
    }

    fn rules_only(rule_type: ShapeRuleType) -> Shape {
        Shape::any("rules-only").with_rule(ShapeRule::new("r1", "test rule", rule_type))
    }

    #[test]
    fn conforming_arguments_pass() {
        let report = SchemaValidator::new()
            .validate(&json!({ "location": { "lat": 52.5, "long": 13.4 } }), &weather_input())
            .unwrap();
        assert!(report.passed, "failures: {:?}", report.failures);
    }

    #[test]
    fn missing_nested_field_fails_structurally() {
        let report = SchemaValidator::new()
            .validate(&json!({ "location": { "lat": 52.5 } }), &weather_input())
            .unwrap();
        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "json-schema");
        assert!(report.summary().contains("long"), "{}", report.summary());
    }

    #[test]
    fn null_schema_accepts_anything() {
        let report = SchemaValidator::new().validate(&json!([1, 2, 3]), &Shape::any("any")).unwrap();
        assert!(report.passed);
    }

    #[test]
    fn invalid_schema_document_is_a_failure() {
        let shape = Shape::from_json_schema("broken", json!({ "type": 12 }));
        let report = SchemaValidator::new().validate(&json!({}), &shape).unwrap();
        assert!(!report.passed);
        assert!(report.failures[0].message.contains("invalid JSON Schema"));
    }

    #[test]
    fn required_field_uses_dotted_paths() {
        let shape = rules_only(ShapeRuleType::RequiredField { field_path: "location.lat".to_string() });
        let validator = SchemaValidator::new();

        assert!(validator.validate(&json!({ "location": { "lat": 1.0 } }), &shape).unwrap().passed);

        let report = validator.validate(&json!({ "location": { "lat": null } }), &shape).unwrap();
        assert!(!report.passed);
        assert!(report.failures[0].message.contains("location.lat"));
    }

    #[test]
    fn non_empty_string_rejects_blank_and_non_string() {
        let shape = rules_only(ShapeRuleType::NonEmptyString { field_path: "search_query".to_string() });
        let validator = SchemaValidator::new();

        assert!(validator.validate(&json!({ "search_query": "rates" }), &shape).unwrap().passed);
        assert!(!validator.validate(&json!({ "search_query": "  " }), &shape).unwrap().passed);
        assert!(!validator.validate(&json!({ "search_query": 3 }), &shape).unwrap().passed);
        assert!(!validator.validate(&json!({}), &shape).unwrap().passed);
    }

    #[test]
    fn allowed_values_are_exhaustive() {
        let shape = rules_only(ShapeRuleType::AllowedValues {
            field_path: "unit".to_string(),
            allowed: vec![json!("celsius"), json!("fahrenheit")],
        });
        let validator = SchemaValidator::new();

        assert!(validator.validate(&json!({ "unit": "celsius" }), &shape).unwrap().passed);
        let report = validator.validate(&json!({ "unit": "kelvin" }), &shape).unwrap();
        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "r1");
    }

    #[test]
    fn custom_rules_are_delegated() {
        let validator = SchemaValidator::new().with_rule(
            "positive",
            Box::new(|v: &Value| match v.get("n").and_then(Value::as_i64) {
                Some(n) if n > 0 => None,
                _ => Some("n must be positive".to_string()),
            }),
        );
        let shape = rules_only(ShapeRuleType::Custom { function_name: "positive".to_string() });

        assert!(validator.validate(&json!({ "n": 2 }), &shape).unwrap().passed);
        let report = validator.validate(&json!({ "n": -1 }), &shape).unwrap();
        assert!(report.failures[0].message.contains("positive"));
    }

    #[test]
    fn unregistered_custom_rule_fails() {
        let shape = rules_only(ShapeRuleType::Custom { function_name: "does-not-exist".to_string() });
        let report = SchemaValidator::new().validate(&json!({}), &shape).unwrap();
        assert!(!report.passed);
        assert!(report.failures[0].message.contains("does-not-exist"));
    }

    #[test]
    fn all_failures_are_collected() {
        let shape = weather_input()
            .with_rule(ShapeRule::new(
                "units",
                "unit must be given",
                ShapeRuleType::RequiredField { field_path: "unit".to_string() },
            ));
        let report = SchemaValidator::new().validate(&json!({}), &shape).unwrap();
        assert_eq!(report.failures.len(), 2);
    }
}
