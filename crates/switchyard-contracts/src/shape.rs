//! Declared input/output shapes and validation reports.
//!
//! A `Shape` describes what a tool accepts or returns, or what structured
//! output the generation service was asked to produce. It combines a JSON
//! Schema document with a few semantic rules JSON Schema cannot express
//! conveniently.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A declared value shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Unique identifier (e.g. "fetch-weather-input-v1").
    pub shape_id: String,
    /// JSON Schema document. `Value::Null` means no structural constraint.
    pub json_schema: Value,
    /// Semantic rules evaluated after structural validation.
    #[serde(default)]
    pub rules: Vec<ShapeRule>,
}

impl Shape {
    /// A shape that accepts any value.
    pub fn any(shape_id: impl Into<String>) -> Self {
        Self {
            shape_id: shape_id.into(),
            json_schema: Value::Null,
            rules: Vec::new(),
        }
    }

    /// A shape constrained only by a JSON Schema document.
    pub fn from_json_schema(shape_id: impl Into<String>, json_schema: Value) -> Self {
        Self {
            shape_id: shape_id.into(),
            json_schema,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: ShapeRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// A single semantic rule applied to a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRule {
    /// Referenced in failure reports.
    pub rule_id: String,
    pub description: String,
    pub rule_type: ShapeRuleType,
}

impl ShapeRule {
    pub fn new(
        rule_id: impl Into<String>,
        description: impl Into<String>,
        rule_type: ShapeRuleType,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            description: description.into(),
            rule_type,
        }
    }
}

/// The semantic checks the validator supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeRuleType {
    /// The field at `field_path` (dotted) must be present and non-null.
    RequiredField { field_path: String },

    /// The field at `field_path` must be a string with non-whitespace content.
    NonEmptyString { field_path: String },

    /// The field at `field_path` must equal one of `allowed`.
    AllowedValues { field_path: String, allowed: Vec<Value> },

    /// Delegate to a function registered on the validator under this name.
    Custom { function_name: String },
}

/// Result of validating one value against a `Shape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True only if every check passed.
    pub passed: bool,
    /// Empty on pass.
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    pub fn pass() -> Self {
        Self {
            passed: true,
            failures: Vec::new(),
        }
    }

    /// All failures joined as `[rule] message; ...`.
    pub fn summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("[{}] {}", f.rule_id, f.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub rule_id: String,
    pub message: String,
}
