//! Tolerant parsing of structured model output.
//!
//! Models asked for JSON often wrap it in code fences or surround it with
//! prose. Extraction strips fence lines, slices from the first `{` to the
//! last `}`, and parses that. Any failure along the way produces
//! `StructuredOutput::Fallback` carrying the raw text, never an error.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use switchyard_contracts::{error::SwitchyardResult, shape::Shape};

use crate::traits::ShapeValidator;

/// Outcome of parsing model text into a typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredOutput<T> {
    Parsed(T),
    /// The text could not be turned into `T`. `raw` is the untouched model
    /// text, usable as an explanatory payload.
    Fallback { raw: String, reason: String },
}

impl<T> StructuredOutput<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn parsed(self) -> Option<T> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Fallback { .. } => None,
        }
    }
}

/// Drop every line that opens or closes a triple-backtick fence, keeping
/// the fenced content.
pub fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Find and parse the outermost JSON object in `text`.
pub fn extract_json_object(text: &str) -> Result<Value, String> {
    let cleaned = strip_code_fences(text);
    let start = cleaned.find('{');
    let end = cleaned.rfind('}');
    let candidate = match (start, end) {
        (Some(start), Some(end)) if end > start => &cleaned[start..=end],
        _ => return Err("no JSON object found in text".to_string()),
    };
    serde_json::from_str(candidate).map_err(|e| format!("invalid JSON object: {e}"))
}

/// Extract and deserialize `T` from model text.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> StructuredOutput<T> {
    match extract_json_object(text).and_then(deserialize) {
        Ok(parsed) => StructuredOutput::Parsed(parsed),
        Err(reason) => fallback(text, reason),
    }
}

/// Extract, validate against `shape`, then deserialize `T`.
///
/// Shape violations fall back exactly like parse failures. Only a validator
/// malfunction is returned as `Err`.
pub fn parse_validated<T: DeserializeOwned>(
    text: &str,
    shape: &Shape,
    validator: &dyn ShapeValidator,
) -> SwitchyardResult<StructuredOutput<T>> {
    let value = match extract_json_object(text) {
        Ok(value) => value,
        Err(reason) => return Ok(fallback(text, reason)),
    };

    let report = validator.validate(&value, shape)?;
    if !report.passed {
        return Ok(fallback(
            text,
            format!("output does not match shape '{}': {}", shape.shape_id, report.summary()),
        ));
    }

    debug!(shape_id = %shape.shape_id, "structured output validated");
    Ok(match deserialize(value) {
        Ok(parsed) => StructuredOutput::Parsed(parsed),
        Err(reason) => fallback(text, reason),
    })
}

fn deserialize<T: DeserializeOwned>(value: Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("unexpected structure: {e}"))
}

fn fallback<T>(raw: &str, reason: String) -> StructuredOutput<T> {
    warn!(%reason, "malformed structured output, falling back to raw text");
    StructuredOutput::Fallback {
        raw: raw.to_string(),
        reason,
    }
}
