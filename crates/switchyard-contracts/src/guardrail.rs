//! Guardrail verdicts and the blocked/completed outcome of a guarded run.
//!
//! A tripped guardrail is not a failure: the orchestration entry points
//! return `RunOutcome::Blocked` so callers can tell "blocked by policy" apart
//! from "something went wrong" without inspecting error variants.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Explanation attached to every guardrail verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailDiagnostics {
    /// The input the guardrail was asked to judge.
    pub input: String,
    /// The underlying reasoning (model text or the matched rule).
    pub reasoning: String,
    /// Anything else the guardrail wants to surface.
    #[serde(default)]
    pub details: Value,
}

/// Produced once per guardrail invocation and consumed immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    /// Name of the guardrail that produced this verdict.
    pub guardrail: String,
    /// True when the protected handler must not run.
    pub tripwire_triggered: bool,
    pub diagnostics: GuardrailDiagnostics,
}

impl GuardrailVerdict {
    /// A passing verdict.
    pub fn pass(
        guardrail: impl Into<String>,
        input: impl Into<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self::new(guardrail, false, input, reasoning)
    }

    /// A verdict that trips the wire.
    pub fn trip(
        guardrail: impl Into<String>,
        input: impl Into<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self::new(guardrail, true, input, reasoning)
    }

    /// Build a verdict from whether the guardrail's predicate holds.
    /// The tripwire is the negation of the predicate.
    pub fn from_predicate(
        guardrail: impl Into<String>,
        predicate_holds: bool,
        input: impl Into<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self::new(guardrail, !predicate_holds, input, reasoning)
    }

    fn new(
        guardrail: impl Into<String>,
        tripwire_triggered: bool,
        input: impl Into<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            guardrail: guardrail.into(),
            tripwire_triggered,
            diagnostics: GuardrailDiagnostics {
                input: input.into(),
                reasoning: reasoning.into(),
                details: Value::Null,
            },
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.diagnostics.details = details;
        self
    }
}

/// Result of a guarded orchestration entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome<T> {
    /// The guardrail passed and the protected work produced a value.
    Completed(T),
    /// A guardrail tripped; the protected work never ran.
    Blocked(GuardrailVerdict),
}

impl<T> RunOutcome<T> {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }

    pub fn completed(&self) -> Option<&T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Blocked(_) => None,
        }
    }

    pub fn blocked(&self) -> Option<&GuardrailVerdict> {
        match self {
            Self::Completed(_) => None,
            Self::Blocked(verdict) => Some(verdict),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RunOutcome<U> {
        match self {
            Self::Completed(value) => RunOutcome::Completed(f(value)),
            Self::Blocked(verdict) => RunOutcome::Blocked(verdict),
        }
    }
}
