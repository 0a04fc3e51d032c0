//! Keyword rule types and the TOML schema for `RuleGuardrail`.
//!
//! Rules are evaluated in declaration order and the first match wins. When
//! nothing matches, the top-level `default` verdict applies.

use serde::{Deserialize, Serialize};

/// What a matching rule decides.
///
/// ```toml
/// verdict = "pass"
/// verdict = "trip"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleVerdict {
    Pass,
    Trip,
}

impl RuleVerdict {
    pub fn trips(self) -> bool {
        self == Self::Trip
    }
}

/// A single keyword rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailRule {
    /// Stable identifier, reported as the verdict's reasoning.
    pub id: String,

    pub description: String,

    /// Case-insensitive substrings; any one of them matches. `"*"` matches
    /// every input.
    pub keywords: Vec<String>,

    pub verdict: RuleVerdict,
}

impl GuardrailRule {
    /// The first keyword found in `input`, if any.
    pub fn matched_keyword(&self, input: &str) -> Option<&str> {
        let haystack = input.to_lowercase();
        self.keywords
            .iter()
            .find(|k| k.as_str() == "*" || haystack.contains(&k.to_lowercase()))
            .map(String::as_str)
    }
}

fn default_name() -> String {
    "keyword rules".to_string()
}

fn default_verdict() -> RuleVerdict {
    RuleVerdict::Pass
}

/// Top-level structure of a guardrail rules file.
///
/// ```toml
/// name = "homework filter"
/// default = "trip"
///
/// [[rules]]
/// id = "math-terms"
/// description = "Arithmetic and algebra questions are homework"
/// keywords = ["solve", "equation", "+"]
/// verdict = "pass"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailConfig {
    #[serde(default = "default_name")]
    pub name: String,

    /// Applied when no rule matches.
    #[serde(default = "default_verdict")]
    pub default: RuleVerdict,

    #[serde(default)]
    pub rules: Vec<GuardrailRule>,
}
