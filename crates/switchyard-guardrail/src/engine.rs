//! `RuleGuardrail`: a deterministic guardrail driven by TOML keyword rules.
//!
//! No generation service is involved, so verdicts are stable for a given
//! input and rule file.

use std::path::Path;

use serde_json::json;
use tracing::{debug, info, warn};

use switchyard_contracts::{
    error::{SwitchyardError, SwitchyardResult},
    guardrail::GuardrailVerdict,
};
use switchyard_core::traits::Guardrail;

use crate::rule::GuardrailConfig;

/// Construct via `from_toml_str` or `from_file`.
///
/// ```rust,ignore
/// use switchyard_guardrail::engine::RuleGuardrail;
///
/// let guardrail = RuleGuardrail::from_file(Path::new("guardrails/homework.toml"))?;
/// ```
#[derive(Debug)]
pub struct RuleGuardrail {
    config: GuardrailConfig,
}

impl RuleGuardrail {
    /// Parse `s` as a TOML rules file.
    ///
    /// # Errors
    ///
    /// `ConfigError` if the TOML is malformed, a rule has no keywords, or two
    /// rules share an id.
    pub fn from_toml_str(s: &str) -> SwitchyardResult<Self> {
        let config: GuardrailConfig = toml::from_str(s).map_err(|e| SwitchyardError::ConfigError {
            reason: format!("failed to parse guardrail TOML: {}", e),
        })?;
        Self::from_config(config)
    }

    /// Read the file at `path` and parse it as guardrail rules.
    pub fn from_file(path: &Path) -> SwitchyardResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| SwitchyardError::ConfigError {
            reason: format!("failed to read guardrail file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_config(config: GuardrailConfig) -> SwitchyardResult<Self> {
        for (i, rule) in config.rules.iter().enumerate() {
            if rule.keywords.is_empty() {
                return Err(SwitchyardError::config(format!(
                    "guardrail rule '{}' has no keywords",
                    rule.id
                )));
            }
            if config.rules[..i].iter().any(|r| r.id == rule.id) {
                return Err(SwitchyardError::config(format!(
                    "guardrail rule id '{}' is used more than once",
                    rule.id
                )));
            }
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &GuardrailConfig {
        &self.config
    }
}

impl Guardrail for RuleGuardrail {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn check(&self, input: &str) -> SwitchyardResult<GuardrailVerdict> {
        for rule in &self.config.rules {
            let Some(keyword) = rule.matched_keyword(input) else {
                continue;
            };

            debug!(guardrail = %self.config.name, rule_id = %rule.id, keyword, "rule matched");

            let verdict = GuardrailVerdict::from_predicate(
                self.config.name.clone(),
                !rule.verdict.trips(),
                input,
                format!("matched rule '{}': {}", rule.id, rule.description),
            )
            .with_details(json!({ "rule_id": rule.id, "keyword": keyword }));

            info!(
                guardrail = %self.config.name,
                rule_id = %rule.id,
                tripwire_triggered = verdict.tripwire_triggered,
                "guardrail verdict"
            );
            return Ok(verdict);
        }

        let trips = self.config.default.trips();
        if trips {
            warn!(guardrail = %self.config.name, "no guardrail rule matched; tripping by default");
        } else {
            debug!(guardrail = %self.config.name, "no guardrail rule matched; passing by default");
        }

        Ok(GuardrailVerdict::from_predicate(
            self.config.name.clone(),
            !trips,
            input,
            "no rule matched; default verdict applied",
        ))
    }
}
