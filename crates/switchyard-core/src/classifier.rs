//! Best-effort classification of free-form input into a closed label set.
//!
//! The classifier asks the generation service to pick one label, normalizes
//! whatever comes back, and maps anything unrecognized to the set's default
//! label. An ambiguous answer is never an error; only a failure to reach
//! the service is.

use std::sync::Arc;

use tracing::{debug, warn};

use switchyard_contracts::{
    error::SwitchyardResult,
    generation::GenerationRequest,
    label::{Label, LabelSet},
};

use crate::traits::GenerationService;

pub struct Classifier {
    service: Arc<dyn GenerationService>,
    /// Task-specific guidance, e.g. "Route the input based on whether the
    /// user is asking about current events."
    guidance: String,
}

impl Classifier {
    pub fn new(service: Arc<dyn GenerationService>, guidance: impl Into<String>) -> Self {
        Self {
            service,
            guidance: guidance.into(),
        }
    }

    /// The full system instruction sent for `labels`.
    pub fn instruction<L: Label>(&self, labels: &LabelSet<L>) -> String {
        format!(
            "{}\nRespond with exactly one of: {}. If unsure, respond with '{}'.",
            self.guidance.trim_end(),
            labels.describe(),
            labels.default_label().as_str()
        )
    }

    /// Classify `input`. The result is always a member of `labels`.
    ///
    /// # Errors
    ///
    /// Only `GenerationUnavailable` (or whatever the service reports). No
    /// retry is attempted here.
    pub fn classify<L: Label>(&self, input: &str, labels: &LabelSet<L>) -> SwitchyardResult<L> {
        let request = GenerationRequest::single_turn(self.instruction(labels), input);
        let response = self.service.generate(&request)?;

        let resolved = response.as_text().and_then(|text| labels.resolve(text));
        let label = match resolved {
            Some(label) => label,
            None => {
                warn!(
                    response = ?response,
                    default = labels.default_label().as_str(),
                    "classifier output did not name a declared label, using default"
                );
                labels.default_label()
            }
        };

        debug!(label = label.as_str(), "input classified");
        Ok(label)
    }
}
