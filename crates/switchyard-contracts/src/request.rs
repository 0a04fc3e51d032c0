//! Routing workflow state.
//!
//! `RequestState` is created once per workflow invocation and mutated only by
//! the nodes of that invocation. `RoutedResponse` is the frozen view the
//! caller receives once the workflow reaches its end node.

use crate::label::Label;

/// Mutable record threaded through one routing workflow invocation.
#[derive(Debug, Clone)]
pub struct RequestState<L: Label> {
    /// The caller's free-form input. Never modified.
    pub input: String,
    /// Label written by the routing node. Handlers never change it.
    pub label: Option<L>,
    /// Displayed classification. Set to the label's wire form by the routing
    /// node; a handler may overwrite it with a restatement.
    pub decision: Option<String>,
    /// Handler output. Empty until a handler has run.
    pub output: Option<String>,
}

impl<L: Label> RequestState<L> {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            label: None,
            decision: None,
            output: None,
        }
    }

    /// Record the routing node's classification.
    pub fn record_label(&mut self, label: L) {
        self.label = Some(label);
        self.decision = Some(label.as_str().to_string());
    }

    /// Merge a handler's partial update into the state.
    pub fn apply(&mut self, update: HandlerUpdate) {
        self.output = Some(update.output);
        if let Some(decision) = update.decision {
            self.decision = Some(decision);
        }
    }
}

/// Partial update returned by a handler: it must set `output` and may
/// restate `decision`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerUpdate {
    pub output: String,
    pub decision: Option<String>,
}

impl HandlerUpdate {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            decision: None,
        }
    }

    /// Overwrite the displayed decision, e.g. `"News"` instead of `"news"`.
    pub fn with_decision(mut self, decision: impl Into<String>) -> Self {
        self.decision = Some(decision.into());
        self
    }
}

/// Terminal result of a routing workflow invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedResponse<L: Label> {
    /// The label the classifier produced (after default fallback).
    pub label: L,
    /// Displayed decision, possibly restated by the handler.
    pub decision: String,
    /// The handler's output text.
    pub output: String,
}
