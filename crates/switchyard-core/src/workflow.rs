//! The routing workflow: classify once, run exactly one handler.
//!
//!   START → route_request → handler(label) → END
//!
//! `route_request` is the only branching node. The label→handler table is
//! checked for completeness when the workflow is built, so every label the
//! classifier can return has a handler, including the default label.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use switchyard_contracts::{
    error::{SwitchyardError, SwitchyardResult},
    guardrail::RunOutcome,
    label::{Label, LabelSet},
    request::{HandlerUpdate, RequestState, RoutedResponse},
};

use crate::{
    classifier::Classifier,
    guard::guardrail_then_run,
    traits::{Guardrail, Handler},
};

/// A handler built from a closure.
pub struct FnHandler<F> {
    name: String,
    f: F,
}

impl<F> FnHandler<F> {
    pub fn new<L>(name: impl Into<String>, f: F) -> Self
    where
        L: Label,
        F: Fn(&RequestState<L>) -> SwitchyardResult<HandlerUpdate> + Send + Sync,
    {
        Self { name: name.into(), f }
    }
}

impl<L, F> Handler<L> for FnHandler<F>
where
    L: Label,
    F: Fn(&RequestState<L>) -> SwitchyardResult<HandlerUpdate> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, state: &RequestState<L>) -> SwitchyardResult<HandlerUpdate> {
        (self.f)(state)
    }
}

pub struct RoutingWorkflow<L: Label> {
    name: String,
    classifier: Classifier,
    labels: LabelSet<L>,
    routes: HashMap<L, Arc<dyn Handler<L>>>,
}

impl<L: Label> RoutingWorkflow<L> {
    pub fn builder(
        name: impl Into<String>,
        classifier: Classifier,
        labels: LabelSet<L>,
    ) -> RoutingWorkflowBuilder<L> {
        RoutingWorkflowBuilder {
            name: name.into(),
            classifier,
            labels,
            routes: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &LabelSet<L> {
        &self.labels
    }

    /// Run the workflow on `input`.
    ///
    /// The classifier runs once and exactly one handler runs. A handler
    /// failure is returned unmodified; there is no handler-level retry or
    /// fallback.
    pub fn run(&self, input: &str) -> SwitchyardResult<RoutedResponse<L>> {
        let mut state = RequestState::new(input);
        debug!(workflow = %self.name, "workflow started");

        let label = self.route_request(&mut state)?;
        let handler = self.route_decision(label);

        info!(
            workflow = %self.name,
            label = label.as_str(),
            handler = handler.name(),
            "request routed"
        );

        let update = handler.handle(&state)?;
        state.apply(update);

        debug!(workflow = %self.name, handler = handler.name(), "workflow reached end");

        Ok(RoutedResponse {
            label,
            decision: state
                .decision
                .unwrap_or_else(|| label.as_str().to_string()),
            output: state.output.unwrap_or_default(),
        })
    }

    /// Run `guardrail` first; only if it passes, run the workflow.
    pub fn run_guarded(
        &self,
        guardrail: &dyn Guardrail,
        input: &str,
    ) -> SwitchyardResult<RunOutcome<RoutedResponse<L>>> {
        guardrail_then_run(guardrail, input, |input| self.run(input))
    }

    /// The branching node: classify and record the label.
    fn route_request(&self, state: &mut RequestState<L>) -> SwitchyardResult<L> {
        let label = self.classifier.classify(&state.input, &self.labels)?;
        state.record_label(label);
        Ok(label)
    }

    /// Total mapping from label to handler. The table is complete by
    /// construction; the default handler covers anything else.
    fn route_decision(&self, label: L) -> &Arc<dyn Handler<L>> {
        match self.routes.get(&label) {
            Some(handler) => handler,
            None => &self.routes[&self.labels.default_label()],
        }
    }
}

pub struct RoutingWorkflowBuilder<L: Label> {
    name: String,
    classifier: Classifier,
    labels: LabelSet<L>,
    routes: HashMap<L, Arc<dyn Handler<L>>>,
}

impl<L: Label> RoutingWorkflowBuilder<L> {
    /// Bind `label` to `handler`. Binding a label twice replaces the earlier
    /// handler.
    pub fn route(self, label: L, handler: impl Handler<L> + 'static) -> Self {
        self.route_shared(label, Arc::new(handler))
    }

    pub fn route_shared(mut self, label: L, handler: Arc<dyn Handler<L>>) -> Self {
        self.routes.insert(label, handler);
        self
    }

    /// Finish construction.
    ///
    /// Returns `ConfigError` if any label in the set has no handler, or a
    /// handler is bound to a label outside the set.
    pub fn build(self) -> SwitchyardResult<RoutingWorkflow<L>> {
        for label in self.labels.labels() {
            if !self.routes.contains_key(label) {
                return Err(SwitchyardError::config(format!(
                    "workflow '{}' has no handler bound to label '{}'",
                    self.name,
                    label.as_str()
                )));
            }
        }
        for label in self.routes.keys() {
            if !self.labels.contains(*label) {
                return Err(SwitchyardError::config(format!(
                    "workflow '{}' binds a handler to label '{}' which is not in its label set",
                    self.name,
                    label.as_str()
                )));
            }
        }

        Ok(RoutingWorkflow {
            name: self.name,
            classifier: self.classifier,
            labels: self.labels,
            routes: self.routes,
        })
    }
}
