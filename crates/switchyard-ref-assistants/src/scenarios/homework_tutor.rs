//! Scenario 3: Homework Tutor
//!
//! A triage agent hands homework questions to a subject tutor. Before the
//! triage agent does anything, the "Guardrail check" asks the model whether
//! the input is homework at all; if not, the request is blocked and no
//! tutor runs.
//!
//! The same tutors are also offered as a single-shot routing workflow
//! (math / history / science, default math) behind the same kind of
//! guardrail.

use std::sync::Arc;

use switchyard_contracts::{
    agent::AgentId,
    error::{SwitchyardError, SwitchyardResult},
    generation::GenerationRequest,
    guardrail::{GuardrailVerdict, RunOutcome},
    label::{Label, LabelSet},
    request::{HandlerUpdate, RequestState},
};
use switchyard_core::{
    agent_loop::{AgentDirectory, AgentRunner, AgentSpec},
    classifier::Classifier,
    traits::{GenerationService, Guardrail, Handler, ShapeValidator},
    workflow::RoutingWorkflow,
};
use switchyard_guardrail::{ModelGuardrail, RuleGuardrail};
use switchyard_verify::SchemaValidator;

use crate::model::KeywordModel;

/// Offline keyword rules for the same check the model guardrail performs.
const HOMEWORK_RULES: &str = include_str!("../../guardrails/homework.toml");

pub const TRIAGE_AGENT: &str = "Triage Agent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Math,
    History,
    Science,
}

impl Subject {
    pub fn tutor_name(self) -> &'static str {
        match self {
            Subject::Math => "Math Tutor",
            Subject::History => "History Tutor",
            Subject::Science => "Science Tutor",
        }
    }

    pub fn handoff_description(self) -> &'static str {
        match self {
            Subject::Math => "Specialist agent for math questions",
            Subject::History => "Specialist agent for historical questions",
            Subject::Science => "Specialist agent for science questions",
        }
    }

    pub fn instructions(self) -> &'static str {
        match self {
            Subject::Math => {
                "You provide help with math problems in the style of Isaac Newton. Explain your \
                 reasoning at each step and include examples."
            }
            Subject::History => {
                "You provide assistance with historical queries. Explain important events and \
                 context clearly in the style of a viking storyteller."
            }
            Subject::Science => {
                "You provide assistance with science queries. Explain important events and \
                 context clearly in the style of a mad scientist."
            }
        }
    }

    pub fn tutor(self) -> AgentSpec {
        AgentSpec::new(self.tutor_name(), self.instructions())
            .with_handoff_description(self.handoff_description())
    }
}

impl Label for Subject {
    fn all() -> &'static [Self] {
        &[Subject::Math, Subject::History, Subject::Science]
    }

    fn as_str(&self) -> &'static str {
        match self {
            Subject::Math => "math",
            Subject::History => "history",
            Subject::Science => "science",
        }
    }
}

/// The model-backed "is this homework?" check.
pub fn homework_guardrail(
    service: Arc<dyn GenerationService>,
    validator: Arc<dyn ShapeValidator>,
) -> ModelGuardrail {
    ModelGuardrail::new(
        "Guardrail check",
        "Check if the user is asking about homework.",
        "is_homework",
        service,
        validator,
    )
}

/// The keyword-rule version of the homework check.
pub fn homework_rules() -> SwitchyardResult<RuleGuardrail> {
    RuleGuardrail::from_toml_str(HOMEWORK_RULES)
}

/// Triage plus the three tutors, with `guardrail` on the triage agent.
pub fn tutor_directory(guardrail: Arc<dyn Guardrail>) -> SwitchyardResult<AgentDirectory> {
    let triage = Subject::all().iter().fold(
        AgentSpec::new(
            TRIAGE_AGENT,
            "You determine which agent to use based on the user's homework question.",
        )
        .with_guardrail(guardrail),
        |spec, subject| spec.with_handoff(subject.tutor_name()),
    );

    AgentDirectory::build(
        std::iter::once(triage).chain(Subject::all().iter().map(|s| s.tutor())),
    )
}

/// A tutor as a plain routed handler: one model call with the tutor's
/// instructions.
pub struct TutorHandler {
    subject: Subject,
    service: Arc<dyn GenerationService>,
}

impl TutorHandler {
    pub fn new(subject: Subject, service: Arc<dyn GenerationService>) -> Self {
        Self { subject, service }
    }
}

impl Handler<Subject> for TutorHandler {
    fn name(&self) -> &str {
        self.subject.tutor_name()
    }

    fn handle(&self, state: &RequestState<Subject>) -> SwitchyardResult<HandlerUpdate> {
        let request = GenerationRequest::single_turn(self.subject.instructions(), state.input.clone());
        let response = self.service.generate(&request)?;
        let answer = response.as_text().ok_or_else(|| SwitchyardError::HandlerFailed {
            handler: self.name().to_string(),
            reason: "tutor did not answer in text".to_string(),
        })?;
        Ok(HandlerUpdate::new(answer).with_decision(self.subject.tutor_name()))
    }
}

pub fn subject_labels() -> SwitchyardResult<LabelSet<Subject>> {
    LabelSet::new(Subject::all().iter().copied(), Subject::Math)
}

pub fn tutor_classifier(service: Arc<dyn GenerationService>) -> Classifier {
    Classifier::new(service, "Determine which tutor should answer the user's homework question.")
}

pub fn tutor_router(service: Arc<dyn GenerationService>) -> SwitchyardResult<RoutingWorkflow<Subject>> {
    Subject::all()
        .iter()
        .fold(
            RoutingWorkflow::builder(
                "homework-router",
                tutor_classifier(Arc::clone(&service)),
                subject_labels()?,
            ),
            |builder, &subject| builder.route(subject, TutorHandler::new(subject, Arc::clone(&service))),
        )
        .build()
}

fn print_blocked(verdict: &GuardrailVerdict) {
    println!(
        "  Guardrail blocked this input: {} (guardrail '{}': {})",
        verdict.diagnostics.input, verdict.guardrail, verdict.diagnostics.reasoning
    );
}

/// Run Scenario 3: three questions through the triage agent, then the
/// routing variant behind the keyword guardrail.
pub fn run_scenario() -> SwitchyardResult<()> {
    println!("=== Scenario 3: Homework Tutor ===");
    println!();

    let model: Arc<dyn GenerationService> = Arc::new(KeywordModel::new());
    let validator: Arc<dyn ShapeValidator> = Arc::new(SchemaValidator::new());

    let guardrail = homework_guardrail(Arc::clone(&model), Arc::clone(&validator));
    let directory = tutor_directory(Arc::new(guardrail))?;
    let runner = AgentRunner::new(Arc::clone(&model), validator);
    let triage = AgentId::new(TRIAGE_AGENT);

    println!("  Triage agent with handoffs to {} tutors:", Subject::all().len());
    println!();

    for input in [
        "Why do we feel heat from the sun?",
        "who was the first president of the united states?",
        "Where can I get a car key cut?",
    ] {
        println!("  Question: {}", input);
        match runner.run(&directory, &triage, input)? {
            RunOutcome::Completed(run) => {
                let path: Vec<&str> = run.agent_path().iter().map(|a| a.as_str()).collect();
                println!("  Path:     {}", path.join(" -> "));
                println!("  Answer:   {}", run.final_output);
            }
            RunOutcome::Blocked(verdict) => print_blocked(&verdict),
        }
        println!();
    }

    let rules = homework_rules()?;
    let router = tutor_router(model)?;

    println!("  Routing variant behind the '{}' keyword guardrail:", rules.name());
    println!();

    for input in ["What is 2+2?", "Tell me a joke"] {
        println!("  Question: {}", input);
        match router.run_guarded(&rules, input)? {
            RunOutcome::Completed(response) => {
                println!("  Routed:   {}", response.decision);
                println!("  Answer:   {}", response.output);
            }
            RunOutcome::Blocked(verdict) => print_blocked(&verdict),
        }
        println!();
    }

    println!("  Scenario 3 complete.");
    println!();
    Ok(())
}
