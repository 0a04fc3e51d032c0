//! The tool-calling agent loop.
//!
//! Each deliberate step sends the active agent's instructions, the
//! conversation so far, its tool declarations and its handoff edges to the
//! generation service, then acts on the single response:
//!
//!   Text      → final answer, run ends
//!   ToolCall  → validate, invoke, append the result, next step
//!   Handoff   → check the edge, switch the active agent, next step
//!
//! Every step counts against `max_turns`, whichever agent takes it. An
//! agent's guardrails run once, on the original input, the first time that
//! agent becomes active and before it is asked anything.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use switchyard_contracts::{
    agent::{AgentId, AgentRun, AgentTurn, RunId},
    error::{SwitchyardError, SwitchyardResult},
    generation::{GenerationRequest, GenerationResponse, HandoffDeclaration, Message, Role},
    guardrail::{GuardrailVerdict, RunOutcome},
    trace::TurnRecord,
};

use crate::{
    cancel::{CancellationToken, Checkpoint},
    config::{RuntimeConfig, DEFAULT_MAX_TURNS},
    guard::first_tripped,
    registry::ToolRegistry,
    retry::RetryingService,
    traits::{GenerationService, Guardrail, ShapeValidator, TraceWriter},
};

/// Static definition of one agent.
#[derive(Clone)]
pub struct AgentSpec {
    pub id: AgentId,
    pub instructions: String,
    /// Shown to other agents that may hand off to this one.
    pub handoff_description: String,
    pub tools: ToolRegistry,
    pub handoffs: Vec<AgentId>,
    pub guardrails: Vec<Arc<dyn Guardrail>>,
}

impl AgentSpec {
    pub fn new(id: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            id: AgentId::new(id),
            instructions: instructions.into(),
            handoff_description: String::new(),
            tools: ToolRegistry::new(),
            handoffs: Vec::new(),
            guardrails: Vec::new(),
        }
    }

    pub fn with_handoff_description(mut self, description: impl Into<String>) -> Self {
        self.handoff_description = description.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_handoff(mut self, target: impl Into<String>) -> Self {
        self.handoffs.push(AgentId::new(target));
        self
    }

    pub fn with_guardrail(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.guardrails.push(guardrail);
        self
    }

    pub fn may_hand_off_to(&self, target: &AgentId) -> bool {
        self.handoffs.contains(target)
    }
}

impl fmt::Debug for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSpec")
            .field("id", &self.id)
            .field("tools", &self.tools)
            .field("handoffs", &self.handoffs)
            .field(
                "guardrails",
                &self.guardrails.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// The agents a run may visit, keyed by id.
///
/// Every declared handoff edge is checked to point at a member when the
/// directory is built.
#[derive(Debug, Clone)]
pub struct AgentDirectory {
    agents: BTreeMap<AgentId, AgentSpec>,
}

impl AgentDirectory {
    /// # Errors
    ///
    /// `ConfigError` on a duplicate agent id or a handoff edge whose target
    /// is not in `specs`.
    pub fn build(specs: impl IntoIterator<Item = AgentSpec>) -> SwitchyardResult<Self> {
        let mut agents = BTreeMap::new();
        for spec in specs {
            if agents.contains_key(&spec.id) {
                return Err(SwitchyardError::config(format!(
                    "agent '{}' is defined more than once",
                    spec.id
                )));
            }
            agents.insert(spec.id.clone(), spec);
        }
        for spec in agents.values() {
            if let Some(missing) = spec.handoffs.iter().find(|t| !agents.contains_key(*t)) {
                return Err(SwitchyardError::config(format!(
                    "agent '{}' declares a handoff to unknown agent '{}'",
                    spec.id, missing
                )));
            }
        }
        Ok(Self { agents })
    }

    /// A directory holding one agent with no handoffs.
    pub fn single(spec: AgentSpec) -> SwitchyardResult<Self> {
        Self::build([spec])
    }

    pub fn get(&self, id: &AgentId) -> SwitchyardResult<&AgentSpec> {
        self.agents
            .get(id)
            .ok_or_else(|| SwitchyardError::UnknownAgent { agent: id.to_string() })
    }

    pub fn ids(&self) -> impl Iterator<Item = &AgentId> {
        self.agents.keys()
    }

    /// The handoff edges of `spec`, as presented to the generation service.
    pub fn handoff_declarations(&self, spec: &AgentSpec) -> Vec<HandoffDeclaration> {
        spec.handoffs
            .iter()
            .filter_map(|target| self.agents.get(target))
            .map(|t| HandoffDeclaration {
                target: t.id.clone(),
                description: t.handoff_description.clone(),
            })
            .collect()
    }
}

/// Drives agent-loop runs against one generation service.
pub struct AgentRunner {
    service: Arc<dyn GenerationService>,
    validator: Arc<dyn ShapeValidator>,
    max_turns: u32,
    trace: Option<Arc<dyn TraceWriter>>,
    cancellation: Option<CancellationToken>,
}

impl AgentRunner {
    pub fn new(service: Arc<dyn GenerationService>, validator: Arc<dyn ShapeValidator>) -> Self {
        Self {
            service,
            validator,
            max_turns: DEFAULT_MAX_TURNS,
            trace: None,
            cancellation: None,
        }
    }

    /// Apply `config`: the turn bound, and a retry wrapper around the service
    /// when retries are enabled.
    pub fn from_config(
        service: Arc<dyn GenerationService>,
        validator: Arc<dyn ShapeValidator>,
        config: &RuntimeConfig,
    ) -> Self {
        let service: Arc<dyn GenerationService> = if config.retry.max_retries > 0 {
            Arc::new(RetryingService::new(service, config.retry.clone()))
        } else {
            service
        };
        Self::new(service, validator).with_max_turns(config.agent_loop.max_turns)
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_trace(mut self, trace: Arc<dyn TraceWriter>) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    /// Run a single agent with no handoffs.
    pub fn run_agent(&self, spec: AgentSpec, input: &str) -> SwitchyardResult<RunOutcome<AgentRun>> {
        let entry = spec.id.clone();
        let directory = AgentDirectory::single(spec)?;
        self.run(&directory, &entry, input)
    }

    /// Run the loop starting at `entry` until a final answer.
    ///
    /// Whenever at least one turn was traced, the trace is finalized however
    /// the run ends.
    ///
    /// # Errors
    ///
    /// Tool failures, an unavailable service, an undeclared handoff, an
    /// exhausted turn bound, a failed trace write, or cancellation end the
    /// run with an error. A tripped guardrail ends it with
    /// `RunOutcome::Blocked`.
    pub fn run(
        &self,
        directory: &AgentDirectory,
        entry: &AgentId,
        input: &str,
    ) -> SwitchyardResult<RunOutcome<AgentRun>> {
        let run_id = RunId::new();
        let mut recorded = 0;
        let outcome = self.drive(run_id, directory, entry, input, &mut recorded);
        if recorded > 0 {
            self.close_trace(run_id, outcome.is_ok())?;
        }
        outcome
    }

    fn drive(
        &self,
        run_id: RunId,
        directory: &AgentDirectory,
        entry: &AgentId,
        input: &str,
        recorded: &mut usize,
    ) -> SwitchyardResult<RunOutcome<AgentRun>> {
        let mut active = directory.get(entry)?;
        let mut checked: BTreeSet<AgentId> = BTreeSet::new();

        info!(run_id = %run_id, agent = %active.id, max_turns = self.max_turns, "agent run started");

        if let Some(verdict) = self.activate(active, input, &mut checked)? {
            return Ok(RunOutcome::Blocked(verdict));
        }

        let mut messages = vec![Message::user(input)];
        let mut trace: Vec<AgentTurn> = Vec::new();

        for step in 0..u64::from(self.max_turns) {
            self.checkpoint()?;

            let request = GenerationRequest::new(active.instructions.clone(), messages.clone())
                .with_tools(active.tools.declarations())
                .with_handoffs(directory.handoff_declarations(active));

            debug!(run_id = %run_id, step, agent = %active.id, "requesting next action");

            match self.service.generate(&request)? {
                GenerationResponse::Text { text } => {
                    let turn = AgentTurn::FinalAnswer { agent: active.id.clone(), output: text.clone() };
                    self.record(run_id, step, &turn, recorded)?;
                    trace.push(turn);

                    info!(run_id = %run_id, agent = %active.id, steps = step + 1, "agent run completed");
                    return Ok(RunOutcome::Completed(AgentRun {
                        run_id,
                        final_output: text,
                        final_agent: active.id.clone(),
                        trace,
                    }));
                }

                GenerationResponse::ToolCall { call } => {
                    self.checkpoint()?;
                    let result = active.tools.invoke(&call, self.validator.as_ref())?;

                    info!(run_id = %run_id, step, agent = %active.id, tool = %call.name, "tool invoked");

                    messages.push(Message {
                        role: Role::Assistant,
                        content: format!("call {}({})", call.name, call.arguments),
                        name: Some(active.id.to_string()),
                    });
                    messages.push(Message::tool(call.name.clone(), render_tool_result(&result)));

                    let turn = AgentTurn::ToolInvocation {
                        agent: active.id.clone(),
                        tool: call.name,
                        arguments: call.arguments,
                        result,
                    };
                    self.record(run_id, step, &turn, recorded)?;
                    trace.push(turn);
                }

                GenerationResponse::Handoff { target } => {
                    if !active.may_hand_off_to(&target) {
                        warn!(run_id = %run_id, from = %active.id, to = %target, "undeclared handoff rejected");
                        return Err(SwitchyardError::InvalidHandoff {
                            from: active.id.to_string(),
                            to: target.to_string(),
                        });
                    }
                    let next = directory.get(&target)?;

                    info!(run_id = %run_id, step, from = %active.id, to = %next.id, "handoff");

                    messages.push(Message {
                        role: Role::Assistant,
                        content: format!("Transferred to {}", next.id),
                        name: Some(active.id.to_string()),
                    });

                    let turn = AgentTurn::Handoff { from: active.id.clone(), to: next.id.clone() };
                    self.record(run_id, step, &turn, recorded)?;
                    trace.push(turn);
                    active = next;

                    if let Some(verdict) = self.activate(active, input, &mut checked)? {
                        return Ok(RunOutcome::Blocked(verdict));
                    }
                }
            }
        }

        warn!(run_id = %run_id, max_turns = self.max_turns, "turn limit reached without a final answer");
        Err(SwitchyardError::TurnLimitExceeded { max_turns: self.max_turns })
    }

    /// Run `agent`'s guardrails if this is the first time it is active.
    fn activate(
        &self,
        agent: &AgentSpec,
        input: &str,
        checked: &mut BTreeSet<AgentId>,
    ) -> SwitchyardResult<Option<GuardrailVerdict>> {
        if !checked.insert(agent.id.clone()) {
            return Ok(None);
        }
        self.checkpoint()?;
        first_tripped(&agent.guardrails, input)
    }

    fn record(
        &self,
        run_id: RunId,
        step: u64,
        turn: &AgentTurn,
        recorded: &mut usize,
    ) -> SwitchyardResult<()> {
        if let Some(writer) = &self.trace {
            writer.write(&TurnRecord::new(run_id, step, turn.clone()))?;
            *recorded += 1;
        }
        Ok(())
    }

    /// Finalize the run's trace. A finalize failure after a failed run is
    /// logged so the run's own error is the one returned.
    fn close_trace(&self, run_id: RunId, run_succeeded: bool) -> SwitchyardResult<()> {
        let Some(writer) = &self.trace else {
            return Ok(());
        };
        match writer.finalize(&run_id) {
            Ok(()) => Ok(()),
            Err(e) if run_succeeded => Err(e),
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "could not finalize trace of a failed run");
                Ok(())
            }
        }
    }

    fn checkpoint(&self) -> SwitchyardResult<()> {
        match &self.cancellation {
            Some(token) => token.checkpoint(),
            None => Ok(()),
        }
    }
}

/// String results go back to the service verbatim; anything else as JSON.
fn render_tool_result(result: &Value) -> String {
    match result {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use switchyard_contracts::{
        agent::{AgentId, AgentTurn},
        error::{SwitchyardError, ToolInvocationError},
        generation::{GenerationResponse, Role, ToolDeclaration},
        shape::Shape,
    };

    use super::{AgentDirectory, AgentRunner, AgentSpec};
    use crate::cancel::CancellationToken;
    use crate::config::RuntimeConfig;
    use crate::registry::ToolRegistry;
    use crate::testing::{CannedTool, FixedGuardrail, FixedValidator, RecordingTrace, ScriptedService};
    use crate::traits::Tool;

    /// Two agents that may hand off to each other, each with its own
    /// guardrail.
    fn ping_pong(ping: FixedGuardrail, pong: FixedGuardrail) -> AgentDirectory {
        AgentDirectory::build([
            AgentSpec::new("Ping", "Pass it on.").with_handoff("Pong").with_guardrail(Arc::new(ping)),
            AgentSpec::new("Pong", "Pass it back.").with_handoff("Ping").with_guardrail(Arc::new(pong)),
        ])
        .unwrap()
    }

    /// Cancels the shared token from inside its own invocation.
    struct CancellingTool {
        declaration: ToolDeclaration,
        token: CancellationToken,
    }

    impl Tool for CancellingTool {
        fn declaration(&self) -> &ToolDeclaration {
            &self.declaration
        }

        fn invoke(&self, _arguments: &Value) -> Result<Value, ToolInvocationError> {
            self.token.cancel();
            Ok(json!("done"))
        }
    }

    fn runner(service: ScriptedService) -> AgentRunner {
        AgentRunner::new(Arc::new(service), Arc::new(FixedValidator { pass: true }))
    }

    fn weather_agent(tool: CannedTool) -> AgentSpec {
        AgentSpec::new("Weather Agent", "Report the weather.")
            .with_tools(ToolRegistry::new().with(tool).unwrap())
    }

    fn tutors(math_guardrail: Option<FixedGuardrail>) -> AgentDirectory {
        let mut math = AgentSpec::new("Math Tutor", "Explain math step by step.")
            .with_handoff_description("Specialist agent for math questions");
        if let Some(g) = math_guardrail {
            math = math.with_guardrail(Arc::new(g));
        }
        let triage = AgentSpec::new("Triage Agent", "Pick the right tutor.")
            .with_handoff("Math Tutor");
        let history = AgentSpec::new("History Tutor", "Explain history.");
        AgentDirectory::build([triage, math, history]).unwrap()
    }

    #[test]
    fn immediate_final_answer_takes_one_step() {
        let service = ScriptedService::text("Hello!");
        let requests = service.requests.clone();
        let outcome = runner(service)
            .run_agent(AgentSpec::new("Greeter", "Say hello."), "hi")
            .unwrap();

        let run = outcome.completed().unwrap();
        assert_eq!(run.final_output, "Hello!");
        assert_eq!(run.steps(), 1);
        assert_eq!(run.tool_turns().count(), 0);
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn tool_result_is_fed_back_before_the_next_step() {
        let tool = CannedTool::new("fetch_weather", json!("Sunny, 22C"));
        let calls = tool.calls.clone();
        let service = ScriptedService::new(vec![
            GenerationResponse::tool_call("fetch_weather", json!({ "location": { "lat": 1.0, "long": 2.0 } })),
            GenerationResponse::text("It is sunny and 22C."),
        ]);
        let requests = service.requests.clone();

        let outcome = runner(service).run_agent(weather_agent(tool), "Weather?").unwrap();
        let run = outcome.completed().unwrap();

        assert_eq!(run.steps(), 2);
        assert_eq!(run.tool_turns().count(), 1);
        assert_eq!(calls.lock().unwrap().len(), 1);

        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].tools.len(), 1);
        let results: Vec<_> = requests[1].tool_results().collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "Sunny, 22C");
        assert_eq!(results[0].name.as_deref(), Some("fetch_weather"));
        assert_eq!(requests[1].original_input(), Some("Weather?"));
    }

    #[test]
    fn structured_tool_results_are_sent_as_json() {
        let tool = CannedTool::new("get_my_location", json!({ "lat": 1.5, "long": 2.5 }));
        let service = ScriptedService::new(vec![
            GenerationResponse::tool_call("get_my_location", json!({})),
            GenerationResponse::text("done"),
        ]);
        let requests = service.requests.clone();

        runner(service).run_agent(weather_agent(tool), "Where am I?").unwrap();

        let requests = requests.lock().unwrap();
        let result = requests[1].messages.iter().find(|m| m.role == Role::Tool).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(parsed["lat"], 1.5);
    }

    #[test]
    fn unknown_tool_stops_the_run() {
        let service = ScriptedService::new(vec![
            GenerationResponse::tool_call("teleport", json!({})),
            GenerationResponse::text("never"),
        ]);
        let requests = service.requests.clone();

        let err = runner(service)
            .run_agent(weather_agent(CannedTool::new("fetch_weather", json!("x"))), "go")
            .unwrap_err();

        assert!(matches!(
            err,
            SwitchyardError::ToolInvocation(ToolInvocationError::UnknownTool { .. })
        ));
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn invalid_arguments_stop_the_run_without_invoking() {
        let tool = CannedTool::new("fetch_weather", json!("x"));
        let calls = tool.calls.clone();
        let service = ScriptedService::new(vec![GenerationResponse::tool_call("fetch_weather", json!({}))]);
        let runner = AgentRunner::new(Arc::new(service), Arc::new(FixedValidator { pass: false }));

        let err = runner.run_agent(weather_agent(tool), "go").unwrap_err();
        assert!(matches!(
            err,
            SwitchyardError::ToolInvocation(ToolInvocationError::InvalidArguments { .. })
        ));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn failing_tool_stops_the_run() {
        let service = ScriptedService::new(vec![GenerationResponse::tool_call("fetch_weather", json!({}))]);
        let err = runner(service)
            .run_agent(weather_agent(CannedTool::failing("fetch_weather", "HTTP 503")), "go")
            .unwrap_err();
        assert!(err.is_tool_error());
    }

    #[test]
    fn generation_failure_is_propagated() {
        let service = ScriptedService::with_results(vec![Err(SwitchyardError::unavailable("timeout"))]);
        let err = runner(service)
            .run_agent(AgentSpec::new("Greeter", "Say hello."), "hi")
            .unwrap_err();
        assert!(err.is_generation_error());
    }

    #[test]
    fn turn_bound_is_enforced() {
        let tool = CannedTool::new("fetch_weather", json!("x"));
        let calls = tool.calls.clone();
        let service = ScriptedService::new(vec![GenerationResponse::tool_call("fetch_weather", json!({}))]);
        let requests = service.requests.clone();

        let err = runner(service)
            .with_max_turns(3)
            .run_agent(weather_agent(tool), "loop forever")
            .unwrap_err();

        assert!(matches!(err, SwitchyardError::TurnLimitExceeded { max_turns: 3 }));
        assert_eq!(requests.lock().unwrap().len(), 3);
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn declared_handoff_switches_the_active_agent() {
        let service = ScriptedService::new(vec![
            GenerationResponse::handoff("Math Tutor"),
            GenerationResponse::text("2 + 2 = 4"),
        ]);
        let requests = service.requests.clone();
        let directory = tutors(None);

        let outcome = runner(service)
            .run(&directory, &AgentId::new("Triage Agent"), "What is 2+2?")
            .unwrap();
        let run = outcome.completed().unwrap();

        assert_eq!(run.final_agent, AgentId::new("Math Tutor"));
        assert_eq!(
            run.agent_path(),
            vec![&AgentId::new("Triage Agent"), &AgentId::new("Math Tutor")]
        );
        assert_eq!(run.steps(), 2);

        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].handoffs.len(), 1);
        assert_eq!(requests[0].handoffs[0].description, "Specialist agent for math questions");
        assert_eq!(requests[1].instructions, "Explain math step by step.");
    }

    #[test]
    fn undeclared_handoff_is_rejected() {
        let service = ScriptedService::new(vec![GenerationResponse::handoff("History Tutor")]);
        let err = runner(service)
            .run(&tutors(None), &AgentId::new("Triage Agent"), "When was Rome founded?")
            .unwrap_err();
        match err {
            SwitchyardError::InvalidHandoff { from, to } => {
                assert_eq!(from, "Triage Agent");
                assert_eq!(to, "History Tutor");
            }
            other => panic!("expected InvalidHandoff, got {other:?}"),
        }
    }

    #[test]
    fn directory_rejects_dangling_edges_and_duplicates() {
        let dangling = AgentSpec::new("Triage Agent", "").with_handoff("Nobody");
        assert!(matches!(
            AgentDirectory::build([dangling]).unwrap_err(),
            SwitchyardError::ConfigError { .. }
        ));

        let dup = AgentDirectory::build([AgentSpec::new("A", ""), AgentSpec::new("A", "")]);
        assert!(dup.is_err());
    }

    #[test]
    fn unknown_entry_agent_is_reported() {
        let err = runner(ScriptedService::text("x"))
            .run(&tutors(None), &AgentId::new("Science Tutor"), "hi")
            .unwrap_err();
        assert!(matches!(err, SwitchyardError::UnknownAgent { .. }));
    }

    #[test]
    fn entry_guardrail_blocks_before_any_generation() {
        let guardrail = FixedGuardrail::new(false);
        let checks = guardrail.checks.clone();
        let service = ScriptedService::text("never");
        let requests = service.requests.clone();
        let agent = AgentSpec::new("Greeter", "Say hello.").with_guardrail(Arc::new(guardrail));

        let outcome = runner(service).run_agent(agent, "hi").unwrap();

        let verdict = outcome.blocked().unwrap();
        assert!(verdict.tripwire_triggered);
        assert_eq!(verdict.diagnostics.input, "hi");
        assert_eq!(*checks.lock().unwrap(), 1);
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn handoff_target_guardrail_checks_the_original_input() {
        let guardrail = FixedGuardrail::new(false);
        let checks = guardrail.checks.clone();
        let service = ScriptedService::new(vec![GenerationResponse::handoff("Math Tutor")]);
        let requests = service.requests.clone();

        let outcome = runner(service)
            .run(&tutors(Some(guardrail)), &AgentId::new("Triage Agent"), "Tell me a joke")
            .unwrap();

        let verdict = outcome.blocked().unwrap();
        assert_eq!(verdict.diagnostics.input, "Tell me a joke");
        assert_eq!(*checks.lock().unwrap(), 1);
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn cancelled_run_never_reaches_the_service() {
        let token = CancellationToken::new();
        token.cancel();
        let service = ScriptedService::text("never");
        let requests = service.requests.clone();

        let err = runner(service)
            .with_cancellation(token)
            .run_agent(AgentSpec::new("Greeter", "Say hello."), "hi")
            .unwrap_err();

        assert!(matches!(err, SwitchyardError::Cancelled));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn every_turn_is_traced_and_the_run_finalized() {
        let trace = RecordingTrace::default();
        let records = trace.records.clone();
        let finalized = trace.finalized.clone();
        let service = ScriptedService::new(vec![
            GenerationResponse::tool_call("fetch_weather", json!({})),
            GenerationResponse::text("Sunny."),
        ]);

        let outcome = runner(service)
            .with_trace(Arc::new(trace))
            .run_agent(weather_agent(CannedTool::new("fetch_weather", json!("Sunny"))), "Weather?")
            .unwrap();
        let run = outcome.completed().unwrap();

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].step, 0);
        assert!(records[0].turn.is_tool_invocation());
        assert!(matches!(records[1].turn, AgentTurn::FinalAnswer { .. }));
        assert!(records.iter().all(|r| r.run_id == run.run_id));
        assert_eq!(*finalized.lock().unwrap(), vec![run.run_id]);
    }

    #[test]
    fn config_sets_the_turn_bound() {
        let config = RuntimeConfig::from_toml_str("[agent_loop]\nmax_turns = 2\n").unwrap();
        let runner = AgentRunner::from_config(
            Arc::new(ScriptedService::text("x")),
            Arc::new(FixedValidator { pass: true }),
            &config,
        );
        assert_eq!(runner.max_turns(), 2);
    }

    #[test]
    fn handoffs_do_not_reset_the_turn_bound() {
        let script = (0..10)
            .map(|i| GenerationResponse::handoff(if i % 2 == 0 { "Pong" } else { "Ping" }))
            .collect();
        let service = ScriptedService::new(script);
        let requests = service.requests.clone();

        let err = runner(service)
            .with_max_turns(4)
            .run(
                &ping_pong(FixedGuardrail::new(true), FixedGuardrail::new(true)),
                &AgentId::new("Ping"),
                "go",
            )
            .unwrap_err();

        assert!(matches!(err, SwitchyardError::TurnLimitExceeded { max_turns: 4 }));
        assert_eq!(requests.lock().unwrap().len(), 4);
    }

    #[test]
    fn guardrail_runs_once_per_agent_even_when_control_returns() {
        let ping = FixedGuardrail::new(true);
        let pong = FixedGuardrail::new(true);
        let ping_checks = ping.checks.clone();
        let pong_checks = pong.checks.clone();
        let service = ScriptedService::new(vec![
            GenerationResponse::handoff("Pong"),
            GenerationResponse::handoff("Ping"),
            GenerationResponse::handoff("Pong"),
            GenerationResponse::text("back and forth"),
        ]);

        let outcome = runner(service)
            .run(&ping_pong(ping, pong), &AgentId::new("Ping"), "go")
            .unwrap();

        let run = outcome.completed().unwrap();
        assert_eq!(run.agent_path().len(), 4);
        assert_eq!(*ping_checks.lock().unwrap(), 1);
        assert_eq!(*pong_checks.lock().unwrap(), 1);
    }

    #[test]
    fn cancellation_during_a_tool_call_stops_before_the_next_step() {
        let token = CancellationToken::new();
        let tool = CancellingTool {
            declaration: ToolDeclaration {
                name: "slow_lookup".to_string(),
                description: "cancels while running".to_string(),
                input: Shape::any("slow-lookup-input"),
                output: Shape::any("slow-lookup-output"),
            },
            token: token.clone(),
        };
        let service = ScriptedService::new(vec![
            GenerationResponse::tool_call("slow_lookup", json!({})),
            GenerationResponse::text("never"),
        ]);
        let requests = service.requests.clone();
        let agent = AgentSpec::new("Looker", "Look it up.")
            .with_tools(ToolRegistry::new().with(tool).unwrap());

        let err = runner(service)
            .with_cancellation(token)
            .run_agent(agent, "go")
            .unwrap_err();

        assert!(matches!(err, SwitchyardError::Cancelled));
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn failed_run_still_finalizes_its_trace() {
        let trace = RecordingTrace::default();
        let records = trace.records.clone();
        let finalized = trace.finalized.clone();
        let service = ScriptedService::new(vec![
            GenerationResponse::tool_call("fetch_weather", json!({})),
            GenerationResponse::tool_call("teleport", json!({})),
        ]);

        let err = runner(service)
            .with_trace(Arc::new(trace))
            .run_agent(weather_agent(CannedTool::new("fetch_weather", json!("Sunny"))), "Weather?")
            .unwrap_err();

        assert!(err.is_tool_error());
        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(*finalized.lock().unwrap(), vec![records[0].run_id]);
    }

    #[test]
    fn run_that_traced_nothing_is_not_finalized() {
        let trace = RecordingTrace::default();
        let finalized = trace.finalized.clone();
        let service = ScriptedService::with_results(vec![Err(SwitchyardError::unavailable("timeout"))]);

        let err = runner(service)
            .with_trace(Arc::new(trace))
            .run_agent(AgentSpec::new("Greeter", "Say hello."), "hi")
            .unwrap_err();

        assert!(err.is_generation_error());
        assert!(finalized.lock().unwrap().is_empty());
    }

    #[test]
    fn block_after_a_handoff_finalizes_the_trace() {
        let trace = RecordingTrace::default();
        let finalized = trace.finalized.clone();
        let service = ScriptedService::new(vec![GenerationResponse::handoff("Math Tutor")]);

        let outcome = runner(service)
            .with_trace(Arc::new(trace))
            .run(&tutors(Some(FixedGuardrail::new(false))), &AgentId::new("Triage Agent"), "Tell me a joke")
            .unwrap();

        assert!(outcome.is_blocked());
        assert_eq!(finalized.lock().unwrap().len(), 1);
    }
}
