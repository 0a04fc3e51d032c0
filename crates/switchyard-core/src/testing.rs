//! Mock collaborators shared by the unit tests in this crate.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use switchyard_contracts::{
    agent::RunId,
    error::{SwitchyardError, SwitchyardResult, ToolInvocationError},
    generation::{GenerationRequest, GenerationResponse, ToolDeclaration},
    guardrail::GuardrailVerdict,
    shape::{Shape, ValidationFailure, ValidationReport},
    trace::TurnRecord,
};

use crate::traits::{GenerationService, Guardrail, ShapeValidator, Tool, TraceWriter};

/// Replays a fixed script of responses and records every request it saw.
/// Once the script is exhausted it keeps returning the last entry.
pub struct ScriptedService {
    script: Mutex<VecDeque<SwitchyardResult<GenerationResponse>>>,
    last: Mutex<Option<GenerationResponse>>,
    pub requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl ScriptedService {
    pub fn new(script: Vec<GenerationResponse>) -> Self {
        Self::with_results(script.into_iter().map(Ok).collect())
    }

    pub fn with_results(script: Vec<SwitchyardResult<GenerationResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(vec![GenerationResponse::text(text)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl GenerationService for ScriptedService {
    fn generate(&self, request: &GenerationRequest) -> SwitchyardResult<GenerationResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(response)) => {
                *self.last.lock().unwrap() = Some(response.clone());
                Ok(response)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| SwitchyardError::unavailable("script exhausted")),
        }
    }
}

/// A tool that returns a canned value and counts invocations.
pub struct CannedTool {
    declaration: ToolDeclaration,
    result: Result<Value, String>,
    pub calls: Arc<Mutex<Vec<Value>>>,
}

impl CannedTool {
    pub fn new(name: &str, result: Value) -> Self {
        Self::build(name, Ok(result))
    }

    pub fn failing(name: &str, reason: &str) -> Self {
        Self::build(name, Err(reason.to_string()))
    }

    fn build(name: &str, result: Result<Value, String>) -> Self {
        Self {
            declaration: ToolDeclaration {
                name: name.to_string(),
                description: format!("canned {name}"),
                input: Shape::any(format!("{name}-input")),
                output: Shape::any(format!("{name}-output")),
            },
            result,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Tool for CannedTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }

    fn invoke(&self, arguments: &Value) -> Result<Value, ToolInvocationError> {
        self.calls.lock().unwrap().push(arguments.clone());
        self.result.clone().map_err(|reason| ToolInvocationError::Failed {
            tool: self.declaration.name.clone(),
            reason,
        })
    }
}

/// A validator that passes or fails everything.
pub struct FixedValidator {
    pub pass: bool,
}

impl ShapeValidator for FixedValidator {
    fn validate(&self, _value: &Value, _shape: &Shape) -> SwitchyardResult<ValidationReport> {
        if self.pass {
            Ok(ValidationReport::pass())
        } else {
            Ok(ValidationReport {
                passed: false,
                failures: vec![ValidationFailure {
                    rule_id: "json-schema".to_string(),
                    message: "field 'lat' is missing".to_string(),
                }],
            })
        }
    }
}

/// A guardrail whose predicate is fixed, counting how often it ran.
pub struct FixedGuardrail {
    pub holds: bool,
    pub checks: Arc<Mutex<u32>>,
}

impl FixedGuardrail {
    pub fn new(holds: bool) -> Self {
        Self { holds, checks: Arc::new(Mutex::new(0)) }
    }
}

impl Guardrail for FixedGuardrail {
    fn name(&self) -> &str {
        "fixed"
    }

    fn check(&self, input: &str) -> SwitchyardResult<GuardrailVerdict> {
        *self.checks.lock().unwrap() += 1;
        Ok(GuardrailVerdict::from_predicate(
            "fixed",
            self.holds,
            input,
            if self.holds { "predicate holds" } else { "predicate fails" },
        ))
    }
}

/// A trace writer that records everything in memory.
#[derive(Default)]
pub struct RecordingTrace {
    pub records: Arc<Mutex<Vec<TurnRecord>>>,
    pub finalized: Arc<Mutex<Vec<RunId>>>,
}

impl TraceWriter for RecordingTrace {
    fn write(&self, record: &TurnRecord) -> SwitchyardResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn finalize(&self, run_id: &RunId) -> SwitchyardResult<()> {
        self.finalized.lock().unwrap().push(*run_id);
        Ok(())
    }
}
