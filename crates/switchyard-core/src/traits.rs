//! Trait seams for the switchyard orchestration core.
//!
//! - `GenerationService`: untrusted decision source (an LLM backend)
//! - `Tool`: external capability invoked from the agent loop
//! - `Handler`: one branch of a routing workflow
//! - `Guardrail`: pre-flight check that can block a request
//! - `ShapeValidator`: checks values against declared shapes
//! - `TraceWriter`: append-only sink for agent-loop turns
//!
//! Every component takes its collaborators through these traits at
//! construction time; nothing reaches for a global client.

use std::sync::Arc;

use serde_json::Value;

use switchyard_contracts::{
    agent::RunId,
    error::{SwitchyardResult, ToolInvocationError},
    generation::{GenerationRequest, GenerationResponse, ToolDeclaration},
    guardrail::GuardrailVerdict,
    label::Label,
    request::{HandlerUpdate, RequestState},
    shape::{Shape, ValidationReport},
    trace::TurnRecord,
};

/// The language-model backend, treated as an opaque service.
///
/// Each call is a suspend point: it may block on network I/O and may fail
/// with `SwitchyardError::GenerationUnavailable`. Implementations must not
/// retry implicitly; wrap them in `RetryingService` for that.
pub trait GenerationService: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> SwitchyardResult<GenerationResponse>;
}

impl<S: GenerationService + ?Sized> GenerationService for Arc<S> {
    fn generate(&self, request: &GenerationRequest) -> SwitchyardResult<GenerationResponse> {
        (**self).generate(request)
    }
}

/// An invocable tool with a declared input/output shape.
///
/// The agent loop validates arguments against `declaration().input` before
/// calling `invoke`, so implementations may assume well-shaped input.
pub trait Tool: Send + Sync {
    fn declaration(&self) -> &ToolDeclaration;

    fn invoke(&self, arguments: &Value) -> Result<Value, ToolInvocationError>;

    fn name(&self) -> &str {
        &self.declaration().name
    }
}

impl<T: Tool + ?Sized> Tool for Arc<T> {
    fn declaration(&self) -> &ToolDeclaration {
        (**self).declaration()
    }

    fn invoke(&self, arguments: &Value) -> Result<Value, ToolInvocationError> {
        (**self).invoke(arguments)
    }
}

/// One terminal node of a routing workflow.
pub trait Handler<L: Label>: Send + Sync {
    /// Stable name used in logs and error messages.
    fn name(&self) -> &str;

    /// Produce the partial state update for this request. Must set `output`;
    /// may restate `decision`.
    fn handle(&self, state: &RequestState<L>) -> SwitchyardResult<HandlerUpdate>;
}

/// A pre-flight check run strictly before the protected handler or agent.
pub trait Guardrail: Send + Sync {
    fn name(&self) -> &str;

    /// Judge `input`. A verdict with `tripwire_triggered` blocks the request;
    /// an `Err` is a failure of the check itself, not a block.
    fn check(&self, input: &str) -> SwitchyardResult<GuardrailVerdict>;
}

/// Validates a JSON value against a declared `Shape`.
pub trait ShapeValidator: Send + Sync {
    /// Return a report with `passed = false` and populated failures when the
    /// value does not conform. `Err` is reserved for validator malfunction.
    fn validate(&self, value: &Value, shape: &Shape) -> SwitchyardResult<ValidationReport>;
}

/// Append-only sink for agent-loop turns.
///
/// A failed write is fatal for the run and surfaces as
/// `SwitchyardError::TraceWriteFailed`.
pub trait TraceWriter: Send + Sync {
    fn write(&self, record: &TurnRecord) -> SwitchyardResult<()>;

    /// Called once when a run that recorded at least one turn ends,
    /// whether it completed, was blocked, or failed.
    fn finalize(&self, run_id: &RunId) -> SwitchyardResult<()>;
}
