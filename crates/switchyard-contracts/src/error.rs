//! Error types for the switchyard orchestration core.
//!
//! All fallible operations return `SwitchyardResult<T>`. Two conditions are
//! deliberately absent from this enum: an ambiguous classification (recovered
//! to the default label) and a tripped guardrail (reported as
//! `RunOutcome::Blocked`, not as a failure).

use thiserror::Error;

/// Failure while invoking a tool from inside the agent loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolInvocationError {
    /// The generation service asked for a tool that is not in the registry.
    #[error("tool '{tool}' is not registered")]
    UnknownTool { tool: String },

    /// The supplied arguments do not match the tool's declared input shape.
    #[error("invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The tool ran and failed, including transport failures it reports.
    #[error("tool '{tool}' failed: {reason}")]
    Failed { tool: String, reason: String },

    /// The tool returned a value that does not match its declared output
    /// shape.
    #[error("tool '{tool}' returned an invalid result: {reason}")]
    InvalidResult { tool: String, reason: String },
}

impl ToolInvocationError {
    /// Name of the tool involved in the failure.
    pub fn tool(&self) -> &str {
        match self {
            Self::UnknownTool { tool }
            | Self::InvalidArguments { tool, .. }
            | Self::Failed { tool, .. }
            | Self::InvalidResult { tool, .. } => tool,
        }
    }
}

/// The unified error type for the switchyard runtime.
#[derive(Debug, Error)]
pub enum SwitchyardError {
    /// Transport or timeout failure talking to the generation service.
    #[error("generation service unavailable: {reason}")]
    GenerationUnavailable { reason: String },

    /// Unknown tool, argument-shape mismatch, or a failing tool.
    #[error(transparent)]
    ToolInvocation(#[from] ToolInvocationError),

    /// The active agent tried to hand off along an undeclared edge.
    #[error("agent '{from}' may not hand off to '{to}'")]
    InvalidHandoff { from: String, to: String },

    /// An agent id was referenced that is not in the agent directory.
    #[error("agent '{agent}' is not registered")]
    UnknownAgent { agent: String },

    /// The agent loop ran out of deliberate steps before a final answer.
    #[error("agent loop exceeded {max_turns} turns without a final answer")]
    TurnLimitExceeded { max_turns: u32 },

    /// The trace writer could not persist a turn record.
    ///
    /// Treated as fatal: a turn that cannot be traced does not proceed.
    #[error("trace write failed: {reason}")]
    TraceWriteFailed { reason: String },

    /// A routed handler failed. The workflow propagates this unmodified.
    #[error("handler '{handler}' failed: {reason}")]
    HandlerFailed { handler: String, reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A cancellation checkpoint observed a cancelled token.
    #[error("run cancelled")]
    Cancelled,
}

impl SwitchyardError {
    /// Shorthand for `GenerationUnavailable`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::GenerationUnavailable { reason: reason.into() }
    }

    /// Shorthand for `ConfigError`.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::ConfigError { reason: reason.into() }
    }

    /// True for every tool-invocation failure.
    pub fn is_tool_error(&self) -> bool {
        matches!(self, Self::ToolInvocation(_))
    }

    /// True when the generation service itself could not be reached.
    pub fn is_generation_error(&self) -> bool {
        matches!(self, Self::GenerationUnavailable { .. })
    }
}

/// Convenience alias used throughout the switchyard crates.
pub type SwitchyardResult<T> = Result<T, SwitchyardError>;
