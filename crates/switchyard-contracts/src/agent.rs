//! Agent identity and the execution trace of one agent-loop run.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable, human-readable identifier for an agent (e.g. "Math Tutor").
///
/// Used in handoff edges, trace records, and log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a single agent-loop run.
///
/// Appears in every trace record and log line of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One deliberate step of the agent loop and what came of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentTurn {
    /// The active agent produced its final answer.
    FinalAnswer { agent: AgentId, output: String },

    /// The active agent invoked a tool and got a result back.
    ToolInvocation {
        agent: AgentId,
        tool: String,
        arguments: Value,
        result: Value,
    },

    /// Control moved from one agent to another.
    Handoff { from: AgentId, to: AgentId },
}

impl AgentTurn {
    /// The agent that was active when the turn was taken.
    pub fn agent(&self) -> &AgentId {
        match self {
            Self::FinalAnswer { agent, .. } | Self::ToolInvocation { agent, .. } => agent,
            Self::Handoff { from, .. } => from,
        }
    }

    pub fn is_tool_invocation(&self) -> bool {
        matches!(self, Self::ToolInvocation { .. })
    }
}

/// Result of a completed agent-loop run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRun {
    pub run_id: RunId,
    pub final_output: String,
    /// The agent that produced the final answer.
    pub final_agent: AgentId,
    /// Every turn in order; the last one is always `FinalAnswer`.
    pub trace: Vec<AgentTurn>,
}

impl AgentRun {
    /// Number of deliberate steps taken. Every turn is one step.
    pub fn steps(&self) -> usize {
        self.trace.len()
    }

    pub fn tool_turns(&self) -> impl Iterator<Item = &AgentTurn> {
        self.trace.iter().filter(|t| t.is_tool_invocation())
    }

    /// The agents that were active, in the order they became active.
    pub fn agent_path(&self) -> Vec<&AgentId> {
        let mut path: Vec<&AgentId> = self.trace.first().map(|t| vec![t.agent()]).unwrap_or_default();
        for turn in &self.trace {
            if let AgentTurn::Handoff { to, .. } = turn {
                path.push(to);
            }
        }
        path
    }
}
