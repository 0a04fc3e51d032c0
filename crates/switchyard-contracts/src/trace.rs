//! Trace records written by the agent loop.
//!
//! One `TurnRecord` per `AgentTurn`. Trace writers append these to their
//! store; records are never modified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentTurn, RunId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// The run this record belongs to.
    pub run_id: RunId,
    /// Zero-based deliberate-step index within the run.
    pub step: u64,
    pub turn: AgentTurn,
    /// Wall-clock time the record was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl TurnRecord {
    pub fn new(run_id: RunId, step: u64, turn: AgentTurn) -> Self {
        Self {
            run_id,
            step,
            turn,
            timestamp: Utc::now(),
        }
    }
}
