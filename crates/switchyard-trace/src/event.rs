//! Trace events and the exported per-run log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use switchyard_contracts::{
    agent::RunId,
    error::{SwitchyardError, SwitchyardResult},
    trace::TurnRecord,
};

/// One turn record, linked to its predecessor by hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Position in the run's chain, starting at 0.
    pub sequence: u64,
    pub record: TurnRecord,
    /// `this_hash` of the previous event, or `GENESIS` for the first.
    pub prev_hash: String,
    pub this_hash: String,
}

impl TraceEvent {
    pub const GENESIS: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";

    pub fn run_id(&self) -> RunId {
        self.record.run_id
    }
}

/// Everything recorded for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceLog {
    pub run_id: RunId,
    pub events: Vec<TraceEvent>,
    /// Set once the agent loop reported a final answer.
    pub finalized: bool,
    pub exported_at: DateTime<Utc>,
    /// `this_hash` of the last event; empty for an empty log.
    pub terminal_hash: String,
}

impl TraceLog {
    /// One JSON object per line, oldest event first.
    pub fn to_json_lines(&self) -> SwitchyardResult<String> {
        let mut out = String::new();
        for event in &self.events {
            let line = serde_json::to_string(event).map_err(|e| SwitchyardError::TraceWriteFailed {
                reason: format!("failed to serialize trace event {}: {e}", event.sequence),
            })?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }
}
