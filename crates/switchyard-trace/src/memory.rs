//! In-memory `TraceWriter` keeping one hash chain per run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};

use switchyard_contracts::{
    agent::RunId,
    error::{SwitchyardError, SwitchyardResult},
    trace::TurnRecord,
};
use switchyard_core::traits::TraceWriter;

use crate::{
    chain::{first_break, hash_event},
    event::{TraceEvent, TraceLog},
};

#[derive(Default)]
pub(crate) struct RunChain {
    pub(crate) events: Vec<TraceEvent>,
    pub(crate) finalized: bool,
}

impl RunChain {
    fn last_hash(&self) -> &str {
        self.events.last().map_or(TraceEvent::GENESIS, |e| e.this_hash.as_str())
    }
}

/// Records every turn of every run it is attached to.
///
/// Cloning shares the underlying store, so one handle can go to the
/// `AgentRunner` while another is kept for inspection.
#[derive(Clone, Default)]
pub struct InMemoryTraceWriter {
    pub(crate) runs: Arc<Mutex<HashMap<RunId, RunChain>>>,
}

impl InMemoryTraceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> SwitchyardResult<MutexGuard<'_, HashMap<RunId, RunChain>>> {
        self.runs.lock().map_err(|e| SwitchyardError::TraceWriteFailed {
            reason: format!("trace store lock poisoned: {e}"),
        })
    }

    /// Read-only view of the store. A poisoned lock still holds complete
    /// chains, since every write appends in one step.
    fn view(&self) -> MutexGuard<'_, HashMap<RunId, RunChain>> {
        self.runs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn run_ids(&self) -> Vec<RunId> {
        let runs = self.view();
        runs.keys().copied().collect()
    }

    /// Snapshot of everything recorded for `run_id`.
    pub fn export(&self, run_id: &RunId) -> Option<TraceLog> {
        let runs = self.view();
        runs.get(run_id).map(|chain| TraceLog {
            run_id: *run_id,
            events: chain.events.clone(),
            finalized: chain.finalized,
            exported_at: Utc::now(),
            terminal_hash: chain.events.last().map(|e| e.this_hash.clone()).unwrap_or_default(),
        })
    }

    /// True when `run_id` was recorded and its chain is intact.
    pub fn verify(&self, run_id: &RunId) -> bool {
        let runs = self.view();
        runs.get(run_id).is_some_and(|chain| first_break(&chain.events).is_none())
    }
}

impl TraceWriter for InMemoryTraceWriter {
    /// Append `record` to its run's chain.
    ///
    /// # Errors
    ///
    /// `TraceWriteFailed` if the run is already finalized or the record's
    /// step is not the next one in the chain.
    fn write(&self, record: &TurnRecord) -> SwitchyardResult<()> {
        let mut runs = self.lock()?;
        let chain = runs.entry(record.run_id).or_default();

        if chain.finalized {
            return Err(SwitchyardError::TraceWriteFailed {
                reason: format!("run {} is already finalized", record.run_id),
            });
        }

        let sequence = chain.events.len() as u64;
        if record.step != sequence {
            return Err(SwitchyardError::TraceWriteFailed {
                reason: format!(
                    "run {} expected step {sequence}, got step {}",
                    record.run_id, record.step
                ),
            });
        }

        let prev_hash = chain.last_hash().to_string();
        let this_hash = hash_event(&record.run_id, sequence, record, &prev_hash)?;

        debug!(run_id = %record.run_id, sequence, hash = %this_hash, "trace event appended");

        chain.events.push(TraceEvent {
            sequence,
            record: record.clone(),
            prev_hash,
            this_hash,
        });
        Ok(())
    }

    /// Seal `run_id`'s chain against further writes.
    ///
    /// # Errors
    ///
    /// `TraceWriteFailed` if nothing was ever recorded for `run_id`.
    fn finalize(&self, run_id: &RunId) -> SwitchyardResult<()> {
        let mut runs = self.lock()?;
        let Some(chain) = runs.get_mut(run_id) else {
            return Err(SwitchyardError::TraceWriteFailed {
                reason: format!("run {run_id} has no recorded turns to finalize"),
            });
        };
        chain.finalized = true;

        info!(
            run_id = %run_id,
            event_count = chain.events.len(),
            terminal_hash = %chain.last_hash(),
            "run trace finalized"
        );
        Ok(())
    }
}
