//! Hashing and chain verification.
//!
//! Hash input, in order: run id (hyphenated UUID text), sequence as 8-byte
//! little-endian, previous hash (64 hex chars), compact JSON of the turn
//! record.

use sha2::{Digest, Sha256};

use switchyard_contracts::{
    agent::RunId,
    error::{SwitchyardError, SwitchyardResult},
    trace::TurnRecord,
};

use crate::event::TraceEvent;

/// SHA-256 over one event's content, as lowercase hex.
pub fn hash_event(
    run_id: &RunId,
    sequence: u64,
    record: &TurnRecord,
    prev_hash: &str,
) -> SwitchyardResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| SwitchyardError::TraceWriteFailed {
        reason: format!("turn record is not serializable: {e}"),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(run_id.to_string().as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);
    Ok(hex::encode(hasher.finalize()))
}

/// Sequence number of the first event that breaks the chain, if any.
///
/// An event breaks the chain when its sequence is out of place, its
/// `prev_hash` does not link to the event before it, or its `this_hash`
/// does not match its content.
pub fn first_break(events: &[TraceEvent]) -> Option<u64> {
    let mut expected_prev = TraceEvent::GENESIS;

    for (position, event) in events.iter().enumerate() {
        if event.sequence != position as u64 || event.prev_hash != expected_prev {
            return Some(event.sequence);
        }
        match hash_event(&event.record.run_id, event.sequence, &event.record, &event.prev_hash) {
            Ok(hash) if hash == event.this_hash => {}
            _ => return Some(event.sequence),
        }
        expected_prev = event.this_hash.as_str();
    }

    None
}

/// True when no event breaks the chain. An empty chain is valid.
pub fn verify_chain(events: &[TraceEvent]) -> bool {
    first_break(events).is_none()
}
