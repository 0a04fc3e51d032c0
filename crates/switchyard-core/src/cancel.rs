//! Cooperative cancellation.
//!
//! The token is `tokio_util`'s; `cancel()` and `is_cancelled()` are plain
//! synchronous calls, so the blocking agent loop can poll it. Every suspend
//! point in the loop calls `checkpoint()` first, so a token cancelled from
//! another thread stops the run before its next generation or tool call.

pub use tokio_util::sync::CancellationToken;

use switchyard_contracts::error::{SwitchyardError, SwitchyardResult};

/// Maps a cancelled token to `SwitchyardError::Cancelled`.
pub trait Checkpoint {
    /// `Err(Cancelled)` once `cancel()` has been called on any clone.
    fn checkpoint(&self) -> SwitchyardResult<()>;
}

impl Checkpoint for CancellationToken {
    fn checkpoint(&self) -> SwitchyardResult<()> {
        if self.is_cancelled() {
            Err(SwitchyardError::Cancelled)
        } else {
            Ok(())
        }
    }
}
