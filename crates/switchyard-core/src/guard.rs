//! Guardrail gating.
//!
//! A guardrail runs exactly once, strictly before the protected work. When
//! its tripwire fires the protected closure is never called and the caller
//! gets `RunOutcome::Blocked` with the verdict's diagnostics.

use std::sync::Arc;

use tracing::{info, warn};

use switchyard_contracts::{
    error::SwitchyardResult,
    guardrail::{GuardrailVerdict, RunOutcome},
};

use crate::traits::Guardrail;

/// Check `input` with `guardrail`, then run `protected` only if it passed.
///
/// # Errors
///
/// A failure of the check itself, or whatever `protected` returns. A tripped
/// guardrail is not an error.
pub fn guardrail_then_run<T, F>(
    guardrail: &dyn Guardrail,
    input: &str,
    protected: F,
) -> SwitchyardResult<RunOutcome<T>>
where
    F: FnOnce(&str) -> SwitchyardResult<T>,
{
    let verdict = guardrail.check(input)?;
    if verdict.tripwire_triggered {
        warn!(
            guardrail = %verdict.guardrail,
            reasoning = %verdict.diagnostics.reasoning,
            "guardrail tripwire triggered, request blocked"
        );
        return Ok(RunOutcome::Blocked(verdict));
    }

    info!(guardrail = %verdict.guardrail, "guardrail passed");
    protected(input).map(RunOutcome::Completed)
}

/// Run `guardrails` in order and return the first tripped verdict, if any.
///
/// Guardrails after a tripped one are not consulted.
pub fn first_tripped(
    guardrails: &[Arc<dyn Guardrail>],
    input: &str,
) -> SwitchyardResult<Option<GuardrailVerdict>> {
    for guardrail in guardrails {
        let verdict = guardrail.check(input)?;
        if verdict.tripwire_triggered {
            warn!(
                guardrail = %verdict.guardrail,
                reasoning = %verdict.diagnostics.reasoning,
                "guardrail tripwire triggered"
            );
            return Ok(Some(verdict));
        }
        info!(guardrail = %verdict.guardrail, "guardrail passed");
    }
    Ok(None)
}
