//! Bounded retry with exponential backoff.
//!
//! Nothing in the runtime retries on its own. Callers opt in by wrapping a
//! generation service in `RetryingService` or a tool in `RetryingTool`.
//! Only transient failures are retried: an unavailable service, or a tool
//! that ran and failed. Unknown tools and bad arguments are never retried.

use std::fmt;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use switchyard_contracts::{
    error::{SwitchyardError, SwitchyardResult, ToolInvocationError},
    generation::{GenerationRequest, GenerationResponse, ToolDeclaration},
};

use crate::traits::{GenerationService, Tool};

fn default_backoff_ms() -> u64 {
    200
}

/// How many times to retry and how long to wait in between.
///
/// The delay before retry `n` (zero-based) is `backoff_ms * 2^n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 0, backoff_ms: default_backoff_ms() }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_ms: u64) -> Self {
        Self { max_retries, backoff_ms }
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.min(16);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }

    /// Run `op`, retrying while `retryable` says the error is transient and
    /// the retry budget lasts. The last error is returned once it runs out.
    pub fn run<T, E, F, R>(&self, what: &str, mut op: F, retryable: R) -> Result<T, E>
    where
        E: fmt::Display,
        F: FnMut() -> Result<T, E>,
        R: Fn(&E) -> bool,
    {
        let mut retry = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if retry < self.max_retries && retryable(&e) => {
                    let delay = self.delay_for(retry);
                    warn!(
                        operation = what,
                        retry = retry + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure, retrying"
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// A generation service that retries `GenerationUnavailable`.
pub struct RetryingService<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: GenerationService> RetryingService<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<S: GenerationService> GenerationService for RetryingService<S> {
    fn generate(&self, request: &GenerationRequest) -> SwitchyardResult<GenerationResponse> {
        self.policy.run(
            "generate",
            || self.inner.generate(request),
            SwitchyardError::is_generation_error,
        )
    }
}

/// A tool that retries `ToolInvocationError::Failed`.
pub struct RetryingTool<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Tool> RetryingTool<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T: Tool> Tool for RetryingTool<T> {
    fn declaration(&self) -> &ToolDeclaration {
        self.inner.declaration()
    }

    fn invoke(&self, arguments: &Value) -> Result<Value, ToolInvocationError> {
        self.policy.run(
            self.inner.name(),
            || self.inner.invoke(arguments),
            |e| matches!(e, ToolInvocationError::Failed { .. }),
        )
    }
}
