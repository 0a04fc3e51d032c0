//! # switchyard-core
//!
//! The orchestration runtime: classification, label routing, guardrail
//! gating, and the tool-calling agent loop.
//!
//! This crate provides:
//! - The trait seams (`GenerationService`, `Tool`, `Handler`, `Guardrail`,
//!   `ShapeValidator`, `TraceWriter`)
//! - `Classifier` and `RoutingWorkflow` for single-shot label routing
//! - `AgentRunner` for multi-step tool use and handoffs
//! - Tolerant structured-output parsing, retry wrappers and runtime config
//!
//! ## Usage
//!
//! ```rust,ignore
//! use switchyard_core::{AgentRunner, AgentSpec, Classifier, RoutingWorkflow};
//! ```

pub mod agent_loop;
pub mod cancel;
pub mod classifier;
pub mod config;
pub mod guard;
pub mod registry;
pub mod retry;
pub mod structured;
pub mod traits;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use agent_loop::{AgentDirectory, AgentRunner, AgentSpec};
pub use cancel::{CancellationToken, Checkpoint};
pub use classifier::Classifier;
pub use config::RuntimeConfig;
pub use guard::guardrail_then_run;
pub use registry::ToolRegistry;
pub use retry::{RetryPolicy, RetryingService, RetryingTool};
pub use structured::{parse_structured, parse_validated, StructuredOutput};
pub use workflow::{FnHandler, RoutingWorkflow};
