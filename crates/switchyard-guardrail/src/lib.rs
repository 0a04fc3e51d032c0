//! # switchyard-guardrail
//!
//! Guardrail implementations for the switchyard runtime. Both implement
//! [`Guardrail`](switchyard_core::traits::Guardrail).
//!
//! - [`ModelGuardrail`] asks the generation service to judge the input and
//!   reads a boolean predicate out of its structured answer.
//! - [`RuleGuardrail`] matches keywords from a TOML rules file. Rules apply
//!   in declaration order, the first match wins, and a configurable default
//!   covers everything else.
//!
//! ```rust,ignore
//! use std::path::Path;
//! use switchyard_guardrail::RuleGuardrail;
//!
//! let guardrail = RuleGuardrail::from_file(Path::new("guardrails/homework.toml"))?;
//! let outcome = workflow.run_guarded(&guardrail, "What is 2+2?")?;
//! ```

pub mod engine;
pub mod model;
pub mod rule;

pub use engine::RuleGuardrail;
pub use model::ModelGuardrail;
pub use rule::{GuardrailConfig, GuardrailRule, RuleVerdict};
