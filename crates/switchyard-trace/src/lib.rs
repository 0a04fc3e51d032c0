//! # switchyard-trace
//!
//! Append-only, SHA-256 hash-chained traces of agent-loop runs.
//!
//! Each turn the agent loop records becomes a `TraceEvent` linked to the
//! one before it. Editing any stored event breaks the chain, which
//! `verify_chain` detects.
//!
//! ```rust,ignore
//! use switchyard_trace::InMemoryTraceWriter;
//!
//! let trace = InMemoryTraceWriter::new();
//! let runner = AgentRunner::new(service, validator).with_trace(Arc::new(trace.clone()));
//! let run = runner.run_agent(agent, "What's the weather?")?;
//! assert!(trace.verify(&run.completed().unwrap().run_id));
//! ```

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{first_break, hash_event, verify_chain};
pub use event::{TraceEvent, TraceLog};
pub use memory::InMemoryTraceWriter;
