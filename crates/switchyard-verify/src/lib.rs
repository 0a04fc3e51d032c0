//! # switchyard-verify
//!
//! Shape validation for the switchyard runtime.
//!
//! [`engine::SchemaValidator`] implements
//! [`switchyard_core::traits::ShapeValidator`]. The agent loop uses it to
//! check tool arguments before a tool runs, and structured-output parsing
//! uses it to check what the generation service returned.
//!
//! ```rust,ignore
//! use switchyard_verify::engine::SchemaValidator;
//!
//! let mut validator = SchemaValidator::new();
//! validator.register_rule("finite-coordinates", Box::new(|value| {
//!     match value.pointer("/location/lat").and_then(|v| v.as_f64()) {
//!         Some(lat) if lat.is_finite() => None,
//!         _ => Some("latitude must be a finite number".to_string()),
//!     }
//! }));
//! ```

pub mod engine;

pub use engine::SchemaValidator;
