//! Reference assistants built on the switchyard runtime.
//!
//! These run fully offline: `KeywordModel` stands in for a hosted model and
//! `mock_data` stands in for the news and weather services. They exist to
//! show the runtime end to end and to pin its behavior in tests.

pub mod mock_data;
pub mod model;
pub mod scenarios;
pub mod tools;
