//! The four reference assistants. Each module exposes its building blocks
//! for reuse and tests, plus a `run_scenario` that prints a walkthrough.

pub mod homework_tutor;
pub mod news_router;
pub mod search_rewrite;
pub mod weather_agent;
