//! Scenario 4: Weather Agent
//!
//! A single agent with two tools: one that looks up the caller's location
//! and one that fetches the weather for a coordinate. The model calls them
//! in turn and then reports. Runtime limits come from `config/runtime.toml`;
//! every turn is written to a hash-chained trace that is verified at the end.

use std::sync::Arc;

use chrono::Duration;

use switchyard_contracts::{
    agent::{AgentRun, AgentTurn},
    error::SwitchyardResult,
    guardrail::RunOutcome,
};
use switchyard_core::{
    agent_loop::{AgentRunner, AgentSpec},
    config::RuntimeConfig,
    registry::ToolRegistry,
    retry::RetryingTool,
    traits::{GenerationService, ShapeValidator},
};
use switchyard_trace::InMemoryTraceWriter;
use switchyard_verify::SchemaValidator;

use crate::{
    model::KeywordModel,
    tools::{CachedTool, FetchWeatherTool, GetMyLocationTool},
};

const RUNTIME_CONFIG: &str = include_str!("../../config/runtime.toml");

pub const WEATHER_AGENT: &str = "Weather Agent";

pub fn runtime_config() -> SwitchyardResult<RuntimeConfig> {
    RuntimeConfig::from_toml_str(RUNTIME_CONFIG)
}

/// Location lookup, plus a weather fetch that is cached for an hour and
/// retried on transient failure.
pub fn weather_tools(config: &RuntimeConfig) -> SwitchyardResult<ToolRegistry> {
    let fetch = RetryingTool::new(
        CachedTool::new(FetchWeatherTool::new(), Duration::hours(1)),
        config.retry.clone(),
    );
    ToolRegistry::new().with(GetMyLocationTool::new())?.with(fetch)
}

pub fn weather_agent(config: &RuntimeConfig) -> SwitchyardResult<AgentSpec> {
    Ok(AgentSpec::new(
        WEATHER_AGENT,
        "You are a helpful assistant. Use the tools to find the user's location and the current \
         weather there, then summarize it.",
    )
    .with_tools(weather_tools(config)?))
}

/// Everything a caller needs to run the agent and inspect its trace.
pub struct WeatherAssistant {
    pub runner: AgentRunner,
    pub agent: AgentSpec,
    pub trace: InMemoryTraceWriter,
}

impl WeatherAssistant {
    pub fn new(
        service: Arc<dyn GenerationService>,
        validator: Arc<dyn ShapeValidator>,
        config: &RuntimeConfig,
    ) -> SwitchyardResult<Self> {
        let trace = InMemoryTraceWriter::new();
        let runner = AgentRunner::from_config(service, validator, config)
            .with_trace(Arc::new(trace.clone()));
        Ok(Self {
            runner,
            agent: weather_agent(config)?,
            trace,
        })
    }

    pub fn ask(&self, input: &str) -> SwitchyardResult<RunOutcome<AgentRun>> {
        self.runner.run_agent(self.agent.clone(), input)
    }
}

/// Run Scenario 4.
pub fn run_scenario() -> SwitchyardResult<()> {
    println!("=== Scenario 4: Weather Agent ===");
    println!();

    let config = runtime_config()?;
    println!(
        "  Runtime: max {} turns, {} retries ({} ms backoff)",
        config.agent_loop.max_turns, config.retry.max_retries, config.retry.backoff_ms
    );
    println!();

    let assistant = WeatherAssistant::new(
        Arc::new(KeywordModel::new()),
        Arc::new(SchemaValidator::new()),
        &config,
    )?;

    let input = "What is the weather at my location?";
    println!("  Question: {}", input);

    let run = match assistant.ask(input)? {
        RunOutcome::Completed(run) => run,
        RunOutcome::Blocked(verdict) => {
            println!("  Blocked by '{}': {}", verdict.guardrail, verdict.diagnostics.reasoning);
            return Ok(());
        }
    };

    for turn in run.tool_turns() {
        if let AgentTurn::ToolInvocation { tool, arguments, .. } = turn {
            println!("  Tool:     {}({})", tool, arguments);
        }
    }
    println!("  Answer:");
    for line in run.final_output.lines() {
        println!("    {}", line);
    }
    println!();

    if let Some(log) = assistant.trace.export(&run.run_id) {
        println!("  Trace events:   {}", log.events.len());
        println!("  Terminal hash:  {}", log.terminal_hash);
    }
    println!(
        "  Chain verified: {}",
        if assistant.trace.verify(&run.run_id) { "yes" } else { "NO" }
    );
    println!();
    println!("  Scenario 4 complete.");
    println!();
    Ok(())
}
