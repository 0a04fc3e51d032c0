//! Switchyard reference assistants, demo CLI.
//!
//! Runs one or all of the four reference scenarios. Everything runs offline
//! against a deterministic keyword model and mock news/weather data.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- search-rewrite
//!   cargo run -p demo -- news-router
//!   cargo run -p demo -- homework-tutor
//!   cargo run -p demo -- weather-agent

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use switchyard_contracts::error::SwitchyardResult;
use switchyard_ref_assistants::scenarios::{homework_tutor, news_router, search_rewrite, weather_agent};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Switchyard: classify, route, guard and loop over LLM calls.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Switchyard reference assistants demo",
    long_about = "Runs the switchyard reference scenarios: structured output with fallback,\n\
                  label routing, guardrail tripwires, and a tool-calling agent loop."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all four scenarios in sequence.
    RunAll,
    /// Scenario 1: Search Query Rewriter (structured output, fallback).
    SearchRewrite,
    /// Scenario 2: News Router (classifier plus routing workflow).
    NewsRouter,
    /// Scenario 3: Homework Tutor (guardrail tripwire, handoffs).
    HomeworkTutor,
    /// Scenario 4: Weather Agent (tool loop, retries, trace chain).
    WeatherAgent,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // RUST_LOG=debug shows every routing decision and agent turn.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::SearchRewrite => search_rewrite::run_scenario(),
        Command::NewsRouter => news_router::run_scenario(),
        Command::HomeworkTutor => homework_tutor::run_scenario(),
        Command::WeatherAgent => weather_agent::run_scenario(),
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_all() -> SwitchyardResult<()> {
    info!("running all scenarios");
    search_rewrite::run_scenario()?;
    news_router::run_scenario()?;
    homework_tutor::run_scenario()?;
    weather_agent::run_scenario()?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Switchyard: LLM Orchestration Runtime");
    println!("Reference Assistants Demo");
    println!("=====================================");
    println!();
    println!("Building blocks exercised:");
    println!("  [1] Classifier maps model text onto a closed label set (default on anything else)");
    println!("  [2] Routing workflow runs exactly one handler per request");
    println!("  [3] Guardrails run first; a tripwire blocks the protected work");
    println!("  [4] Agent loop alternates model turns with tool calls and handoffs, bounded");
    println!("  [5] Every agent turn is appended to a SHA-256 hash chain");
    println!();
}
