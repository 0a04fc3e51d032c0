//! # switchyard-contracts
//!
//! Shared types, schemas, and contracts for the switchyard orchestration
//! core.
//!
//! All crates in the workspace import from here. No orchestration logic
//! lives in this crate, only data definitions and error types.

pub mod agent;
pub mod error;
pub mod generation;
pub mod guardrail;
pub mod label;
pub mod request;
pub mod shape;
pub mod trace;

#[cfg(test)]
mod tests {
    use super::*;
    use agent::{AgentId, AgentRun, AgentTurn, RunId};
    use error::{SwitchyardError, ToolInvocationError};
    use generation::{GenerationRequest, GenerationResponse, Message, Role};
    use guardrail::{GuardrailVerdict, RunOutcome};
    use label::{normalize_label, Label, LabelSet};
    use request::{HandlerUpdate, RequestState};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Topic {
        General,
        News,
        Sports,
    }

    impl Label for Topic {
        fn all() -> &'static [Self] {
            &[Topic::General, Topic::News, Topic::Sports]
        }

        fn as_str(&self) -> &'static str {
            match self {
                Topic::General => "general",
                Topic::News => "news",
                Topic::Sports => "sports",
            }
        }
    }

    // ── Labels ───────────────────────────────────────────────────────────────

    #[test]
    fn normalize_label_folds_case_and_strips_noise() {
        assert_eq!(normalize_label("  News\n"), "news");
        assert_eq!(normalize_label("\"general\"."), "general");
        assert_eq!(normalize_label("`SPORTS`"), "sports");
    }

    #[test]
    fn label_set_resolves_members_only() {
        let set = LabelSet::new([Topic::General, Topic::News], Topic::General).unwrap();

        assert_eq!(set.resolve("NEWS"), Some(Topic::News));
        // Declared on the enum but not in this set.
        assert_eq!(set.resolve("sports"), None);
        assert_eq!(set.resolve_or_default("sports"), Topic::General);
        assert_eq!(set.resolve_or_default("I think it is news"), Topic::General);
    }

    #[test]
    fn label_set_rejects_default_outside_set() {
        let err = LabelSet::new([Topic::News], Topic::General).unwrap_err();
        assert!(matches!(err, SwitchyardError::ConfigError { .. }));
        assert!(err.to_string().contains("general"));
    }

    #[test]
    fn label_set_rejects_empty() {
        let err = LabelSet::<Topic>::new([], Topic::General).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn label_set_dedupes_and_describes() {
        let set = LabelSet::new([Topic::News, Topic::News, Topic::General], Topic::News).unwrap();
        assert_eq!(set.labels().len(), 2);
        assert_eq!(set.describe(), "'news', 'general'");
    }

    #[test]
    fn display_name_capitalizes() {
        assert_eq!(Topic::News.display_name(), "News");
    }

    // ── RequestState ─────────────────────────────────────────────────────────

    #[test]
    fn handler_update_may_restate_decision() {
        let mut state = RequestState::new("what happened today?");
        state.record_label(Topic::News);
        assert_eq!(state.decision.as_deref(), Some("news"));

        state.apply(HandlerUpdate::new("headlines").with_decision("News"));
        assert_eq!(state.label, Some(Topic::News));
        assert_eq!(state.decision.as_deref(), Some("News"));
        assert_eq!(state.output.as_deref(), Some("headlines"));
    }

    #[test]
    fn handler_update_without_decision_keeps_label_form() {
        let mut state = RequestState::new("hi");
        state.record_label(Topic::General);
        state.apply(HandlerUpdate::new("hello"));
        assert_eq!(state.decision.as_deref(), Some("general"));
    }

    // ── Guardrail verdicts ───────────────────────────────────────────────────

    #[test]
    fn tripwire_is_negated_predicate() {
        let v = GuardrailVerdict::from_predicate("homework", false, "car keys?", "not homework");
        assert!(v.tripwire_triggered);
        assert_eq!(v.diagnostics.input, "car keys?");
        assert_eq!(v.diagnostics.reasoning, "not homework");

        let v = GuardrailVerdict::from_predicate("homework", true, "2+2?", "math homework");
        assert!(!v.tripwire_triggered);
    }

    #[test]
    fn run_outcome_accessors() {
        let done: RunOutcome<u32> = RunOutcome::Completed(4);
        assert_eq!(done.completed(), Some(&4));
        assert!(!done.is_blocked());
        assert_eq!(done.map(|n| n * 2), RunOutcome::Completed(8));

        let blocked: RunOutcome<u32> =
            RunOutcome::Blocked(GuardrailVerdict::trip("g", "x", "no"));
        assert!(blocked.is_blocked());
        assert_eq!(blocked.blocked().map(|v| v.guardrail.as_str()), Some("g"));
    }

    // ── Generation boundary ──────────────────────────────────────────────────

    #[test]
    fn generation_request_exposes_original_input_and_tool_results() {
        let request = GenerationRequest::new(
            "be helpful",
            vec![
                Message::user("weather here?"),
                Message::tool("get_my_location", "{\"lat\":1.0}"),
            ],
        );
        assert_eq!(request.original_input(), Some("weather here?"));
        let tools: Vec<_> = request.tool_results().collect();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].role, Role::Tool);
        assert_eq!(tools[0].name.as_deref(), Some("get_my_location"));
    }

    #[test]
    fn generation_response_serializes_with_kind_tag() {
        let json = serde_json::to_value(GenerationResponse::handoff("Math Tutor")).unwrap();
        assert_eq!(json["kind"], "handoff");
        assert_eq!(json["target"], "Math Tutor");
    }

    // ── Agent runs ───────────────────────────────────────────────────────────

    #[test]
    fn agent_run_path_follows_handoffs() {
        let triage = AgentId::new("Triage");
        let math = AgentId::new("Math Tutor");
        let run = AgentRun {
            run_id: RunId::new(),
            final_output: "4".to_string(),
            final_agent: math.clone(),
            trace: vec![
                AgentTurn::Handoff { from: triage.clone(), to: math.clone() },
                AgentTurn::ToolInvocation {
                    agent: math.clone(),
                    tool: "calc".to_string(),
                    arguments: serde_json::json!({ "expr": "2+2" }),
                    result: serde_json::json!(4),
                },
                AgentTurn::FinalAnswer { agent: math.clone(), output: "4".to_string() },
            ],
        };

        assert_eq!(run.steps(), 3);
        assert_eq!(run.tool_turns().count(), 1);
        assert_eq!(run.agent_path(), vec![&triage, &math]);
    }

    #[test]
    fn run_id_new_produces_unique_values() {
        let ids: std::collections::HashSet<String> =
            (0..50).map(|_| RunId::new().to_string()).collect();
        assert_eq!(ids.len(), 50);
    }

    // ── Error display ────────────────────────────────────────────────────────

    #[test]
    fn tool_errors_are_distinguishable() {
        let err: SwitchyardError = ToolInvocationError::UnknownTool {
            tool: "teleport".to_string(),
        }
        .into();
        assert!(err.is_tool_error());
        assert!(!err.is_generation_error());
        assert!(err.to_string().contains("teleport"));
    }

    #[test]
    fn generation_unavailable_display() {
        let err = SwitchyardError::unavailable("connection reset");
        assert!(err.is_generation_error());
        assert!(err.to_string().contains("generation service unavailable"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn turn_limit_display() {
        let err = SwitchyardError::TurnLimitExceeded { max_turns: 10 };
        assert!(err.to_string().contains("10 turns"));
    }

    #[test]
    fn invalid_handoff_display() {
        let err = SwitchyardError::InvalidHandoff {
            from: "Triage".to_string(),
            to: "Chef".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Triage"));
        assert!(msg.contains("Chef"));
    }
}
