//! Scenario 1: Search Query Rewriter
//!
//! Rewrites a free-form question into a web search query plus a short
//! justification. The model is asked for JSON; whatever comes back goes
//! through tolerant extraction and shape validation. If that fails the
//! original question is used as the query and the raw model text becomes
//! the justification.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use switchyard_contracts::{
    error::SwitchyardResult,
    generation::GenerationRequest,
    shape::{Shape, ShapeRule, ShapeRuleType},
};
use switchyard_core::{
    structured::{parse_validated, StructuredOutput},
    traits::{GenerationService, ShapeValidator},
};
use switchyard_verify::SchemaValidator;

use crate::model::KeywordModel;

const REWRITE_INSTRUCTIONS: &str = "You are an assistant that rewrites a user's question into an \
    optimized web search query and provides a brief justification. Respond in JSON only with two \
    keys: `search_query` and `justification`. Example: {\"search_query\": \"...\", \
    \"justification\": \"...\"}";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRewrite {
    pub search_query: String,
    pub justification: String,
    /// True when the model output was unusable and the fallback applied.
    pub degraded: bool,
}

#[derive(Deserialize)]
struct RewritePayload {
    search_query: String,
    justification: String,
}

pub fn rewrite_shape() -> Shape {
    Shape::from_json_schema(
        "search-rewrite-v1",
        json!({
            "type": "object",
            "properties": {
                "search_query": { "type": "string" },
                "justification": { "type": "string" }
            },
            "required": ["search_query", "justification"]
        }),
    )
    .with_rule(ShapeRule::new(
        "query-present",
        "the rewritten query must not be blank",
        ShapeRuleType::NonEmptyString { field_path: "search_query".to_string() },
    ))
}

pub struct SearchRewriter {
    service: Arc<dyn GenerationService>,
    validator: Arc<dyn ShapeValidator>,
    shape: Shape,
}

impl SearchRewriter {
    pub fn new(service: Arc<dyn GenerationService>, validator: Arc<dyn ShapeValidator>) -> Self {
        Self { service, validator, shape: rewrite_shape() }
    }

    /// Rewrite `question`. A blank question yields an empty rewrite without
    /// calling the service.
    pub fn rewrite(&self, question: &str) -> SwitchyardResult<SearchRewrite> {
        if question.trim().is_empty() {
            return Ok(SearchRewrite::default());
        }

        let request = GenerationRequest::single_turn(REWRITE_INSTRUCTIONS, question)
            .with_output_shape(self.shape.clone());
        let response = self.service.generate(&request)?;
        let text = response.as_text().unwrap_or_default();

        let parsed: StructuredOutput<RewritePayload> =
            parse_validated(text, &self.shape, self.validator.as_ref())?;

        Ok(match parsed {
            StructuredOutput::Parsed(p) => SearchRewrite {
                search_query: p.search_query,
                justification: p.justification,
                degraded: false,
            },
            StructuredOutput::Fallback { raw, .. } => SearchRewrite {
                search_query: question.to_string(),
                justification: raw,
                degraded: true,
            },
        })
    }
}

/// Run Scenario 1: rewrite two questions, then show the fallback with a
/// model that ignores the requested format.
pub fn run_scenario() -> SwitchyardResult<()> {
    println!("=== Scenario 1: Search Query Rewriter ===");
    println!();

    let validator: Arc<dyn ShapeValidator> = Arc::new(SchemaValidator::new());
    let rewriter = SearchRewriter::new(Arc::new(KeywordModel::new()), Arc::clone(&validator));

    for question in [
        "How do I optimize a SQL query for large tables?",
        "Why do we feel heat from the sun?",
    ] {
        let rewrite = rewriter.rewrite(question)?;
        println!("  Question:        {}", question);
        println!("  Search query:    {}", rewrite.search_query);
        println!("  Justification:   {}", rewrite.justification);
        println!();
    }

    let degraded = SearchRewriter::new(Arc::new(KeywordModel::malformed()), validator);
    let question = "best hiking trails near me";
    let rewrite = degraded.rewrite(question)?;
    println!("  Model ignored the JSON format:");
    println!("  Question:        {}", question);
    println!("  Search query:    {} (fell back to the question)", rewrite.search_query);
    println!("  Justification:   {} (raw model text)", rewrite.justification);
    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use switchyard_verify::SchemaValidator;

    use super::SearchRewriter;
    use crate::model::KeywordModel;

    fn rewriter(model: Arc<KeywordModel>) -> SearchRewriter {
        SearchRewriter::new(model, Arc::new(SchemaValidator::new()))
    }

    #[test]
    fn well_formed_output_is_used() {
        let rewrite = rewriter(Arc::new(KeywordModel::new()))
            .rewrite("How do I optimize a SQL query for large tables?")
            .unwrap();
        assert!(!rewrite.degraded);
        assert_eq!(rewrite.search_query, "optimize sql query large tables");
        assert!(!rewrite.justification.is_empty());
    }

    #[test]
    fn blank_question_skips_the_service() {
        let model = Arc::new(KeywordModel::new());
        let rewrite = rewriter(Arc::clone(&model)).rewrite("   ").unwrap();

        assert_eq!(rewrite.search_query, "");
        assert_eq!(rewrite.justification, "");
        assert_eq!(model.call_count(), 0);
    }

    #[test]
    fn malformed_output_falls_back_to_the_question() {
        let question = "best hiking trails near me";
        let rewrite = rewriter(Arc::new(KeywordModel::malformed())).rewrite(question).unwrap();

        assert!(rewrite.degraded);
        assert_eq!(rewrite.search_query, question);
        assert!(rewrite.justification.starts_with("Sure!"));
    }
}
