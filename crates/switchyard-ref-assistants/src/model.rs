//! `KeywordModel`: a deterministic generation service for the reference
//! assistants.
//!
//! It answers the handful of request kinds the assistants send by looking
//! at the request itself: an output shape asks for JSON, a label list asks
//! for a classification, declared tools and handoffs ask for the next
//! action. Input topics are detected by keyword, so the same question always
//! gets the same answer.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{json, Map, Value};
use tracing::debug;

use switchyard_contracts::{
    error::SwitchyardResult,
    generation::{GenerationRequest, GenerationResponse},
    shape::Shape,
};
use switchyard_core::traits::GenerationService;

/// Topics the model recognizes, in matching order.
const TOPICS: &[(&str, &[&str])] = &[
    ("news", &["news", "latest", "headline", "breaking", "today"]),
    ("math", &["+", "solve", "equation", "integral", "math"]),
    ("history", &["president", "war", "empire", "century", "history"]),
    ("science", &["sun", "heat", "atom", "gravity", "science", "cell"]),
];

const SCHOOL_SUBJECTS: &[&str] = &["math", "history", "science"];

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "can", "do", "does", "for", "how", "i", "is", "me", "my", "of",
    "on", "please", "the", "to", "we", "what", "what's", "when", "where", "who", "why", "was",
];

/// First topic whose keywords appear in `input`.
pub fn detect_topic(input: &str) -> Option<&'static str> {
    let lower = input.to_lowercase();
    TOPICS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(topic, _)| *topic)
}

/// Drop punctuation and filler words, keeping the terms a search engine
/// cares about.
pub fn condense_query(question: &str) -> String {
    let terms: Vec<String> = question
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '+')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(&w.as_str()))
        .collect();

    if terms.is_empty() {
        question.trim().to_string()
    } else {
        terms.join(" ")
    }
}

#[derive(Debug, Default)]
pub struct KeywordModel {
    /// Answer JSON requests with prose instead.
    malformed: bool,
    calls: AtomicUsize,
}

impl KeywordModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model that ignores output shapes and answers in prose, for
    /// exercising structured-output fallbacks.
    pub fn malformed() -> Self {
        Self { malformed: true, ..Self::default() }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn structured(&self, shape: &Shape, input: &str) -> String {
        if self.malformed {
            return format!("Sure! Happy to help with \"{}\".", input.trim());
        }

        let properties = shape
            .json_schema
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let body = if properties.contains_key("search_query") {
            json!({
                "search_query": condense_query(input),
                "justification": "Removed filler words and kept the distinctive terms of the question."
            })
        } else {
            verdict_body(&properties, input)
        };

        format!("```json\n{body:#}\n```")
    }

    fn classify(&self, instructions: &str, input: &str) -> String {
        let lower = input.to_lowercase();
        TOPICS
            .iter()
            .filter(|(topic, _)| instructions.contains(&format!("'{topic}'")))
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(topic, _)| topic.to_string())
            .unwrap_or_else(|| "unsure".to_string())
    }
}

/// `{<boolean field>: holds, reasoning}` where the predicate holds for
/// school-subject questions.
fn verdict_body(properties: &Map<String, Value>, input: &str) -> Value {
    let field = properties
        .iter()
        .find(|(_, schema)| schema.get("type").and_then(Value::as_str) == Some("boolean"))
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| "passed".to_string());

    let (holds, reasoning) = match detect_topic(input) {
        Some(topic) if SCHOOL_SUBJECTS.contains(&topic) => {
            (true, format!("The question is a {topic} question a student might be set."))
        }
        Some(topic) => (false, format!("The question is about {topic}, not schoolwork.")),
        None => (false, "The question does not relate to any school subject.".to_string()),
    };

    json!({ field: holds, "reasoning": reasoning })
}

/// The weather agent's plan: locate, then fetch, then report.
fn next_weather_step(request: &GenerationRequest) -> Option<GenerationResponse> {
    let declares = |name: &str| request.tools.iter().any(|t| t.name == name);
    if !declares("fetch_weather") {
        return None;
    }

    match request.tool_results().last() {
        None if declares("get_my_location") => {
            Some(GenerationResponse::tool_call("get_my_location", json!({})))
        }
        Some(last) if last.name.as_deref() == Some("get_my_location") => {
            let location: Value = serde_json::from_str(&last.content).ok()?;
            Some(GenerationResponse::tool_call("fetch_weather", json!({ "location": location })))
        }
        _ => None,
    }
}

/// Hand off to the declared target named after the input's topic.
fn pick_handoff(request: &GenerationRequest, input: &str) -> Option<GenerationResponse> {
    let topic = detect_topic(input)?;
    request
        .handoffs
        .iter()
        .find(|h| {
            h.target
                .as_str()
                .split_whitespace()
                .next()
                .is_some_and(|first| first.eq_ignore_ascii_case(topic))
        })
        .map(|h| GenerationResponse::Handoff { target: h.target.clone() })
}

fn answer(request: &GenerationRequest, input: &str) -> String {
    if let Some(result) = request.tool_results().last() {
        return format!("Here is the current weather at your location:\n{}", result.content);
    }

    let lower = input.to_lowercase();
    if lower.contains("2+2") || lower.contains("2 + 2") {
        "2 + 2 = 4. Take two apples, add two more, and count: one, two, three, four.".to_string()
    } else if lower.contains("first president") {
        "George Washington was the first president of the United States, serving from 1789 to 1797."
            .to_string()
    } else if lower.contains("sun") {
        "The sun's energy crosses space as radiation, mostly visible and infrared light, and our skin absorbs it as heat."
            .to_string()
    } else {
        format!("Here is a short answer about \"{}\".", input.trim())
    }
}

impl GenerationService for KeywordModel {
    fn generate(&self, request: &GenerationRequest) -> SwitchyardResult<GenerationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let input = request.original_input().unwrap_or_default();

        let response = if let Some(shape) = &request.output_shape {
            GenerationResponse::text(self.structured(shape, input))
        } else if request.instructions.contains("Respond with exactly one of") {
            GenerationResponse::text(self.classify(&request.instructions, input))
        } else if let Some(step) = next_weather_step(request) {
            step
        } else if let Some(handoff) = pick_handoff(request, input) {
            handoff
        } else {
            GenerationResponse::text(answer(request, input))
        };

        debug!(?response, "keyword model responded");
        Ok(response)
    }
}
