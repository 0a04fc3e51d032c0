//! `ModelGuardrail`: a guardrail whose predicate is decided by the
//! generation service.
//!
//! The service is asked for a JSON object `{<field>: bool, reasoning:
//! string}`. The tripwire fires when `<field>` is false. Output that cannot
//! be parsed or does not match that shape fails closed: the tripwire fires
//! and the raw text becomes the reasoning.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use switchyard_contracts::{
    error::SwitchyardResult,
    generation::{GenerationRequest, GenerationResponse},
    guardrail::GuardrailVerdict,
    shape::{Shape, ShapeRule, ShapeRuleType},
};
use switchyard_core::{
    structured::{parse_validated, StructuredOutput},
    traits::{GenerationService, Guardrail, ShapeValidator},
};

pub struct ModelGuardrail {
    name: String,
    instructions: String,
    /// Boolean field of the structured output that must be true to pass.
    predicate_field: String,
    output_shape: Shape,
    service: Arc<dyn GenerationService>,
    validator: Arc<dyn ShapeValidator>,
}

impl ModelGuardrail {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        predicate_field: impl Into<String>,
        service: Arc<dyn GenerationService>,
        validator: Arc<dyn ShapeValidator>,
    ) -> Self {
        let name = name.into();
        let predicate_field = predicate_field.into();
        let output_shape = verdict_shape(&name, &predicate_field);
        Self {
            name,
            instructions: instructions.into(),
            predicate_field,
            output_shape,
            service,
            validator,
        }
    }

    pub fn output_shape(&self) -> &Shape {
        &self.output_shape
    }

    fn request(&self, input: &str) -> GenerationRequest {
        let instructions = format!(
            "{}\nRespond with a JSON object with keys \"{}\" (boolean) and \"reasoning\" (string).",
            self.instructions.trim_end(),
            self.predicate_field
        );
        GenerationRequest::single_turn(instructions, input).with_output_shape(self.output_shape.clone())
    }

    fn fail_closed(&self, input: &str, raw: String, reason: String) -> GuardrailVerdict {
        warn!(guardrail = %self.name, %reason, "guardrail output unusable; failing closed");
        GuardrailVerdict::trip(self.name.clone(), input, raw).with_details(json!({ "error": reason }))
    }
}

/// `{<field>: bool, reasoning: string}`, both required.
fn verdict_shape(name: &str, field: &str) -> Shape {
    Shape::from_json_schema(
        format!("{}-verdict", name.to_lowercase().replace(' ', "-")),
        json!({
            "type": "object",
            "properties": {
                field: { "type": "boolean" },
                "reasoning": { "type": "string" }
            },
            "required": [field, "reasoning"]
        }),
    )
    .with_rule(ShapeRule::new(
        "reasoning-present",
        "the verdict must explain itself",
        ShapeRuleType::NonEmptyString { field_path: "reasoning".to_string() },
    ))
}

impl Guardrail for ModelGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, input: &str) -> SwitchyardResult<GuardrailVerdict> {
        let text = match self.service.generate(&self.request(input))? {
            GenerationResponse::Text { text } => text,
            other => {
                return Ok(self.fail_closed(
                    input,
                    String::new(),
                    format!("expected a text verdict, got {other:?}"),
                ))
            }
        };

        let parsed: StructuredOutput<Value> =
            parse_validated(&text, &self.output_shape, self.validator.as_ref())?;

        let value = match parsed {
            StructuredOutput::Parsed(value) => value,
            StructuredOutput::Fallback { raw, reason } => return Ok(self.fail_closed(input, raw, reason)),
        };

        let holds = value.get(&self.predicate_field).and_then(Value::as_bool).unwrap_or(false);
        let reasoning = value
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        info!(
            guardrail = %self.name,
            predicate = %self.predicate_field,
            holds,
            "guardrail verdict"
        );

        Ok(GuardrailVerdict::from_predicate(self.name.clone(), holds, input, reasoning).with_details(value))
    }
}
