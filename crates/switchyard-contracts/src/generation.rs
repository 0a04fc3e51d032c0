//! The generation service boundary.
//!
//! A request carries a system instruction, the conversation so far, and
//! optional declarations (output shape, tools, handoff targets). A response
//! is exactly one of: free text, a tool-invocation directive, or a handoff.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{agent::AgentId, shape::Shape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tool name for `Role::Tool` messages, agent name for assistant turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), name: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), name: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), name: None }
    }

    /// A tool result, tagged with the tool that produced it.
    pub fn tool(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            name: Some(name.into()),
        }
    }
}

/// What a tool looks like from the generation service's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub input: Shape,
    pub output: Shape,
}

/// A declared "may hand off to" edge, as presented to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffDeclaration {
    pub target: AgentId,
    pub description: String,
}

/// A tool-invocation directive from the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self { name: name.into(), arguments }
    }
}

/// A single request to the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// System instruction.
    pub instructions: String,
    /// The conversation, oldest first.
    pub messages: Vec<Message>,
    /// Structured output the service should conform to, if any.
    #[serde(default)]
    pub output_shape: Option<Shape>,
    #[serde(default)]
    pub tools: Vec<ToolDeclaration>,
    #[serde(default)]
    pub handoffs: Vec<HandoffDeclaration>,
}

impl GenerationRequest {
    pub fn new(instructions: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            instructions: instructions.into(),
            messages,
            output_shape: None,
            tools: Vec::new(),
            handoffs: Vec::new(),
        }
    }

    /// An instruction plus one user message.
    pub fn single_turn(instructions: impl Into<String>, user_content: impl Into<String>) -> Self {
        Self::new(instructions, vec![Message::user(user_content)])
    }

    pub fn with_output_shape(mut self, shape: Shape) -> Self {
        self.output_shape = Some(shape);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_handoffs(mut self, handoffs: Vec<HandoffDeclaration>) -> Self {
        self.handoffs = handoffs;
        self
    }

    /// Content of the first user message: the original input.
    pub fn original_input(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Tool messages appended so far, oldest first.
    pub fn tool_results(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role == Role::Tool)
    }
}

/// The service's answer to one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationResponse {
    /// Free text. Structured output arrives here too, to be parsed by the
    /// caller.
    Text { text: String },
    /// Invoke a declared tool.
    ToolCall { call: ToolCall },
    /// Transfer control to a declared handoff target.
    Handoff { target: AgentId },
}

impl GenerationResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool_call(name: impl Into<String>, arguments: Value) -> Self {
        Self::ToolCall { call: ToolCall::new(name, arguments) }
    }

    pub fn handoff(target: impl Into<String>) -> Self {
        Self::Handoff { target: AgentId::new(target) }
    }

    /// The text payload, if this is a text response.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}
