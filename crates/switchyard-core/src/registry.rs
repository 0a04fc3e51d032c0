//! Name → tool lookup for the agent loop.
//!
//! A registry is filled once when an agent is defined and only read after
//! that. Invocation goes through `invoke`, which validates arguments against
//! the tool's declared input shape before the tool runs, and the result
//! against its declared output shape after.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use switchyard_contracts::{
    error::{SwitchyardError, SwitchyardResult, ToolInvocationError},
    generation::{ToolCall, ToolDeclaration},
};

use crate::traits::{ShapeValidator, Tool};

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tool`. Returns `ConfigError` if the name is already taken.
    pub fn register<T>(&mut self, tool: T) -> SwitchyardResult<()>
    where
        T: Tool + 'static,
    {
        self.register_shared(Arc::new(tool))
    }

    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) -> SwitchyardResult<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(SwitchyardError::config(format!(
                "tool '{name}' is already registered"
            )));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Builder-style `register`.
    pub fn with<T>(mut self, tool: T) -> SwitchyardResult<Self>
    where
        T: Tool + 'static,
    {
        self.register(tool)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Declarations in name order, as sent to the generation service.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.values().map(|t| t.declaration().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up, validate, and invoke the tool named by `call`.
    ///
    /// # Errors
    ///
    /// `ToolInvocation(UnknownTool)` if the name is not registered,
    /// `ToolInvocation(InvalidArguments)` if the arguments do not match the
    /// declared input shape, `ToolInvocation(Failed)` if the tool fails,
    /// `ToolInvocation(InvalidResult)` if its result does not match the
    /// declared output shape.
    pub fn invoke(&self, call: &ToolCall, validator: &dyn ShapeValidator) -> SwitchyardResult<Value> {
        let tool = self.tools.get(&call.name).ok_or_else(|| {
            warn!(tool = %call.name, "generation service requested an unregistered tool");
            ToolInvocationError::UnknownTool { tool: call.name.clone() }
        })?;

        let report = validator.validate(&call.arguments, &tool.declaration().input)?;
        if !report.passed {
            let reason = report.summary();
            warn!(tool = %call.name, %reason, "tool arguments rejected");
            return Err(ToolInvocationError::InvalidArguments {
                tool: call.name.clone(),
                reason,
            }
            .into());
        }

        debug!(tool = %call.name, "invoking tool");
        let result = tool.invoke(&call.arguments).map_err(|e| {
            warn!(tool = %call.name, error = %e, "tool invocation failed");
            e
        })?;

        let report = validator.validate(&result, &tool.declaration().output)?;
        if !report.passed {
            let reason = report.summary();
            warn!(tool = %call.name, %reason, "tool result rejected");
            return Err(ToolInvocationError::InvalidResult {
                tool: call.name.clone(),
                reason,
            }
            .into());
        }
        Ok(result)
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}
