//! Tool trait — the abstraction over the agent's capabilities.
//!
//! Tools are what let the model act on the vault: write, read, move and list
//! documents, check links, and mark plan/finish milestones.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use crate::context::RunContext;
use crate::error::ToolError;
use crate::progress::StepStatus;
use crate::provider::{ToolCallRequest, ToolDefinition};

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The output content fed back to the model
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// The core Tool trait.
///
/// Each tool implements this trait. Tools are registered in the ToolRegistry
/// and made available to the turn loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "write", "read").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &RunContext,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// Label of the progress step shown while this call runs.
    fn step_label(&self, _arguments: &serde_json::Value) -> String {
        format!("Running {}", self.name())
    }

    /// Icon of the progress step.
    fn icon(&self) -> &str {
        "wrench"
    }

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Deserialize tool arguments into a typed struct.
pub fn parse_arguments<T: DeserializeOwned>(
    tool_name: &str,
    arguments: serde_json::Value,
) -> std::result::Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidArguments(format!("{tool_name}: {e}")))
}

/// A registry of available tools.
///
/// The turn loop uses this to:
/// 1. Get tool definitions to send to the model
/// 2. Look up and execute tools when the model requests them
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
    descriptions: HashMap<String, String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
            descriptions: HashMap::new(),
        }
    }

    /// Override tool descriptions (tool name → description).
    pub fn with_descriptions(mut self, descriptions: HashMap<String, String>) -> Self {
        self.descriptions = descriptions;
        self
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the model), sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| {
                let mut def = t.to_definition();
                if let Some(description) = self.descriptions.get(&def.name) {
                    def.description = description.clone();
                }
                def
            })
            .collect()
    }

    /// Execute a tool call, reporting it as a progress step.
    pub async fn execute(
        &self,
        call: &ToolCallRequest,
        ctx: &RunContext,
    ) -> std::result::Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        let step = ctx.step(tool.step_label(&call.arguments), "", tool.icon());
        step.update_state(StepStatus::InProgress, None);
        debug!(tool = %call.name, call_id = %call.id, "Executing tool");

        let result = tool.execute(call.arguments.clone(), ctx).await;
        match &result {
            Ok(_) => step.update_state(StepStatus::Complete, None),
            Err(e) => step.update_state(StepStatus::Error, Some(&e.to_string())),
        }
        result
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
