//! Marker tools — `plan` and `finish` have no effect on the vault.
//! They surface the model's intent in the progress log.

use async_trait::async_trait;
use notewright_core::context::RunContext;
use notewright_core::error::ToolError;
use notewright_core::progress::StepStatus;
use notewright_core::tool::{parse_arguments, Tool, ToolResult};
use serde::Deserialize;

pub struct PlanTool;

#[derive(Debug, Deserialize)]
struct PlanArgs {
    steps: Vec<String>,
}

#[async_trait]
impl Tool for PlanTool {
    fn name(&self) -> &str {
        "plan"
    }

    fn description(&self) -> &str {
        "Announce the steps you intend to take before changing the vault."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "steps": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Short, ordered step descriptions"
                }
            },
            "required": ["steps"]
        })
    }

    fn step_label(&self, _arguments: &serde_json::Value) -> String {
        "Planning".to_string()
    }

    fn icon(&self) -> &str {
        "list-checks"
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &RunContext,
    ) -> Result<ToolResult, ToolError> {
        let args: PlanArgs = parse_arguments(self.name(), arguments)?;
        if args.steps.is_empty() {
            return Err(ToolError::InvalidArguments("plan: steps must not be empty".into()));
        }

        let mut output = String::from("Plan recorded:\n");
        for (i, step) in args.steps.iter().enumerate() {
            ctx.step(step.as_str(), "", "circle");
            output.push_str(&format!("{}. {step}\n", i + 1));
        }
        Ok(ToolResult::text(output))
    }
}

pub struct FinishTool;

#[derive(Debug, Deserialize)]
struct FinishArgs {
    #[serde(default)]
    summary: String,
}

#[async_trait]
impl Tool for FinishTool {
    fn name(&self) -> &str {
        "finish"
    }

    fn description(&self) -> &str {
        "Report that the work is done, with a short summary of the changes."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "What was created or changed"
                }
            },
            "required": ["summary"]
        })
    }

    fn step_label(&self, _arguments: &serde_json::Value) -> String {
        "Finishing".to_string()
    }

    fn icon(&self) -> &str {
        "flag"
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &RunContext,
    ) -> Result<ToolResult, ToolError> {
        let args: FinishArgs = parse_arguments(self.name(), arguments)?;
        ctx.step("Summary", args.summary.as_str(), "check")
            .update_state(StepStatus::Complete, None);
        Ok(ToolResult::text("Finish acknowledged."))
    }
}
