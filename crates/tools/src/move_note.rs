//! Move tool — relocate or rename a note or folder.

use async_trait::async_trait;
use notewright_core::context::RunContext;
use notewright_core::error::ToolError;
use notewright_core::store::{normalize_path, parent_of, DocumentStore};
use notewright_core::tool::{parse_arguments, Tool, ToolResult};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use crate::protected::ProtectedPaths;
use crate::{ensure_folder, store_failure};

pub struct MoveTool {
    store: Arc<dyn DocumentStore>,
    protected: ProtectedPaths,
}

impl MoveTool {
    pub fn new(store: Arc<dyn DocumentStore>, protected: ProtectedPaths) -> Self {
        Self { store, protected }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveArgs {
    source_path: String,
    target_path: String,
}

#[async_trait]
impl Tool for MoveTool {
    fn name(&self) -> &str {
        "move"
    }

    fn description(&self) -> &str {
        "Move or rename a note or folder. The target's parent folders are created if missing."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "sourcePath": {
                    "type": "string",
                    "description": "Current vault path"
                },
                "targetPath": {
                    "type": "string",
                    "description": "New vault path"
                }
            },
            "required": ["sourcePath", "targetPath"]
        })
    }

    fn step_label(&self, arguments: &serde_json::Value) -> String {
        match (arguments["sourcePath"].as_str(), arguments["targetPath"].as_str()) {
            (Some(from), Some(to)) => format!("Moving {from} to {to}"),
            _ => "Moving note".to_string(),
        }
    }

    fn icon(&self) -> &str {
        "folder-input"
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        _ctx: &RunContext,
    ) -> Result<ToolResult, ToolError> {
        let args: MoveArgs = parse_arguments(self.name(), arguments)?;
        let source = normalize_path(&args.source_path)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let target = normalize_path(&args.target_path)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        self.protected.check(self.name(), &source)?;
        self.protected.check(self.name(), &target)?;

        let exists = self
            .store
            .exists(&source)
            .await
            .map_err(|e| store_failure(self.name(), &source, e))?;
        if source.is_empty() || !exists {
            return Err(ToolError::ExecutionFailed {
                tool_name: self.name().to_string(),
                reason: format!("Source not found: {}", args.source_path),
            });
        }

        ensure_folder(self.store.as_ref(), parent_of(&target))
            .await
            .map_err(|e| store_failure(self.name(), &target, e))?;
        self.store
            .rename(&source, &target)
            .await
            .map_err(|e| store_failure(self.name(), &source, e))?;

        debug!(from = %source, to = %target, "Note moved");
        Ok(ToolResult::text(format!("Moved {source} to {target}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notewright_store::InMemoryStore;

    fn setup() -> (Arc<dyn DocumentStore>, MoveTool) {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::with_documents([
            ("Inbox/Idea.md", "idea"),
            (".obsidian/app.md", "{}"),
        ]));
        let tool = MoveTool::new(store.clone(), ProtectedPaths::new([".obsidian"]));
        (store, tool)
    }

    #[tokio::test]
    async fn moves_into_new_folder() {
        let (store, tool) = setup();
        let result = tool
            .execute(
                serde_json::json!({"sourcePath": "Inbox/Idea.md", "targetPath": "Projects/2024/Idea.md"}),
                &RunContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(result.output, "Moved Inbox/Idea.md to Projects/2024/Idea.md");
        assert_eq!(store.read("Projects/2024/Idea.md").await.unwrap(), "idea");
        assert!(!store.exists("Inbox/Idea.md").await.unwrap());
    }

    #[tokio::test]
    async fn missing_source_fails() {
        let (_store, tool) = setup();
        let err = tool
            .execute(
                serde_json::json!({"sourcePath": "Nope.md", "targetPath": "Other.md"}),
                &RunContext::default(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Source not found: Nope.md"));
    }

    #[tokio::test]
    async fn protected_source_or_target_has_no_side_effects() {
        let (store, tool) = setup();
        for args in [
            serde_json::json!({"sourcePath": ".obsidian/app.md", "targetPath": "app.md"}),
            serde_json::json!({"sourcePath": "Inbox/Idea.md", "targetPath": ".obsidian/new/Idea.md"}),
        ] {
            let err = tool.execute(args, &RunContext::default()).await.unwrap_err();
            assert!(matches!(err, ToolError::PermissionDenied { .. }));
        }
        assert!(store.exists("Inbox/Idea.md").await.unwrap());
        assert!(store.exists(".obsidian/app.md").await.unwrap());
        assert!(!store.exists(".obsidian/new").await.unwrap());
    }
}
