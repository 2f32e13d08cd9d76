//! List tool — render the vault's folder structure as a tree.

use async_trait::async_trait;
use notewright_core::context::RunContext;
use notewright_core::error::ToolError;
use notewright_core::store::DocumentStore;
use notewright_core::tool::{parse_arguments, Tool, ToolResult};
use notewright_store::render_tree;
use serde::Deserialize;
use std::sync::Arc;
use crate::store_failure;

pub struct ListTool {
    store: Arc<dyn DocumentStore>,
}

impl ListTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListArgs {
    #[serde(default = "default_root")]
    root_path: String,
    #[serde(default = "default_depth")]
    depth: i64,
    #[serde(default = "default_include_files")]
    include_files: bool,
}

fn default_root() -> String {
    "/".into()
}
fn default_depth() -> i64 {
    1
}
fn default_include_files() -> bool {
    true
}

#[async_trait]
impl Tool for ListTool {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "List the folders (and optionally notes) under a vault folder as a tree."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "rootPath": {
                    "type": "string",
                    "description": "Folder to start from; \"/\" is the vault root"
                },
                "depth": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "How many levels to descend"
                },
                "includeFiles": {
                    "type": "boolean",
                    "description": "Whether notes are listed alongside folders"
                }
            },
            "required": ["rootPath", "depth"]
        })
    }

    fn step_label(&self, arguments: &serde_json::Value) -> String {
        format!("Listing {}", arguments["rootPath"].as_str().unwrap_or("/"))
    }

    fn icon(&self) -> &str {
        "folder-tree"
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        _ctx: &RunContext,
    ) -> Result<ToolResult, ToolError> {
        let args: ListArgs = parse_arguments(self.name(), arguments)?;
        if args.depth < 1 {
            return Err(ToolError::InvalidArguments(format!(
                "list: depth must be at least 1, got {}",
                args.depth
            )));
        }

        let tree = render_tree(
            self.store.as_ref(),
            &args.root_path,
            args.depth as usize,
            args.include_files,
        )
        .await
        .map_err(|e| store_failure(self.name(), &args.root_path, e))?;

        Ok(ToolResult::text(tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notewright_store::InMemoryStore;

    fn tool() -> ListTool {
        ListTool::new(Arc::new(InMemoryStore::with_documents([
            ("b.md", ""),
            ("a.md", ""),
            ("Zeta/z.md", ""),
            ("Alpha/x.md", ""),
        ])))
    }

    #[tokio::test]
    async fn folders_first_then_files() {
        let result = tool()
            .execute(
                serde_json::json!({"rootPath": "/", "depth": 1, "includeFiles": true}),
                &RunContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(result.output, "/\n├── Alpha/\n├── Zeta/\n├── a.md\n└── b.md\n");
    }

    #[tokio::test]
    async fn depth_below_one_is_invalid() {
        let err = tool()
            .execute(serde_json::json!({"rootPath": "/", "depth": 0}), &RunContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn file_root_is_an_error() {
        let err = tool()
            .execute(serde_json::json!({"rootPath": "a.md", "depth": 2}), &RunContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }
}
