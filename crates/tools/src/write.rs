//! Write tool — create or overwrite a document in the vault.

use async_trait::async_trait;
use notewright_core::context::RunContext;
use notewright_core::error::ToolError;
use notewright_core::store::{normalize_path, parent_of, DocumentStore};
use notewright_core::tool::{parse_arguments, Tool, ToolResult};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;
use crate::protected::ProtectedPaths;
use crate::{ensure_folder, store_failure};

pub struct WriteTool {
    store: Arc<dyn DocumentStore>,
    protected: ProtectedPaths,
}

impl WriteTool {
    pub fn new(store: Arc<dyn DocumentStore>, protected: ProtectedPaths) -> Self {
        Self { store, protected }
    }
}

#[derive(Debug, Deserialize)]
struct WriteArgs {
    path: String,
    content: String,
}

fn describe(paths: &[String]) -> String {
    if paths.is_empty() {
        "none".to_string()
    } else {
        paths.join(", ")
    }
}

#[async_trait]
impl Tool for WriteTool {
    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Create a note or overwrite an existing one. Missing parent folders are created."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Vault-relative path of the note, including the .md extension"
                },
                "content": {
                    "type": "string",
                    "description": "Full markdown content of the note"
                }
            },
            "required": ["path", "content"]
        })
    }

    fn step_label(&self, arguments: &serde_json::Value) -> String {
        match arguments["path"].as_str() {
            Some(path) => format!("Writing {path}"),
            None => "Writing note".to_string(),
        }
    }

    fn icon(&self) -> &str {
        "file-pen"
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        _ctx: &RunContext,
    ) -> Result<ToolResult, ToolError> {
        let args: WriteArgs = parse_arguments(self.name(), arguments)?;
        let path = normalize_path(&args.path)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        if path.is_empty() {
            return Err(ToolError::InvalidArguments("write: path must name a document".into()));
        }
        self.protected.check(self.name(), &path)?;

        // Models often send escaped newlines inside JSON strings
        let content = args.content.replace("\\n", "\n");

        ensure_folder(self.store.as_ref(), parent_of(&path))
            .await
            .map_err(|e| store_failure(self.name(), &path, e))?;

        let before: BTreeSet<String> = self
            .store
            .all_document_paths()
            .await
            .map_err(|e| store_failure(self.name(), &path, e))?
            .into_iter()
            .collect();

        self.store
            .write(&path, &content)
            .await
            .map_err(|e| store_failure(self.name(), &path, e))?;

        let after: BTreeSet<String> = self
            .store
            .all_document_paths()
            .await
            .map_err(|e| store_failure(self.name(), &path, e))?
            .into_iter()
            .collect();

        let added: Vec<String> = after.difference(&before).cloned().collect();
        let removed: Vec<String> = before.difference(&after).cloned().collect();
        debug!(path = %path, bytes = content.len(), added = added.len(), "Note written");

        Ok(ToolResult::text(format!(
            "Successfully wrote {path}.\nFiles added: {}\nFiles removed: {}",
            describe(&added),
            describe(&removed)
        ))
        .with_data(serde_json::json!({ "added": added, "removed": removed })))
    }
}
