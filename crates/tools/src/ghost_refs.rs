//! Ghost reference check — find links that point at notes which don't exist.

use async_trait::async_trait;
use notewright_core::context::RunContext;
use notewright_core::error::ToolError;
use notewright_core::store::DocumentStore;
use notewright_core::tool::{Tool, ToolResult};
use notewright_store::resolve_link;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

pub struct GhostReferencesTool {
    store: Arc<dyn DocumentStore>,
}

impl GhostReferencesTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

/// A link whose target cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostReference {
    pub source_file: String,
    pub unresolved_link: String,
}

/// Scan every markdown document for unresolved links.
///
/// The vault is enumerated once and every link resolves against that
/// snapshot. Unreadable documents are skipped with a warning.
pub async fn find_ghost_references(store: &dyn DocumentStore) -> Vec<GhostReference> {
    let documents = match store.all_document_paths().await {
        Ok(docs) => docs,
        Err(e) => {
            warn!(error = %e, "Could not enumerate documents for ghost scan");
            return Vec::new();
        }
    };

    let mut ghosts = Vec::new();
    for doc in documents.iter().filter(|d| d.to_lowercase().ends_with(".md")) {
        let links = match store.links_of(doc).await {
            Ok(links) => links,
            Err(e) => {
                warn!(path = %doc, error = %e, "Skipping unreadable document");
                continue;
            }
        };
        for link in links {
            if resolve_link(&link.link, doc, &documents).is_none() {
                ghosts.push(GhostReference {
                    source_file: doc.clone(),
                    unresolved_link: link.link,
                });
            }
        }
    }
    ghosts
}

#[async_trait]
impl Tool for GhostReferencesTool {
    fn name(&self) -> &str {
        "getGhostReferences"
    }

    fn description(&self) -> &str {
        "Find links in the vault that point to notes which do not exist yet."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    fn step_label(&self, _arguments: &serde_json::Value) -> String {
        "Checking links".to_string()
    }

    fn icon(&self) -> &str {
        "ghost"
    }

    async fn execute(
        &self,
        _arguments: serde_json::Value,
        _ctx: &RunContext,
    ) -> Result<ToolResult, ToolError> {
        let ghosts = find_ghost_references(self.store.as_ref()).await;
        if ghosts.is_empty() {
            return Ok(ToolResult::text("No ghost references found."));
        }

        let mut output = format!("Found {} ghost reference(s):\n", ghosts.len());
        for ghost in &ghosts {
            output.push_str(&format!("- {}: [[{}]]\n", ghost.source_file, ghost.unresolved_link));
        }
        let data = serde_json::to_value(&ghosts).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().to_string(),
            reason: e.to_string(),
        })?;
        Ok(ToolResult::text(output).with_data(data))
    }
}
