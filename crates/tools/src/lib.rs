//! Vault tools for the Notewright agent.
//!
//! Tools give the model its only way to act on the vault: write, read, move
//! and list notes, check for unresolved links, and mark plan/finish milestones.

pub mod ghost_refs;
pub mod list;
pub mod markers;
pub mod move_note;
pub mod protected;
pub mod read;
pub mod write;

#[cfg(test)]
pub(crate) mod test_helpers;

use notewright_core::error::{StoreError, ToolError};
use notewright_core::store::{parent_of, DocumentStore};
use notewright_core::tool::ToolRegistry;
use std::collections::HashMap;
use std::sync::Arc;

pub use ghost_refs::{find_ghost_references, GhostReference, GhostReferencesTool};
pub use list::ListTool;
pub use markers::{FinishTool, PlanTool};
pub use move_note::MoveTool;
pub use protected::ProtectedPaths;
pub use read::ReadTool;
pub use write::WriteTool;

/// Create the registry of every vault tool.
///
/// `descriptions` replaces the built-in description of the named tools.
pub fn default_registry(
    store: Arc<dyn DocumentStore>,
    protected: ProtectedPaths,
    descriptions: HashMap<String, String>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new().with_descriptions(descriptions);
    registry.register(Box::new(WriteTool::new(store.clone(), protected.clone())));
    registry.register(Box::new(ReadTool::new(store.clone())));
    registry.register(Box::new(MoveTool::new(store.clone(), protected)));
    registry.register(Box::new(ListTool::new(store.clone())));
    registry.register(Box::new(GhostReferencesTool::new(store)));
    registry.register(Box::new(PlanTool));
    registry.register(Box::new(FinishTool));
    registry
}

/// Create `folder` and any missing ancestors.
pub(crate) async fn ensure_folder(store: &dyn DocumentStore, folder: &str) -> Result<(), StoreError> {
    let mut missing = Vec::new();
    let mut current = folder;
    while !current.is_empty() && !store.exists(current).await? {
        missing.push(current);
        current = parent_of(current);
    }
    for folder in missing.into_iter().rev() {
        store.create_folder(folder).await?;
    }
    Ok(())
}

pub(crate) fn store_failure(tool_name: &str, path: &str, err: StoreError) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: tool_name.to_string(),
        reason: format!("{path}: {err}"),
    }
}
