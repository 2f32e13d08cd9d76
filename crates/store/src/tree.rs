//! Tree rendering shared by the `list` tool and the preprocessing snapshot.
//!
//! Folders sort before documents; names sort lexicographically within each group.

use futures::future::BoxFuture;
use notewright_core::error::StoreError;
use notewright_core::store::{normalize_path, DocumentStore, Node, NodeKind};

/// Sort nodes: folders first, then by name.
pub fn sort_nodes(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| {
        let rank = |n: &Node| if n.kind == NodeKind::Folder { 0 } else { 1 };
        rank(a).cmp(&rank(b)).then_with(|| a.name().cmp(b.name()))
    });
}

/// Render the subtree under `root` down to `depth` levels as a connector-prefixed tree.
///
/// Fails if `root` does not exist or is not a folder.
pub async fn render_tree(
    store: &dyn DocumentStore,
    root: &str,
    depth: usize,
    include_files: bool,
) -> Result<String, StoreError> {
    let root = normalize_path(root)?;
    let node = store
        .node(&root)
        .await?
        .ok_or_else(|| StoreError::NotFound(display_root(&root)))?;
    if !node.is_folder() {
        return Err(StoreError::NotAFolder(root));
    }

    let mut out = String::new();
    out.push_str(&display_root(&root));
    out.push('\n');
    if depth > 0 {
        walk(store, root, String::new(), depth, include_files, &mut out).await?;
    }
    Ok(out)
}

fn display_root(root: &str) -> String {
    if root.is_empty() {
        "/".to_string()
    } else {
        format!("{root}/")
    }
}

fn walk<'a>(
    store: &'a dyn DocumentStore,
    folder: String,
    prefix: String,
    remaining: usize,
    include_files: bool,
    out: &'a mut String,
) -> BoxFuture<'a, Result<(), StoreError>> {
    Box::pin(async move {
        let mut children = store.list_children(&folder).await?;
        if !include_files {
            children.retain(Node::is_folder);
        }
        sort_nodes(&mut children);

        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            let last = i + 1 == count;
            let connector = if last { "└── " } else { "├── " };
            let suffix = if child.is_folder() { "/" } else { "" };
            out.push_str(&format!("{prefix}{connector}{}{suffix}\n", child.name()));

            if child.is_folder() && remaining > 1 {
                let nested = format!("{prefix}{}", if last { "    " } else { "│   " });
                walk(store, child.path, nested, remaining - 1, include_files, out).await?;
            }
        }
        Ok(())
    })
}
