//! `notewright tree` — Print the vault's folder tree.

use notewright_store::render_tree;
use std::path::PathBuf;

pub async fn run(
    root: String,
    depth: usize,
    include_files: bool,
    vault: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if depth == 0 {
        return Err("--depth must be at least 1".into());
    }
    let config = super::load_config(vault)?;
    let store = super::open_vault(&config)?;
    let tree = render_tree(&store, &root, depth, include_files).await?;
    print!("{tree}");
    if !tree.ends_with('\n') {
        println!();
    }
    Ok(())
}
