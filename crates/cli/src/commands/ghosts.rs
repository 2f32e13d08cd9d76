//! `notewright ghosts` — List wiki links that point at no document.

use notewright_tools::find_ghost_references;
use std::path::PathBuf;

pub async fn run(vault: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(vault)?;
    let store = super::open_vault(&config)?;

    let ghosts = find_ghost_references(&store).await;
    if ghosts.is_empty() {
        println!("No ghost references found.");
        return Ok(());
    }

    println!("Found {} ghost reference(s):", ghosts.len());
    for ghost in &ghosts {
        println!("  {} → [[{}]]", ghost.source_file, ghost.unresolved_link);
    }
    Ok(())
}
