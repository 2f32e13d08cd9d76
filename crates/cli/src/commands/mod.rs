pub mod ghosts;
pub mod onboard;
pub mod process;
pub mod status;
pub mod tree;

use notewright_config::AppConfig;
use notewright_store::FsDocumentStore;
use std::path::PathBuf;

/// Load the config, letting a `--vault` flag win over the file and environment.
pub(crate) fn load_config(vault: Option<PathBuf>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(path) = vault {
        config.vault.path = Some(path);
    }
    Ok(config)
}

pub(crate) fn open_vault(config: &AppConfig) -> Result<FsDocumentStore, Box<dyn std::error::Error>> {
    let Some(path) = config.vault.path.as_ref() else {
        return Err("No vault configured. Pass --vault, set NOTEWRIGHT_VAULT, or add [vault] path to config.toml".into());
    };
    let store = FsDocumentStore::open(path)
        .map_err(|e| format!("Cannot open vault {}: {e}", path.display()))?;
    Ok(store)
}
