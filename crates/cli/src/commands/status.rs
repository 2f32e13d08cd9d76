//! `notewright status` — Show the effective configuration.

use notewright_config::AppConfig;
use std::path::PathBuf;

pub async fn run(vault: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(vault)?;

    println!("Notewright Status");
    println!("=================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!(
        "  Vault:        {}",
        config
            .vault
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not set)".into())
    );
    println!("  Model:        {}", config.default_model);
    println!("  Temperature:  {}", config.default_temperature);
    println!("  API URL:      {}", config.provider.api_url);
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!("  Max turns:    {}", config.agent.max_turns);
    println!("  Max retries:  {}", config.agent.max_retries);
    println!("  Tree depth:   {}", config.preprocess.tree_depth);
    println!("  Upload batch: {}", config.preprocess.upload_batch_size);
    match config.preprocess.max_input_tokens {
        Some(budget) => println!("  Token budget: {budget}"),
        None => println!("  Token budget: unlimited"),
    }
    if !config.vault.protected_patterns.is_empty() {
        println!("  Protected:    {}", config.vault.protected_patterns.join(", "));
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `notewright onboard` first");
    }

    Ok(())
}
