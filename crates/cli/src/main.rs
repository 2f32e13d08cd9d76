//! Notewright CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Write a default config file
//! - `process`  — Run the agent over an instruction and attachments
//! - `tree`     — Print the vault's folder tree
//! - `ghosts`   — List links that resolve to no document
//! - `status`   — Show the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "notewright",
    about = "Notewright — build and reorganize a markdown vault with a tool-calling agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Vault directory (overrides config and NOTEWRIGHT_VAULT)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config directory and a default config file
    Onboard,

    /// Process an instruction, optionally with attached files
    Process {
        /// What the agent should do with the vault
        instruction: Option<String>,

        /// Read the instruction from a file instead
        #[arg(short = 'i', long, conflicts_with = "instruction")]
        instruction_file: Option<PathBuf>,

        /// Files to upload alongside the instruction
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,
    },

    /// Print the vault's folder tree
    Tree {
        /// Folder to start from
        #[arg(default_value = "/")]
        root: String,

        /// How many levels to descend
        #[arg(short, long, default_value_t = 3)]
        depth: usize,

        /// Hide documents, show folders only
        #[arg(long)]
        folders_only: bool,
    },

    /// List wiki links that resolve to no document
    Ghosts,

    /// Show the effective configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Process {
            instruction,
            instruction_file,
            files,
        } => {
            let instruction = match (instruction, instruction_file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
                (None, None) => return Err("Give an instruction or --instruction-file".into()),
            };
            commands::process::run(instruction, files, cli.vault).await?
        }
        Commands::Tree {
            root,
            depth,
            folders_only,
        } => commands::tree::run(root, depth, !folders_only, cli.vault).await?,
        Commands::Ghosts => commands::ghosts::run(cli.vault).await?,
        Commands::Status => commands::status::run(cli.vault).await?,
    }

    Ok(())
}
