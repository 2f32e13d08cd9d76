//! `notewright process` — Run the agent over an instruction and attachments.

use notewright_agent::{split_by_token_budget, LoopConfig, Pipeline, StopReason, TurnLoop};
use notewright_core::attachment::Attachment;
use notewright_core::context::RunContext;
use notewright_core::message::Conversation;
use notewright_core::progress::{ProgressEvent, ProgressLog, StepStatus};
use notewright_tools::{default_registry, ProtectedPaths};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn run(
    instruction: String,
    files: Vec<PathBuf>,
    vault: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(vault)?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    GEMINI_API_KEY=...");
        eprintln!("    NOTEWRIGHT_API_KEY=...");
        eprintln!();
        eprintln!("  Or add api_key to {}", notewright_config::AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let store = Arc::new(super::open_vault(&config)?);
    let provider = notewright_providers::build_from_config(&config)?;

    let mut attachments = Vec::with_capacity(files.len());
    for path in &files {
        let attachment = Attachment::from_path(path)
            .await
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        attachments.push(attachment);
    }

    let tools = Arc::new(default_registry(
        store.clone(),
        ProtectedPaths::new(config.vault.protected_patterns.iter().cloned()),
        config.tools.descriptions.clone(),
    ));
    let turn_loop = TurnLoop::new(provider.clone(), tools, &config.default_model)
        .with_temperature(config.default_temperature)
        .with_system_instruction(config.agent.system_prompt.clone());
    let pipeline = Pipeline::from_config(provider.clone(), store, &config.preprocess);
    let loop_config = LoopConfig::from_config(&config.agent);

    let batches = match config.preprocess.max_input_tokens {
        Some(budget) => split_by_token_budget(provider.as_ref(), &instruction, budget).await?,
        None => vec![instruction],
    };
    if batches.is_empty() {
        return Err("The instruction is empty".into());
    }

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n  Cancelling after the current step...");
                cancel.cancel();
            }
        })
    };

    let progress = Arc::new(ProgressLog::default());
    let renderer = tokio::spawn(render_progress(progress.subscribe()));
    let ctx = RunContext::new(cancel.clone(), progress);

    let total = batches.len();
    let mut result: Result<(), Box<dyn std::error::Error>> = Ok(());
    for (index, batch) in batches.iter().enumerate() {
        if total > 1 {
            info!(batch = index + 1, total, "Processing instruction batch");
        }
        let mut session = Conversation::new();
        let outcome = async {
            // Attachments bound in an earlier batch are not uploaded again
            let parts = pipeline.build(&mut attachments, batch, &cancel).await?;
            turn_loop.run(&mut session, parts, &loop_config, &ctx).await
        }
        .await;

        match outcome {
            Ok(outcome) => {
                if outcome.stop_reason == StopReason::TurnBudget {
                    warn!(turns = outcome.turns, "Stopped at the turn limit");
                }
                println!(
                    "\n  Done in {} turn(s), {} tool call(s).",
                    outcome.turns, outcome.tool_calls
                );
                if !outcome.final_text.trim().is_empty() {
                    println!("\n{}", outcome.final_text.trim());
                }
            }
            Err(e) if e.is_cancelled() => {
                println!("\n  Cancelled. Changes made so far are kept.");
                break;
            }
            Err(e) => {
                result = Err(e.into());
                break;
            }
        }
    }

    ctrl_c.abort();
    // Closing the log's last handle ends the renderer
    drop(ctx);
    let _ = renderer.await;
    result
}

async fn render_progress(mut rx: tokio::sync::broadcast::Receiver<Arc<ProgressEvent>>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(line) = progress_line(&event) {
                    eprintln!("{line}");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Progress renderer fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// One console line per finished or failed step; pending steps stay quiet.
fn progress_line(event: &ProgressEvent) -> Option<String> {
    let entry = match event {
        ProgressEvent::StepAppended(entry) | ProgressEvent::StepUpdated(entry) => entry,
    };
    let mark = match entry.status {
        StepStatus::Pending | StepStatus::InProgress => return None,
        StepStatus::Complete => "✓",
        StepStatus::Error => "✗",
    };
    if entry.caption.is_empty() {
        Some(format!("  {mark} {}", entry.label))
    } else {
        Some(format!("  {mark} {} — {}", entry.label, entry.caption))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notewright_core::progress::StepEntry;

    fn entry(status: StepStatus, caption: &str) -> StepEntry {
        StepEntry {
            id: 0,
            label: "Writing Inbox/a.md".into(),
            icon: "file-pen".into(),
            status,
            caption: caption.into(),
        }
    }

    #[test]
    fn pending_steps_are_not_printed() {
        let event = ProgressEvent::StepAppended(entry(StepStatus::Pending, ""));
        assert!(progress_line(&event).is_none());
        let event = ProgressEvent::StepUpdated(entry(StepStatus::InProgress, ""));
        assert!(progress_line(&event).is_none());
    }

    #[test]
    fn finished_steps_show_mark_and_caption() {
        let event = ProgressEvent::StepUpdated(entry(StepStatus::Complete, ""));
        assert_eq!(progress_line(&event).unwrap(), "  ✓ Writing Inbox/a.md");

        let event = ProgressEvent::StepUpdated(entry(StepStatus::Error, "permission denied"));
        assert_eq!(
            progress_line(&event).unwrap(),
            "  ✗ Writing Inbox/a.md — permission denied"
        );
    }

    #[tokio::test]
    async fn renderer_stops_when_log_is_dropped() {
        let log = Arc::new(ProgressLog::new(8));
        let handle = tokio::spawn(render_progress(log.subscribe()));
        let step = log.append_step("Thinking", "", "brain");
        step.update_state(StepStatus::Complete, Some("done"));
        drop(step);
        drop(log);
        handle.await.unwrap();
    }
}
