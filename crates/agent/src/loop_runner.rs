//! The turn loop implementation.

use std::sync::Arc;
use notewright_config::AgentConfig;
use notewright_core::context::RunContext;
use notewright_core::error::{Error, Result};
use notewright_core::message::{Conversation, Message, Part};
use notewright_core::progress::StepStatus;
use notewright_core::provider::{collect_turn, Provider, ToolDefinition, TurnRequest, TurnResponse};
use notewright_core::tool::ToolRegistry;
use serde::Serialize;
use tracing::{debug, info, warn};
use crate::retry::{with_retries, Sleeper, TokioSleeper};

const PREVIEW_CHARS: usize = 120;

/// Per-run limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Maximum model calls in one run
    pub max_turns: u32,
    /// Attempts per model call (at least one is always made)
    pub max_retries: u32,
}

impl LoopConfig {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            max_turns: config.max_turns,
            max_retries: config.max_retries,
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_turns: 20,
            max_retries: 3,
        }
    }
}

/// Why a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model answered without calling any tool
    NaturalStop,
    /// `max_turns` model calls were made
    TurnBudget,
}

/// What a finished run hands back.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Tool-result parts of the last dispatch (empty if no tool ever ran)
    pub results: Vec<Part>,
    /// Model calls made
    pub turns: u32,
    /// Tool calls dispatched
    pub tool_calls: u32,
    pub stop_reason: StopReason,
    /// Text of the last model response
    pub final_text: String,
}

/// Drives a conversation through model calls and tool dispatches.
pub struct TurnLoop {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: String,
    temperature: f32,
    system_instruction: Option<String>,
    sleeper: Arc<dyn Sleeper>,
}

impl TurnLoop {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, model: impl Into<String>) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature: 0.7,
            system_instruction: None,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_instruction(mut self, instruction: Option<String>) -> Self {
        self.system_instruction = instruction;
        self
    }

    /// Replace the backoff sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Run the loop until the model stops calling tools or the turn budget is spent.
    ///
    /// `initial_parts` are appended to `session` as a user message. Every model
    /// and tool message is appended too, so the session holds the full exchange
    /// even when the run fails.
    pub async fn run(
        &self,
        session: &mut Conversation,
        initial_parts: Vec<Part>,
        config: &LoopConfig,
        ctx: &RunContext,
    ) -> Result<RunOutcome> {
        if config.max_turns == 0 {
            return Err(Error::Config {
                message: "max_turns must be greater than 0".into(),
            });
        }

        session.push(Message::user(initial_parts));
        let definitions = self.tools.definitions();

        let mut results = Vec::new();
        let mut turns = 0;
        let mut tool_calls = 0;
        let mut final_text = String::new();

        info!(model = %self.model, max_turns = config.max_turns, tools = definitions.len(), "Starting run");

        while turns < config.max_turns {
            ctx.checkpoint()?;
            turns += 1;
            debug!(turn = turns, messages = session.len(), "Awaiting model");

            let step = ctx.step("Thinking", "", "brain");
            step.update_state(StepStatus::InProgress, None);
            let response = match self.call_model(session, &definitions, config, ctx).await {
                Ok(response) => response,
                Err(e) => {
                    step.update_state(StepStatus::Error, Some(&e.to_string()));
                    return Err(e);
                }
            };
            step.update_state(StepStatus::Complete, Some(&preview(&response.text)));

            ctx.checkpoint()?;

            let parts = response.to_parts();
            if !parts.is_empty() {
                session.push(Message::model(parts));
            }
            final_text = response.text;

            if response.tool_calls.is_empty() {
                info!(turns, tool_calls, "Model stopped calling tools");
                return Ok(RunOutcome {
                    results,
                    turns,
                    tool_calls,
                    stop_reason: StopReason::NaturalStop,
                    final_text,
                });
            }

            let mut turn_results = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                ctx.checkpoint()?;
                tool_calls += 1;
                let output = match self.tools.execute(call, ctx).await {
                    Ok(result) => result.output,
                    Err(e) => {
                        warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool call failed");
                        format!("Error executing function {}: {e}", call.name)
                    }
                };
                turn_results.push(Part::tool_result(&call.id, &call.name, output));
            }

            session.push(Message::user(turn_results.clone()));
            results = turn_results;
        }

        warn!(turns, tool_calls, "Turn budget exhausted");
        Ok(RunOutcome {
            results,
            turns,
            tool_calls,
            stop_reason: StopReason::TurnBudget,
            final_text,
        })
    }

    async fn call_model(
        &self,
        session: &Conversation,
        definitions: &[ToolDefinition],
        config: &LoopConfig,
        ctx: &RunContext,
    ) -> Result<TurnResponse> {
        with_retries(config.max_retries, self.sleeper.as_ref(), &ctx.cancel, |attempt| {
            let request = TurnRequest {
                model: self.model.clone(),
                messages: session.messages.clone(),
                system_instruction: self.system_instruction.clone(),
                tools: definitions.to_vec(),
                temperature: self.temperature,
            };
            let provider = Arc::clone(&self.provider);
            async move {
                if attempt > 0 {
                    debug!(attempt = attempt + 1, "Retrying model call");
                }
                let rx = provider.stream(request).await?;
                let response = collect_turn(rx).await?;
                if let Some(usage) = &response.usage {
                    debug!(
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "Model usage"
                    );
                }
                Ok(response)
            }
        })
        .await
    }
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= PREVIEW_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}…")
    }
}
