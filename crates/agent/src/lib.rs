//! The Notewright agent — the turn loop and everything that feeds it.
//!
//! A run follows a **Call → Dispatch → Feed back** cycle:
//!
//! 1. **Preprocess**: upload attachments and build the first message
//! 2. **Call the model** with the whole conversation and every tool definition
//! 3. **If tool calls**: dispatch them in order, append the results, loop back
//! 4. **If no tool calls**: stop and return the last tool results
//!
//! The loop also stops after `max_turns` model calls, and bails out at the
//! next checkpoint once the run's cancellation token fires.

pub mod batch;
pub mod loop_runner;
pub mod preprocess;
pub mod retry;
pub mod uploader;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use batch::split_by_token_budget;
pub use loop_runner::{LoopConfig, RunOutcome, StopReason, TurnLoop};
pub use preprocess::Pipeline;
pub use retry::{backoff_delay, with_retries, Sleeper, TokioSleeper};
pub use uploader::ContentUploader;
