//! Per-run context threaded through the loop and every tool.
//!
//! Created when a run starts and dropped when it ends; nothing here is global.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use crate::error::{Error, Result};
use crate::progress::{ProgressLog, StepHandle};

#[derive(Clone)]
pub struct RunContext {
    /// Cooperative cancellation signal for this run
    pub cancel: CancellationToken,

    /// Step log the run reports into
    pub progress: Arc<ProgressLog>,
}

impl RunContext {
    pub fn new(cancel: CancellationToken, progress: Arc<ProgressLog>) -> Self {
        Self { cancel, progress }
    }

    /// Fail with [`Error::Cancelled`] if the token has fired.
    pub fn checkpoint(&self) -> Result<()> {
        checkpoint(&self.cancel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Shorthand for `progress.append_step`.
    pub fn step(&self, label: impl Into<String>, message: impl Into<String>, icon: impl Into<String>) -> StepHandle {
        self.progress.append_step(label, message, icon)
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(CancellationToken::new(), Arc::new(ProgressLog::default()))
    }
}

/// Fail with [`Error::Cancelled`] if `token` has fired.
pub fn checkpoint(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_observes_token() {
        let ctx = RunContext::default();
        assert!(ctx.checkpoint().is_ok());
        ctx.cancel.cancel();
        assert!(ctx.checkpoint().unwrap_err().is_cancelled());
    }

    #[test]
    fn clones_share_the_token() {
        let ctx = RunContext::default();
        let other = ctx.clone();
        other.cancel.cancel();
        assert!(ctx.is_cancelled());
    }
}
