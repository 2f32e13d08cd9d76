//! Progress surface — the append-only step log a run reports into.
//!
//! Steps are created by the loop (and by tools through their UI hook) and
//! mutated in place via a [`StepHandle`]. Every change is broadcast so a UI
//! can render it; the loop itself never reads the log back.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

/// Lifecycle of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Complete,
    Error,
}

/// One entry in the step log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepEntry {
    /// Position in the log
    pub id: usize,
    pub label: String,
    pub icon: String,
    pub status: StepStatus,
    pub caption: String,
}

/// Change notifications sent to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    StepAppended(StepEntry),
    StepUpdated(StepEntry),
}

/// A per-run step log with broadcast notifications.
pub struct ProgressLog {
    steps: Mutex<Vec<StepEntry>>,
    sender: broadcast::Sender<Arc<ProgressEvent>>,
}

impl ProgressLog {
    /// Create a new log whose broadcast channel holds `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            steps: Mutex::new(Vec::new()),
            sender,
        }
    }

    /// Append a new step in the `Pending` state.
    pub fn append_step(
        self: &Arc<Self>,
        label: impl Into<String>,
        initial_message: impl Into<String>,
        icon: impl Into<String>,
    ) -> StepHandle {
        let entry = {
            let mut steps = self.lock();
            let entry = StepEntry {
                id: steps.len(),
                label: label.into(),
                icon: icon.into(),
                status: StepStatus::Pending,
                caption: initial_message.into(),
            };
            steps.push(entry.clone());
            entry
        };
        let index = entry.id;
        self.publish(ProgressEvent::StepAppended(entry));
        StepHandle {
            log: Arc::clone(self),
            index,
        }
    }

    /// Subscribe to step changes.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ProgressEvent>> {
        self.sender.subscribe()
    }

    /// Copy of every step recorded so far.
    pub fn snapshot(&self) -> Vec<StepEntry> {
        self.lock().clone()
    }

    fn update(&self, index: usize, apply: impl FnOnce(&mut StepEntry)) {
        let updated = {
            let mut steps = self.lock();
            let Some(entry) = steps.get_mut(index) else {
                return;
            };
            apply(entry);
            entry.clone()
        };
        self.publish(ProgressEvent::StepUpdated(updated));
    }

    fn publish(&self, event: ProgressEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StepEntry>> {
        self.steps.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ProgressLog {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Mutable view of one step.
#[derive(Clone)]
pub struct StepHandle {
    log: Arc<ProgressLog>,
    index: usize,
}

impl StepHandle {
    /// Change the status, optionally replacing the caption.
    pub fn update_state(&self, status: StepStatus, message: Option<&str>) {
        self.log.update(self.index, |entry| {
            entry.status = status;
            if let Some(message) = message {
                entry.caption = message.to_string();
            }
        });
    }

    pub fn update_caption(&self, message: &str) {
        self.log.update(self.index, |entry| {
            entry.caption = message.to_string();
        });
    }

    pub fn id(&self) -> usize {
        self.index
    }
}
