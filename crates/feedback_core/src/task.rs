use std::fmt;

use crate::item::ListingId;

/// Kinds of background work; at most one task of each kind runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Picklist search/refresh.
    Search,
    BulkFeedback,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Search => write!(f, "search"),
            TaskKind::BulkFeedback => write!(f, "bulk feedback"),
        }
    }
}

/// How a task invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Cancelled,
    /// A newer task of the same kind took over. Never reported to the foreground.
    Superseded,
    /// Invariant violation or panic inside the task body.
    Failed,
}

/// A per-item remote failure retained for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub id: ListingId,
    pub reason: String,
}

/// Final report delivered once per task invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub outcome: TaskOutcome,
    pub message: String,
    pub percent: u8,
    pub processed: usize,
    pub total: usize,
    pub failures: Vec<ItemFailure>,
}

impl TaskReport {
    pub fn new(outcome: TaskOutcome, message: impl Into<String>, processed: usize, total: usize) -> Self {
        Self {
            outcome,
            message: message.into(),
            percent: percent_of(processed, total),
            processed,
            total,
            failures: Vec::new(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            outcome: TaskOutcome::Failed,
            message: message.into(),
            percent: 0,
            processed: 0,
            total: 0,
            failures: Vec::new(),
        }
    }

    pub fn with_failures(mut self, failures: Vec<ItemFailure>) -> Self {
        self.failures = failures;
        self
    }

    /// One-line summary such as `2 failed: 11 (timeout); 12 (http status 500)`.
    pub fn failure_summary(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let details: Vec<String> = self
            .failures
            .iter()
            .map(|failure| format!("{} ({})", failure.id, failure.reason))
            .collect();
        Some(format!("{} failed: {}", self.failures.len(), details.join("; ")))
    }
}

/// Integer percentage; an empty batch counts as complete.
pub fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let done = done.min(total);
    ((done * 100) / total) as u8
}
