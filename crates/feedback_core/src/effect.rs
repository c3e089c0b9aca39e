use crate::{ListingId, TaskKind};

/// Requests from the foreground state machine to the background engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Make the queue store hold exactly these ids.
    SyncQueue { ids: Vec<ListingId> },
    /// Start (or supersede) the picklist search/refresh task.
    StartSearch { query: String },
    StartBulkFeedback { force: bool },
    Cancel(TaskKind),
    IgnoreListed,
    ClearCompleted,
}
