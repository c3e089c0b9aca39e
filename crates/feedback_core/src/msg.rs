use crate::{ListingId, StoreKind, StoreSnapshot, TaskKind, TaskReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the pending id list.
    RawInputChanged(String),
    /// User asked to rewrite the pending list from the queue.
    SanitizeClicked,
    /// Ids picked from the picklist.
    ItemsPicked(Vec<ListingId>),
    /// User clicked "leave feedback"; `force` also targets already resolved items.
    LeaveFeedbackClicked { force: bool },
    StopClicked(TaskKind),
    IgnoreListedClicked,
    ClearCompletedClicked,
    /// User edited the search box.
    SearchChanged(String),
    RefreshClicked,
    /// Status line update from a background task.
    StatusReported {
        message: String,
        percent: Option<u8>,
    },
    /// A store changed; carries a fresh snapshot taken on the foreground.
    StoreChanged {
        store: StoreKind,
        snapshot: StoreSnapshot,
    },
    /// Settled items were removed from the queue.
    CompletedCleared { snapshot: StoreSnapshot },
    /// A picklist thumbnail finished loading.
    ImageReady { listing_id: ListingId },
    /// The engine refused to start a task.
    TaskRejected { kind: TaskKind, reason: String },
    /// Exactly once per task invocation that was not superseded.
    TaskFinished { kind: TaskKind, report: TaskReport },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
