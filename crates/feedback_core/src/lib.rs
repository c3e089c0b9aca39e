//! Feedback core: work item store, search filter and the foreground state machine.
mod effect;
mod item;
mod msg;
mod raw_list;
mod search;
mod state;
mod store;
mod task;
mod update;
mod view_model;

pub use effect::Effect;
pub use item::{FeedbackUpdate, ImageHandle, ItemStatus, ListingId, ListingItem, ListingMetadata};
pub use msg::Msg;
pub use raw_list::{append_ids, parse_raw_ids, sanitize_ids};
pub use search::{filter_listings, SearchQuery};
pub use state::{AppState, STATUS_READY};
pub use store::{
    ApplyOutcome, SortOrder, StoreError, StoreKind, StoreSnapshot, StoreTxn, SyncStats,
    WorkItemStore,
};
pub use task::{percent_of, ItemFailure, TaskKind, TaskOutcome, TaskReport};
pub use update::update;
pub use view_model::{AppViewModel, PicklistRowView, QueueRowView};
