use crate::{ItemStatus, ListingId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub status: String,
    pub percent: u8,
    pub raw_input: String,
    pub search_query: String,
    pub item_count: usize,
    pub queue: Vec<QueueRowView>,
    pub picklist: Vec<PicklistRowView>,
    pub failure_summary: Option<String>,
    pub can_edit: bool,
    pub can_leave_feedback: bool,
    pub can_stop: bool,
    pub search_running: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRowView {
    pub id: ListingId,
    pub status: ItemStatus,
    pub title: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PicklistRowView {
    pub id: ListingId,
    pub title: String,
    pub timestamp: i64,
    pub thumbnail_ready: bool,
}
