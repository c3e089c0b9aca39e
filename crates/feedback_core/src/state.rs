use std::collections::HashSet;

use crate::view_model::{AppViewModel, PicklistRowView, QueueRowView};
use crate::{ListingId, StoreSnapshot, TaskKind};

pub const STATUS_READY: &str = "Ready";

/// Foreground-only state. Background tasks never touch this directly; their
/// results arrive as [`crate::Msg`]s on the foreground thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    raw_input: String,
    search_query: String,
    queue: StoreSnapshot,
    picklist: StoreSnapshot,
    ready_images: HashSet<ListingId>,
    status: String,
    percent: u8,
    bulk_running: bool,
    search_running: bool,
    failure_summary: Option<String>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            raw_input: String::new(),
            search_query: String::new(),
            queue: StoreSnapshot::default(),
            picklist: StoreSnapshot::default(),
            ready_images: HashSet::new(),
            status: STATUS_READY.to_string(),
            percent: 0,
            bulk_running: false,
            search_running: false,
            failure_summary: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            status: self.status.clone(),
            percent: self.percent,
            raw_input: self.raw_input.clone(),
            search_query: self.search_query.clone(),
            item_count: self.queue.len(),
            queue: self
                .queue
                .iter()
                .map(|item| QueueRowView {
                    id: item.id.clone(),
                    status: item.status,
                    title: item.title.clone(),
                    error: item.last_error.clone(),
                })
                .collect(),
            picklist: self
                .picklist
                .iter()
                .map(|item| PicklistRowView {
                    id: item.id.clone(),
                    title: item.title.clone(),
                    timestamp: item.timestamp,
                    thumbnail_ready: item.thumbnail.is_some()
                        || self.ready_images.contains(&item.id),
                })
                .collect(),
            failure_summary: self.failure_summary.clone(),
            can_edit: !self.bulk_running,
            can_leave_feedback: !self.bulk_running && !self.queue.is_empty(),
            can_stop: self.bulk_running,
            search_running: self.search_running,
            dirty: self.dirty,
        }
    }

    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn queue(&self) -> &StoreSnapshot {
        &self.queue
    }

    pub fn picklist(&self) -> &StoreSnapshot {
        &self.picklist
    }

    pub fn is_running(&self, kind: TaskKind) -> bool {
        match kind {
            TaskKind::Search => self.search_running,
            TaskKind::BulkFeedback => self.bulk_running,
        }
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_raw_input(&mut self, raw: String) {
        self.raw_input = raw;
        self.mark_dirty();
    }

    pub(crate) fn set_search_query(&mut self, query: String) {
        self.search_query = query;
        self.mark_dirty();
    }

    pub(crate) fn set_running(&mut self, kind: TaskKind, running: bool) {
        match kind {
            TaskKind::Search => self.search_running = running,
            TaskKind::BulkFeedback => self.bulk_running = running,
        }
        self.mark_dirty();
    }

    pub(crate) fn set_status(&mut self, message: Option<String>, percent: Option<u8>) {
        if let Some(message) = message {
            self.status = message;
        }
        if let Some(percent) = percent {
            self.percent = percent.min(100);
        }
        self.mark_dirty();
    }

    pub(crate) fn set_failure_summary(&mut self, summary: Option<String>) {
        self.failure_summary = summary;
        self.mark_dirty();
    }

    pub(crate) fn set_queue(&mut self, snapshot: StoreSnapshot) {
        self.queue = snapshot;
        self.mark_dirty();
    }

    pub(crate) fn set_picklist(&mut self, snapshot: StoreSnapshot) {
        let present: HashSet<&str> = snapshot.iter().map(|item| item.id.as_str()).collect();
        self.ready_images.retain(|id| present.contains(id.as_str()));
        self.picklist = snapshot;
        self.mark_dirty();
    }

    pub(crate) fn mark_image_ready(&mut self, id: ListingId) {
        if self.ready_images.insert(id) {
            self.mark_dirty();
        }
    }
}
