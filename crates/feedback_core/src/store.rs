//! Shared, ordered collection of listings with per-item status.
//!
//! The store is the only state shared between the foreground and background
//! tasks. Every access goes through a short critical section; readers take a
//! [`StoreSnapshot`], which owns its data and can be iterated while background
//! tasks keep mutating the store.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use engine_logging::engine_debug;
use thiserror::Error;

use crate::item::{FeedbackUpdate, ImageHandle, ItemStatus, ListingId, ListingItem};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("work item store lock poisoned by a panicking writer")]
    Poisoned,
}

/// Which of the application's stores an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// Pending feedback items.
    Queue,
    /// Browsable listings produced by search/refresh.
    Picklist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Insertion,
    /// Most recent first; ties keep insertion order.
    TimestampDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The item already carries the requested status.
    Unchanged,
    /// The item is settled and needs an explicit reset first.
    Rejected,
    UnknownId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStats {
    pub added: usize,
    pub removed: usize,
    pub kept: usize,
}

#[derive(Debug, Default)]
struct StoreInner {
    order: Vec<ListingId>,
    items: HashMap<ListingId, ListingItem>,
    images: HashMap<ImageHandle, Arc<[u8]>>,
    next_image: u64,
    sort: SortOrder,
    revision: u64,
}

impl StoreInner {
    fn display_order(&self) -> Vec<&ListingItem> {
        let mut items: Vec<&ListingItem> = self
            .order
            .iter()
            .filter_map(|id| self.items.get(id))
            .collect();
        if self.sort == SortOrder::TimestampDesc {
            // `sort_by` is stable, so equal timestamps keep insertion order.
            items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }
        items
    }

    fn release_image(&mut self, handle: Option<ImageHandle>) {
        if let Some(handle) = handle {
            self.images.remove(&handle);
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

/// Cloneable handle to a shared store. Clones observe the same items.
#[derive(Debug, Clone, Default)]
pub struct WorkItemStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl WorkItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort(sort: SortOrder) -> Self {
        let store = Self::default();
        if let Ok(mut inner) = store.inner.lock() {
            inner.sort = sort;
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Runs `f` with exclusive access to the store.
    ///
    /// Background tasks use this to check their generation token and mutate in
    /// one critical section, so a superseding task cannot interleave between
    /// the check and the write.
    pub fn transact<R>(&self, f: impl FnOnce(&mut StoreTxn<'_>) -> R) -> Result<R, StoreError> {
        let mut guard = self.lock()?;
        let mut txn = StoreTxn { inner: &mut guard };
        Ok(f(&mut txn))
    }

    pub fn upsert(&self, item: ListingItem) -> Result<bool, StoreError> {
        self.transact(|txn| txn.upsert(item))
    }

    pub fn remove(&self, id: &str) -> Result<Option<ListingItem>, StoreError> {
        self.transact(|txn| txn.remove(id))
    }

    pub fn get(&self, id: &str) -> Result<Option<ListingItem>, StoreError> {
        self.transact(|txn| txn.get(id).cloned())
    }

    pub fn apply_update(
        &self,
        id: &str,
        update: FeedbackUpdate,
    ) -> Result<ApplyOutcome, StoreError> {
        self.transact(|txn| txn.apply_update(id, update))
    }

    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let inner = self.lock()?;
        Ok(StoreSnapshot {
            revision: inner.revision,
            items: inner.display_order().into_iter().cloned().collect(),
        })
    }

    /// Ids in display order.
    pub fn ids(&self) -> Result<Vec<ListingId>, StoreError> {
        self.transact(|txn| txn.ids())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.items.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    pub fn thumbnail(&self, handle: ImageHandle) -> Result<Option<Arc<[u8]>>, StoreError> {
        Ok(self.lock()?.images.get(&handle).cloned())
    }

    pub fn image_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.images.len())
    }

    pub fn set_sort(&self, sort: SortOrder) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.sort != sort {
            inner.sort = sort;
            inner.touch();
        }
        Ok(())
    }

    /// Marks every `Empty` item as `Ignore`; returns how many changed.
    pub fn ignore_unset(&self) -> Result<usize, StoreError> {
        self.transact(|txn| {
            let targets: Vec<ListingId> = txn
                .ids()
                .into_iter()
                .filter(|id| txn.status_of(id) == Some(ItemStatus::Empty))
                .collect();
            targets
                .iter()
                .filter(|id| txn.apply_update(id, FeedbackUpdate::ignore()) == ApplyOutcome::Applied)
                .count()
        })
    }

    /// Removes every `Done`/`Ignore` item, releasing their thumbnails.
    pub fn remove_settled(&self) -> Result<Vec<ListingId>, StoreError> {
        self.transact(|txn| txn.remove_settled())
    }

    pub fn sync_ids(&self, ids: &[ListingId]) -> Result<SyncStats, StoreError> {
        self.transact(|txn| txn.sync_ids(ids))
    }
}

/// Exclusive view of the store inside [`WorkItemStore::transact`].
pub struct StoreTxn<'a> {
    inner: &'a mut StoreInner,
}

impl StoreTxn<'_> {
    /// Inserts or replaces an item. Returns `true` when the id was new.
    ///
    /// A replaced item keeps its display position. If the replacement carries
    /// a different thumbnail handle, the old image is released.
    pub fn upsert(&mut self, item: ListingItem) -> bool {
        let id = item.id.clone();
        let inserted = match self.inner.items.insert(id.clone(), item) {
            Some(previous) => {
                let current = self.inner.items.get(&id).and_then(|item| item.thumbnail);
                if previous.thumbnail != current {
                    self.inner.release_image(previous.thumbnail);
                }
                false
            }
            None => {
                self.inner.order.push(id);
                true
            }
        };
        self.inner.touch();
        inserted
    }

    pub fn remove(&mut self, id: &str) -> Option<ListingItem> {
        let removed = self.inner.items.remove(id)?;
        self.inner.order.retain(|existing| existing != id);
        self.inner.release_image(removed.thumbnail);
        self.inner.touch();
        engine_debug!("store: removed {}", id);
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&ListingItem> {
        self.inner.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.items.contains_key(id)
    }

    pub fn status_of(&self, id: &str) -> Option<ItemStatus> {
        self.inner.items.get(id).map(|item| item.status)
    }

    pub fn ids(&self) -> Vec<ListingId> {
        self.inner
            .display_order()
            .into_iter()
            .map(|item| item.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.is_empty()
    }

    pub fn apply_update(&mut self, id: &str, update: FeedbackUpdate) -> ApplyOutcome {
        let Some(item) = self.inner.items.get_mut(id) else {
            return ApplyOutcome::UnknownId;
        };
        if item.status == update.status {
            return ApplyOutcome::Unchanged;
        }
        if !item.status.accepts(update.status) {
            return ApplyOutcome::Rejected;
        }
        item.status = update.status;
        if update.status != ItemStatus::Error {
            item.last_error = None;
        }
        self.inner.touch();
        ApplyOutcome::Applied
    }

    /// Marks the item `Error` and keeps the failure reason for display.
    pub fn record_failure(&mut self, id: &str, reason: impl Into<String>) -> ApplyOutcome {
        let outcome = self.apply_update(id, FeedbackUpdate::new(ItemStatus::Error));
        if matches!(outcome, ApplyOutcome::Applied | ApplyOutcome::Unchanged) {
            if let Some(item) = self.inner.items.get_mut(id) {
                item.last_error = Some(reason.into());
                self.inner.touch();
            }
        }
        outcome
    }

    /// Explicit reset back to `Empty`. Returns `false` for unknown ids.
    pub fn reset(&mut self, id: &str) -> bool {
        let Some(item) = self.inner.items.get_mut(id) else {
            return false;
        };
        if item.status != ItemStatus::Empty || item.last_error.is_some() {
            item.status = ItemStatus::Empty;
            item.last_error = None;
            self.inner.touch();
        }
        true
    }

    /// Takes ownership of thumbnail bytes for `id`.
    ///
    /// Returns `None` (and drops the bytes) when the id is not in the store.
    pub fn attach_thumbnail(&mut self, id: &str, bytes: Vec<u8>) -> Option<ImageHandle> {
        if !self.inner.items.contains_key(id) {
            return None;
        }
        self.inner.next_image += 1;
        let handle = ImageHandle(self.inner.next_image);
        self.inner.images.insert(handle, Arc::from(bytes));
        let previous = self
            .inner
            .items
            .get_mut(id)
            .and_then(|item| item.thumbnail.replace(handle));
        self.inner.release_image(previous);
        self.inner.touch();
        Some(handle)
    }

    pub fn clear(&mut self) {
        if self.inner.items.is_empty() {
            return;
        }
        self.inner.order.clear();
        self.inner.items.clear();
        self.inner.images.clear();
        self.inner.touch();
    }

    pub fn remove_settled(&mut self) -> Vec<ListingId> {
        let settled: Vec<ListingId> = self
            .inner
            .order
            .iter()
            .filter(|id| {
                self.inner
                    .items
                    .get(*id)
                    .is_some_and(|item| item.status.is_settled())
            })
            .cloned()
            .collect();
        for id in &settled {
            self.remove(id);
        }
        settled
    }

    /// Makes the store hold exactly `ids`, in that order.
    ///
    /// Existing items keep their status and metadata; new ids start `Empty`.
    pub fn sync_ids(&mut self, ids: &[ListingId]) -> SyncStats {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let stale: Vec<ListingId> = self
            .inner
            .order
            .iter()
            .filter(|id| !wanted.contains(id.as_str()))
            .cloned()
            .collect();

        let mut stats = SyncStats::default();
        for id in &stale {
            if self.remove(id).is_some() {
                stats.removed += 1;
            }
        }

        let mut order = Vec::with_capacity(ids.len());
        let mut seen = HashSet::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            if self.inner.items.contains_key(id) {
                stats.kept += 1;
            } else {
                self.inner.items.insert(id.clone(), ListingItem::pending(id.clone()));
                stats.added += 1;
            }
            order.push(id.clone());
        }
        if order != self.inner.order {
            self.inner.order = order;
            self.inner.touch();
        }
        stats
    }
}

/// Owned, ordered copy of the store contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreSnapshot {
    revision: u64,
    items: Vec<ListingItem>,
}

impl StoreSnapshot {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn items(&self) -> &[ListingItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListingItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ListingItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn status_of(&self, id: &str) -> Option<ItemStatus> {
        self.get(id).map(|item| item.status)
    }

    pub fn ids(&self) -> Vec<ListingId> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }
}
