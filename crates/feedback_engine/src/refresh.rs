//! Picklist refresh: fetch a listing snapshot, filter it, then stream items
//! and their thumbnails into the picklist store one by one.

use std::sync::Arc;

use engine_logging::{engine_debug, engine_warn};
use feedback_core::{
    filter_listings, percent_of, ListingItem, StoreKind, TaskOutcome, TaskReport, WorkItemStore,
};

use crate::collaborators::{ImageSource, ListingSource, SearchState};
use crate::reporter::TaskContext;
use crate::token::TokenState;
use crate::types::TaskError;

pub(crate) const STATUS_LOADING: &str = "Loading...";
pub(crate) const STATUS_READY: &str = "Ready";
pub(crate) const STATUS_STOPPED: &str = "Stopped";

pub(crate) struct RefreshJob {
    pub query: String,
    pub listings: Arc<dyn ListingSource>,
    pub images: Arc<dyn ImageSource>,
    pub store: WorkItemStore,
}

fn superseded(processed: usize, total: usize) -> TaskReport {
    TaskReport::new(TaskOutcome::Superseded, "", processed, total)
}

fn stopped(processed: usize, total: usize) -> TaskReport {
    TaskReport::new(TaskOutcome::Cancelled, STATUS_STOPPED, processed, total)
}

pub(crate) async fn run_refresh(job: RefreshJob, ctx: TaskContext) -> Result<TaskReport, TaskError> {
    let TaskContext { token, reporter } = ctx;

    match token.state() {
        TokenState::Superseded => return Ok(superseded(0, 0)),
        TokenState::Cancelled => return Ok(stopped(0, 0)),
        TokenState::Current => {}
    }
    reporter.status(STATUS_LOADING, Some(0));

    let search = SearchState {
        query: job.query.clone(),
    };
    let snapshot = match job.listings.fetch_browsable_listings(&search).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            engine_warn!("listing fetch for {:?} failed: {}", job.query, err);
            return Ok(TaskReport::new(
                TaskOutcome::Failed,
                format!("Could not load listings: {err}"),
                0,
                0,
            ));
        }
    };

    let matches = filter_listings(&job.query, &snapshot);
    let total = matches.len();
    engine_debug!(
        "search {:?}: {} of {} listings match",
        job.query,
        total,
        snapshot.len()
    );

    // Publish the new result set only if this pass is still the latest.
    let published = job.store.transact(|txn| {
        if token.is_superseded() {
            return false;
        }
        txn.clear();
        true
    })?;
    if !published {
        return Ok(superseded(0, total));
    }
    reporter.store_changed(StoreKind::Picklist);

    for (index, listing) in matches.iter().enumerate() {
        match token.state() {
            TokenState::Superseded => return Ok(superseded(index, total)),
            TokenState::Cancelled => return Ok(stopped(index, total)),
            TokenState::Current => {}
        }

        let thumbnail = match job.images.fetch_thumbnail(&listing.id).await {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                engine_warn!("thumbnail for {} failed: {}", listing.id, err);
                None
            }
        };

        // A stop during the thumbnail call keeps the item; supersession drops it.
        let item = ListingItem::from_metadata(listing);
        let stored = job.store.transact(|txn| {
            if token.is_superseded() {
                return None;
            }
            txn.upsert(item);
            Some(thumbnail.and_then(|bytes| txn.attach_thumbnail(&listing.id, bytes.to_vec())))
        })?;
        let Some(handle) = stored else {
            return Ok(superseded(index, total));
        };

        reporter.store_changed(StoreKind::Picklist);
        if let Some(handle) = handle {
            reporter.image_ready(&listing.id, handle);
        }
        reporter.status(STATUS_LOADING, Some(percent_of(index + 1, total)));
    }

    Ok(TaskReport::new(TaskOutcome::Completed, STATUS_READY, total, total))
}
