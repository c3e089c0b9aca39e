//! Bulk feedback: one remote submission per eligible queue item.

use std::sync::Arc;

use engine_logging::{engine_debug, engine_warn};
use feedback_core::{
    percent_of, ApplyOutcome, FeedbackUpdate, ItemFailure, ItemStatus, ListingId, StoreKind,
    TaskOutcome, TaskReport, WorkItemStore,
};

use crate::collaborators::FeedbackSubmitter;
use crate::reporter::TaskContext;
use crate::token::TokenState;
use crate::types::TaskError;

pub(crate) struct BulkFeedbackJob {
    /// Also target items that already carry a status, resetting them first.
    pub force: bool,
    pub submitter: Arc<dyn FeedbackSubmitter>,
    pub store: WorkItemStore,
}

enum Eligibility {
    Submit,
    Skip,
    Removed,
}

pub(crate) async fn run_bulk_feedback(
    job: BulkFeedbackJob,
    ctx: TaskContext,
) -> Result<TaskReport, TaskError> {
    let TaskContext { token, reporter } = ctx;
    let force = job.force;

    // The target set is fixed here; items added later are not picked up.
    let targets: Vec<ListingId> = job.store.transact(|txn| {
        txn.ids()
            .into_iter()
            .filter(|id| force || txn.status_of(id) == Some(ItemStatus::Empty))
            .collect()
    })?;
    let total = targets.len();
    engine_debug!("bulk feedback: {} target(s), force={}", total, force);

    let update = FeedbackUpdate::done();
    let mut processed = 0;
    let mut done = 0;
    let mut failures: Vec<ItemFailure> = Vec::new();

    for id in &targets {
        match token.state() {
            TokenState::Superseded => {
                return Ok(TaskReport::new(TaskOutcome::Superseded, "", processed, total));
            }
            TokenState::Cancelled => {
                return Ok(TaskReport::new(TaskOutcome::Cancelled, "Stopped", processed, total)
                    .with_failures(failures));
            }
            TokenState::Current => {}
        }

        let eligibility = job.store.transact(|txn| match txn.status_of(id) {
            None => Eligibility::Removed,
            Some(ItemStatus::Empty) => Eligibility::Submit,
            Some(_) if force => {
                txn.reset(id);
                Eligibility::Submit
            }
            // Resolved by the user (e.g. Ignore) since the batch started.
            Some(_) => Eligibility::Skip,
        })?;

        match eligibility {
            Eligibility::Removed => engine_debug!("bulk feedback: {} removed, skipping", id),
            Eligibility::Skip => engine_debug!("bulk feedback: {} already resolved, skipping", id),
            Eligibility::Submit => {
                let result = job.submitter.submit_feedback(id, update).await;
                // Write-back lands even if a stop arrived during the call. An id
                // removed meanwhile stays removed.
                let outcome = match result {
                    Ok(()) => {
                        done += 1;
                        job.store.apply_update(id, update)?
                    }
                    Err(err) => {
                        engine_warn!("feedback for {} failed: {}", id, err);
                        let reason = err.to_string();
                        failures.push(ItemFailure {
                            id: id.clone(),
                            reason: reason.clone(),
                        });
                        job.store.transact(|txn| txn.record_failure(id, reason))?
                    }
                };
                if outcome == ApplyOutcome::UnknownId {
                    engine_debug!("bulk feedback: {} removed while submitting", id);
                }
                reporter.store_changed(StoreKind::Queue);
            }
        }

        processed += 1;
        reporter.status(
            format!("Leaving feedback {processed}/{total}"),
            Some(percent_of(processed, total)),
        );
    }

    let message = if failures.is_empty() {
        format!("Completed: {done} done")
    } else {
        format!("Completed: {done} done, {} failed", failures.len())
    };
    Ok(TaskReport::new(TaskOutcome::Completed, message, processed, total).with_failures(failures))
}
