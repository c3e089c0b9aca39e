use std::sync::{mpsc, Arc};

use engine_logging::engine_trace;
use feedback_core::{
    ImageHandle, SortOrder, StoreKind, TaskKind, TaskReport, WorkItemStore,
};

use crate::bulk::{run_bulk_feedback, BulkFeedbackJob};
use crate::collaborators::Collaborators;
use crate::config::EngineConfig;
use crate::fetch::ReqwestImageSource;
use crate::refresh::{run_refresh, RefreshJob};
use crate::remote::{HttpFeedbackSubmitter, HttpListingSource};
use crate::reporter::ChannelProgressSink;
use crate::supervisor::{Supervisor, TaskPhase};
use crate::token::GenerationToken;
use crate::types::{EngineError, EngineEvent, StartError};

/// Foreground-side receiver of reporter events.
///
/// Called only from [`EngineHandle::pump`], i.e. on the thread that owns the
/// engine handle. Implementations may therefore hold non-`Send` UI state.
pub trait ReporterSink {
    fn on_status(&mut self, message: &str, percent: Option<u8>);
    fn on_store_changed(&mut self, store: StoreKind);
    fn on_item_image_ready(&mut self, listing_id: &str, handle: ImageHandle);
    fn on_task_finished(&mut self, _kind: TaskKind, _report: &TaskReport) {}
}

/// Owns the background runtime, the two stores and the task supervisor.
///
/// The handle itself belongs to the foreground thread; only the stores are
/// shared with background tasks.
pub struct EngineHandle {
    // Dropped first: stops worker threads and any task still in flight.
    runtime: tokio::runtime::Runtime,
    supervisor: Supervisor,
    collaborators: Collaborators,
    queue: WorkItemStore,
    picklist: WorkItemStore,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    /// Engine wired to the HTTP collaborators described by `config`.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let collaborators = Collaborators {
            listings: Arc::new(HttpListingSource::new(&config.listing_endpoint, &config.fetch)?),
            images: Arc::new(ReqwestImageSource::new(
                config.thumbnail_url_template.clone(),
                config.fetch.clone(),
            )?),
            feedback: Arc::new(HttpFeedbackSubmitter::new(
                &config.feedback_endpoint,
                &config.fetch,
            )?),
        };
        Self::with_collaborators(collaborators, config.picklist_sort, config.worker_threads)
    }

    pub fn with_collaborators(
        collaborators: Collaborators,
        picklist_sort: SortOrder,
        worker_threads: usize,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("feedback-engine")
            .enable_all()
            .build()?;
        let (event_tx, event_rx) = mpsc::channel();
        let sink = Arc::new(ChannelProgressSink::new(event_tx));
        let supervisor = Supervisor::new(runtime.handle().clone(), sink);

        Ok(Self {
            runtime,
            supervisor,
            collaborators,
            queue: WorkItemStore::new(),
            picklist: WorkItemStore::with_sort(picklist_sort),
            event_rx,
        })
    }

    pub fn queue(&self) -> &WorkItemStore {
        &self.queue
    }

    pub fn picklist(&self) -> &WorkItemStore {
        &self.picklist
    }

    pub fn store(&self, kind: StoreKind) -> &WorkItemStore {
        match kind {
            StoreKind::Queue => &self.queue,
            StoreKind::Picklist => &self.picklist,
        }
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn runtime(&self) -> &tokio::runtime::Handle {
        self.runtime.handle()
    }

    /// Starts a picklist refresh for `query`, superseding any running search.
    pub fn start_search(&self, query: impl Into<String>) -> Result<GenerationToken, StartError> {
        let job = RefreshJob {
            query: query.into(),
            listings: self.collaborators.listings.clone(),
            images: self.collaborators.images.clone(),
            store: self.picklist.clone(),
        };
        self.supervisor
            .start(TaskKind::Search, move |ctx| run_refresh(job, ctx))
    }

    /// Starts a bulk feedback pass over the queue; refused while one runs.
    pub fn start_bulk_feedback(&self, force: bool) -> Result<GenerationToken, StartError> {
        let job = BulkFeedbackJob {
            force,
            submitter: self.collaborators.feedback.clone(),
            store: self.queue.clone(),
        };
        self.supervisor
            .start(TaskKind::BulkFeedback, move |ctx| run_bulk_feedback(job, ctx))
    }

    pub fn cancel(&self, kind: TaskKind) -> bool {
        self.supervisor.cancel(kind)
    }

    pub fn phase(&self, kind: TaskKind) -> TaskPhase {
        self.supervisor.phase(kind)
    }

    /// Next pending event, or `None` when the channel is empty. Events from
    /// superseded task generations are skipped.
    pub fn try_recv(&self) -> Option<EngineEvent> {
        while let Ok(event) = self.event_rx.try_recv() {
            if self.supervisor.is_stale(event.scope()) {
                engine_trace!("dropping stale event {:?}", event.scope());
                continue;
            }
            return Some(event);
        }
        None
    }

    /// Drains pending events into `sink` on the calling thread.
    pub fn pump(&self, sink: &mut dyn ReporterSink) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.try_recv() {
            deliver(event, sink);
            delivered += 1;
        }
        delivered
    }
}

fn deliver(event: EngineEvent, sink: &mut dyn ReporterSink) {
    match event {
        EngineEvent::Status {
            message, percent, ..
        } => sink.on_status(&message, percent),
        EngineEvent::StoreChanged { store, .. } => sink.on_store_changed(store),
        EngineEvent::ImageReady {
            listing_id, handle, ..
        } => sink.on_item_image_ready(&listing_id, handle),
        EngineEvent::TaskFinished { scope, report } => {
            // The final report doubles as the final status line.
            sink.on_status(&report.message, Some(report.percent));
            sink.on_task_finished(scope.kind, &report);
        }
    }
}
