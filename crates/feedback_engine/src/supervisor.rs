//! Lifecycle of at most one running task per [`TaskKind`].
//!
//! Per kind: `Idle -> Running -> {Completed, Cancelled, Superseded, Failed} -> Idle`.
//! Starting a search while one runs supersedes it. Starting bulk feedback
//! while one runs is rejected, so two batches never write the same store.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};

use engine_logging::{engine_error, engine_info, engine_warn};
use feedback_core::{TaskKind, TaskOutcome, TaskReport};
use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::reporter::{ProgressSink, TaskContext, TaskReporter};
use crate::token::{Generation, GenerationCounter, GenerationToken};
use crate::types::{StartError, TaskError, TaskScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPolicy {
    /// A new start invalidates the running task.
    Supersede,
    /// A new start is refused while a task runs.
    RejectWhileRunning,
}

impl StartPolicy {
    pub fn for_kind(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Search => StartPolicy::Supersede,
            TaskKind::BulkFeedback => StartPolicy::RejectWhileRunning,
        }
    }
}

#[derive(Debug)]
struct Running {
    generation: Generation,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct SlotState {
    running: Option<Running>,
    last_outcome: Option<TaskOutcome>,
}

#[derive(Debug, Default)]
struct Slot {
    counter: Arc<GenerationCounter>,
    state: Mutex<SlotState>,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // Slot state is a pair of plain values; a panic cannot leave it torn.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the slot to `Idle` unless a newer generation already owns it.
    fn finish(&self, generation: Generation, outcome: TaskOutcome) {
        let mut state = self.lock();
        let owns_slot = state
            .running
            .as_ref()
            .is_some_and(|running| running.generation == generation);
        if owns_slot {
            state.running = None;
            state.last_outcome = Some(outcome);
        }
    }
}

pub struct Supervisor {
    runtime: Handle,
    sink: Arc<dyn ProgressSink>,
    search: Arc<Slot>,
    bulk: Arc<Slot>,
}

impl Supervisor {
    pub fn new(runtime: Handle, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            runtime,
            sink,
            search: Arc::default(),
            bulk: Arc::default(),
        }
    }

    fn slot(&self, kind: TaskKind) -> &Arc<Slot> {
        match kind {
            TaskKind::Search => &self.search,
            TaskKind::BulkFeedback => &self.bulk,
        }
    }

    /// Mints a new generation for `kind` and launches `work` on the runtime.
    ///
    /// The check-mint-record sequence runs under the slot lock, so no two
    /// tasks of one kind ever hold a current token at the same time.
    pub fn start<F, Fut>(&self, kind: TaskKind, work: F) -> Result<GenerationToken, StartError>
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = Result<TaskReport, TaskError>> + Send + 'static,
    {
        let slot = self.slot(kind).clone();
        let token = {
            let mut state = slot.lock();
            if let Some(previous) = &state.running {
                match StartPolicy::for_kind(kind) {
                    StartPolicy::RejectWhileRunning => {
                        engine_info!(
                            "{} start rejected: generation {} still running",
                            kind,
                            previous.generation
                        );
                        return Err(StartError::AlreadyRunning(kind));
                    }
                    StartPolicy::Supersede => {
                        engine_info!("{} generation {} superseded", kind, previous.generation);
                    }
                }
            }
            let generation = slot.counter.mint();
            let cancel = CancellationToken::new();
            state.running = Some(Running {
                generation,
                cancel: cancel.clone(),
            });
            GenerationToken::new(kind, generation, slot.counter.clone(), cancel)
        };

        engine_info!("{} generation {} started", kind, token.generation());
        let reporter = TaskReporter::new(token.clone(), self.sink.clone());
        let context = TaskContext {
            token: token.clone(),
            reporter: reporter.clone(),
        };
        let future = work(context);
        let task_token = token.clone();

        self.runtime.spawn(async move {
            let generation = task_token.generation();
            let report = match AssertUnwindSafe(future).catch_unwind().await {
                Ok(Ok(report)) => report,
                Ok(Err(err)) => {
                    engine_error!("{} generation {} failed: {}", kind, generation, err);
                    TaskReport::fatal(format!("Error: {err}"))
                }
                Err(_) => {
                    engine_error!("{} generation {} panicked", kind, generation);
                    TaskReport::fatal(format!("Error: {kind} task panicked"))
                }
            };

            // A task that finished normally just as it was replaced is still superseded.
            let outcome = if task_token.is_superseded() {
                TaskOutcome::Superseded
            } else {
                report.outcome
            };
            // The slot is idle by the time the report is visible.
            slot.finish(generation, outcome);
            match outcome {
                TaskOutcome::Superseded => {
                    engine_info!("{} generation {} exited after supersession", kind, generation);
                }
                TaskOutcome::Cancelled => {
                    engine_warn!("{} generation {} stopped at {}%", kind, generation, report.percent);
                    reporter.finished(report);
                }
                TaskOutcome::Completed | TaskOutcome::Failed => {
                    reporter.finished(report);
                }
            }
        });

        Ok(token)
    }

    /// Requests cooperative cancellation. Returns `false` when nothing runs.
    pub fn cancel(&self, kind: TaskKind) -> bool {
        let state = self.slot(kind).lock();
        match &state.running {
            Some(running) => {
                engine_info!("{} generation {} cancellation requested", kind, running.generation);
                running.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn phase(&self, kind: TaskKind) -> TaskPhase {
        if self.slot(kind).lock().running.is_some() {
            TaskPhase::Running
        } else {
            TaskPhase::Idle
        }
    }

    pub fn last_outcome(&self, kind: TaskKind) -> Option<TaskOutcome> {
        self.slot(kind).lock().last_outcome
    }

    pub fn latest_generation(&self, kind: TaskKind) -> Generation {
        self.slot(kind).counter.latest()
    }

    /// An event is stale when a newer task of its kind has been started since.
    pub fn is_stale(&self, scope: TaskScope) -> bool {
        scope.generation != self.latest_generation(scope.kind)
    }
}
