use engine_logging::{engine_debug, engine_error, engine_info};
use feedback_core::{
    Effect, ImageHandle, Msg, StoreError, StoreKind, TaskKind, TaskReport, WorkItemStore,
};
use feedback_engine::{EngineHandle, ReporterSink, StartError};

/// Executes effects against the engine on the foreground thread and turns
/// their results, and any pending engine events, back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) -> Vec<Msg> {
        effects
            .into_iter()
            .filter_map(|effect| match self.run_one(effect) {
                Ok(msg) => msg,
                Err(err) => {
                    engine_error!("store failure while applying effect: {}", err);
                    Some(fatal(&err))
                }
            })
            .collect()
    }

    fn run_one(&self, effect: Effect) -> Result<Option<Msg>, StoreError> {
        let queue = self.engine.queue();
        match effect {
            Effect::SyncQueue { ids } => {
                let stats = queue.sync_ids(&ids)?;
                engine_debug!(
                    "queue synced: {} added, {} removed, {} kept",
                    stats.added,
                    stats.removed,
                    stats.kept
                );
                Ok(Some(store_changed(StoreKind::Queue, queue)?))
            }
            Effect::StartSearch { query } => {
                Ok(rejected(TaskKind::Search, self.engine.start_search(query).err()))
            }
            Effect::StartBulkFeedback { force } => Ok(rejected(
                TaskKind::BulkFeedback,
                self.engine.start_bulk_feedback(force).err(),
            )),
            Effect::Cancel(kind) => {
                if !self.engine.cancel(kind) {
                    engine_debug!("no {} running to stop", kind);
                }
                Ok(None)
            }
            Effect::IgnoreListed => {
                let ignored = queue.ignore_unset()?;
                engine_info!("marked {} items as ignored", ignored);
                Ok(Some(store_changed(StoreKind::Queue, queue)?))
            }
            Effect::ClearCompleted => {
                let removed = queue.remove_settled()?;
                engine_info!("cleared {} completed items", removed.len());
                Ok(Some(Msg::CompletedCleared {
                    snapshot: queue.snapshot()?,
                }))
            }
        }
    }

    /// Drains engine events into messages for the state machine.
    pub fn pump(&self) -> Vec<Msg> {
        let mut sink = MsgSink {
            queue: self.engine.queue(),
            picklist: self.engine.picklist(),
            msgs: Vec::new(),
        };
        self.engine.pump(&mut sink);
        sink.msgs
    }

    /// Asks every running task to stop before the engine is dropped.
    pub fn shutdown(self) {
        for kind in [TaskKind::BulkFeedback, TaskKind::Search] {
            if self.engine.cancel(kind) {
                engine_info!("stopped {} on exit", kind);
            }
        }
    }
}

fn rejected(kind: TaskKind, err: Option<StartError>) -> Option<Msg> {
    err.map(|err| {
        engine_info!("{} not started: {}", kind, err);
        Msg::TaskRejected {
            kind,
            reason: err.to_string(),
        }
    })
}

fn store_changed(kind: StoreKind, store: &WorkItemStore) -> Result<Msg, StoreError> {
    Ok(Msg::StoreChanged {
        store: kind,
        snapshot: store.snapshot()?,
    })
}

fn fatal(err: &StoreError) -> Msg {
    Msg::StatusReported {
        message: format!("Fatal: {err}"),
        percent: None,
    }
}

/// Reporter sink that re-snapshots the changed store on the foreground.
struct MsgSink<'a> {
    queue: &'a WorkItemStore,
    picklist: &'a WorkItemStore,
    msgs: Vec<Msg>,
}

impl ReporterSink for MsgSink<'_> {
    fn on_status(&mut self, message: &str, percent: Option<u8>) {
        self.msgs.push(Msg::StatusReported {
            message: message.to_string(),
            percent,
        });
    }

    fn on_store_changed(&mut self, store: StoreKind) {
        let target = match store {
            StoreKind::Queue => self.queue,
            StoreKind::Picklist => self.picklist,
        };
        let msg = store_changed(store, target).unwrap_or_else(|err| {
            engine_error!("cannot snapshot {:?} store: {}", store, err);
            fatal(&err)
        });
        self.msgs.push(msg);
    }

    fn on_item_image_ready(&mut self, listing_id: &str, _handle: ImageHandle) {
        self.msgs.push(Msg::ImageReady {
            listing_id: listing_id.to_string(),
        });
    }

    fn on_task_finished(&mut self, kind: TaskKind, report: &TaskReport) {
        self.msgs.push(Msg::TaskFinished {
            kind,
            report: report.clone(),
        });
    }
}
