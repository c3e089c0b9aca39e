//! Background side of the reporter channel.
//!
//! Tasks never touch foreground state. They emit [`EngineEvent`]s through a
//! [`ProgressSink`]; the foreground drains them on its own thread.

use std::sync::mpsc;
use std::sync::Arc;

use feedback_core::{ImageHandle, StoreKind, TaskReport};

use crate::token::GenerationToken;
use crate::types::{EngineEvent, TaskScope};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        // The foreground has gone away; nothing left to tell.
        let _ = self.tx.send(event);
    }
}

/// Per-task emitter. Drops everything once its token is superseded, so a
/// stale task can never publish after its replacement started.
#[derive(Clone)]
pub struct TaskReporter {
    token: GenerationToken,
    sink: Arc<dyn ProgressSink>,
}

impl TaskReporter {
    pub(crate) fn new(token: GenerationToken, sink: Arc<dyn ProgressSink>) -> Self {
        Self { token, sink }
    }

    pub fn scope(&self) -> TaskScope {
        TaskScope {
            kind: self.token.kind(),
            generation: self.token.generation(),
        }
    }

    fn emit(&self, event: EngineEvent) -> bool {
        if self.token.is_superseded() {
            return false;
        }
        self.sink.emit(event);
        true
    }

    pub fn status(&self, message: impl Into<String>, percent: Option<u8>) -> bool {
        self.emit(EngineEvent::Status {
            scope: self.scope(),
            message: message.into(),
            percent,
        })
    }

    pub fn store_changed(&self, store: StoreKind) -> bool {
        self.emit(EngineEvent::StoreChanged {
            scope: self.scope(),
            store,
        })
    }

    pub fn image_ready(&self, listing_id: &str, handle: ImageHandle) -> bool {
        self.emit(EngineEvent::ImageReady {
            scope: self.scope(),
            listing_id: listing_id.to_string(),
            handle,
        })
    }

    pub(crate) fn finished(&self, report: TaskReport) -> bool {
        self.emit(EngineEvent::TaskFinished {
            scope: self.scope(),
            report,
        })
    }
}

/// Token and reporter handed to a task body.
#[derive(Clone)]
pub struct TaskContext {
    pub token: GenerationToken,
    pub reporter: TaskReporter,
}
