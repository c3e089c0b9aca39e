use std::fmt;
use std::io;

use feedback_core::{ImageHandle, ListingId, StoreError, StoreKind, TaskKind, TaskReport};
use thiserror::Error;

use crate::token::Generation;

/// Which task invocation produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskScope {
    pub kind: TaskKind,
    pub generation: Generation,
}

/// Background-to-foreground notification. Produced on worker threads,
/// delivered on the foreground by [`crate::EngineHandle::pump`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Status {
        scope: TaskScope,
        message: String,
        percent: Option<u8>,
    },
    StoreChanged {
        scope: TaskScope,
        store: StoreKind,
    },
    ImageReady {
        scope: TaskScope,
        listing_id: ListingId,
        handle: ImageHandle,
    },
    TaskFinished {
        scope: TaskScope,
        report: TaskReport,
    },
}

impl EngineEvent {
    pub fn scope(&self) -> TaskScope {
        match self {
            EngineEvent::Status { scope, .. }
            | EngineEvent::StoreChanged { scope, .. }
            | EngineEvent::ImageReady { scope, .. }
            | EngineEvent::TaskFinished { scope, .. } => *scope,
        }
    }
}

/// Failure of a single remote call. Always transient from the task's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteErrorKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode,
    /// The remote side refused the request for a business reason.
    Rejected,
    Network,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteErrorKind::InvalidUrl => write!(f, "invalid url"),
            RemoteErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            RemoteErrorKind::Timeout => write!(f, "timeout"),
            RemoteErrorKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            RemoteErrorKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            RemoteErrorKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            RemoteErrorKind::Decode => write!(f, "malformed response"),
            RemoteErrorKind::Rejected => write!(f, "rejected"),
            RemoteErrorKind::Network => write!(f, "network error"),
        }
    }
}

/// Error that terminates a task body. Reported to the foreground as a fatal status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Fatal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("{0} is already running")]
    AlreadyRunning(TaskKind),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("failed to set up remote client: {0}")]
    Remote(#[from] RemoteError),
}
