//! Feedback engine: background task supervision, reporter channel and remote collaborators.
mod bulk;
mod collaborators;
mod config;
mod engine;
mod fetch;
mod refresh;
mod remote;
mod reporter;
mod supervisor;
mod token;
mod types;

pub use collaborators::{Collaborators, FeedbackSubmitter, ImageSource, ListingSource, SearchState};
pub use config::EngineConfig;
pub use engine::{EngineHandle, ReporterSink};
pub use fetch::{FetchSettings, ReqwestImageSource, ID_PLACEHOLDER};
pub use remote::{HttpFeedbackSubmitter, HttpListingSource};
pub use reporter::{ChannelProgressSink, ProgressSink, TaskContext, TaskReporter};
pub use supervisor::{StartPolicy, Supervisor, TaskPhase};
pub use token::{Generation, GenerationToken, TokenState};
pub use types::{
    EngineError, EngineEvent, RemoteError, RemoteErrorKind, StartError, TaskError, TaskScope,
};
