//! Application settings persisted as RON next to the working directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::LogDestination;
use feedback_core::SortOrder;
use feedback_engine::{EngineConfig, FetchSettings};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const CONFIG_FILENAME: &str = ".feedback_config.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub target: LogTarget,
    pub level: LogLevel,
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        // Commands and rendering own the terminal.
        Self {
            target: LogTarget::File,
            level: LogLevel::Info,
            file: PathBuf::from("feedback.log"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub listing_endpoint: String,
    pub feedback_endpoint: String,
    pub thumbnail_url_template: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_thumbnail_bytes: u64,
    /// Picklist ordering: newest listing first, or as returned by the source.
    pub newest_first: bool,
    pub worker_threads: usize,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            listing_endpoint: engine.listing_endpoint,
            feedback_endpoint: engine.feedback_endpoint,
            thumbnail_url_template: engine.thumbnail_url_template,
            connect_timeout_ms: duration_ms(engine.fetch.connect_timeout),
            request_timeout_ms: duration_ms(engine.fetch.request_timeout),
            redirect_limit: engine.fetch.redirect_limit,
            max_thumbnail_bytes: engine.fetch.max_bytes,
            newest_first: engine.picklist_sort == SortOrder::TimestampDesc,
            worker_threads: engine.worker_threads,
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            listing_endpoint: self.listing_endpoint.clone(),
            feedback_endpoint: self.feedback_endpoint.clone(),
            thumbnail_url_template: self.thumbnail_url_template.clone(),
            fetch: FetchSettings {
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                request_timeout: Duration::from_millis(self.request_timeout_ms),
                redirect_limit: self.redirect_limit,
                max_bytes: self.max_thumbnail_bytes,
                ..FetchSettings::default()
            },
            picklist_sort: if self.newest_first {
                SortOrder::TimestampDesc
            } else {
                SortOrder::Insertion
            },
            worker_threads: self.worker_threads,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

pub fn default_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(CONFIG_FILENAME)
}

/// Reads the config at `path`. A missing file yields the defaults.
pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(err) => return Err(err.into()),
    };
    Ok(ron::from_str(&content)?)
}

/// Writes the config through a temp file in the same directory, then renames it
/// over `path`, so a crash never leaves a half-written file behind.
pub fn save(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let content = ron::ser::to_string_pretty(config, ron::ser::PrettyConfig::new())?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|err| ConfigError::Io(err.error))?;
    Ok(())
}
