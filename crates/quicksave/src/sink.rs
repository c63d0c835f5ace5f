//! Status reporting for a running job.
//!
//! The pipeline never logs through globals alone: every status line also goes
//! to the [`LogSink`] handed to [`Pipeline::new`](crate::Pipeline::new), so a
//! console or window caller can show progress without scraping log output.

use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::pipeline::JobStage;

/// Severity of a status record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARNING",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Self::Error,
            tracing::Level::WARN => Self::Warn,
            tracing::Level::INFO => Self::Info,
            _ => Self::Debug,
        }
    }
}

/// Receiver for job status records.
pub trait LogSink: Send + Sync {
    /// Record one status message.
    fn record(&self, level: LogLevel, message: &str);

    /// Called when the job enters a new stage.
    fn stage_changed(&self, stage: JobStage) {
        self.record(LogLevel::Debug, &format!("Entering stage: {stage}"));
    }
}

/// Forwards records to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => debug!("{}", message),
            LogLevel::Info => info!("{}", message),
            LogLevel::Warn => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
        }
    }
}

/// Keeps records in memory. Used by tests and by callers that display a
/// job's log after it finished.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(LogLevel, String)>>,
    stages: Mutex<Vec<JobStage>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.lock().clone()
    }

    pub fn stages(&self) -> Vec<JobStage> {
        self.stages.lock().clone()
    }

    /// Whether any record at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn record(&self, level: LogLevel, message: &str) {
        self.records.lock().push((level, message.to_string()));
    }

    fn stage_changed(&self, stage: JobStage) {
        self.stages.lock().push(stage);
    }
}
