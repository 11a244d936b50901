//! Error types shared by the task list, scheduler, journal and news client.

use std::path::PathBuf;

use crate::models::TaskId;

/// Every failure the application can report.
///
/// Most operations catch these at their boundary, log them and carry on;
/// only the CLI surfaces them to the user.
#[derive(Debug, thiserror::Error)]
pub enum AdmError {
    /// Reading or writing one of the data files failed.
    #[error("persistence error on {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be turned into (or from) JSON.
    #[error("malformed record in {path}: {source}")]
    Record {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The binary task snapshot could not be encoded or decoded.
    #[error("snapshot error on {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: postcard::Error,
    },

    /// A due date/time pair that cannot be resolved to a timestamp.
    #[error("malformed due date '{date}' / time '{time}'")]
    MalformedDueDate { date: String, time: String },

    /// The notification sink refused or failed to show a message.
    #[error("notification dispatch failed: {0}")]
    NotificationDispatch(String),

    /// Fetching headlines or images failed.
    #[error("news error: {0}")]
    News(String),

    /// Task names must not be empty.
    #[error("task name must not be empty")]
    EmptyName,

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("config error: {0}")]
    Config(String),
}

impl AdmError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence { path: path.into(), source }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AdmError>;
