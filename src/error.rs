//! Error types for a reduce task.
//!
//! Every variant is fatal for the task. Retrying is left to whoever
//! scheduled the task, which re-runs it from scratch.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for reduce operations
pub type ReduceResult<T> = Result<T, ReduceError>;

#[derive(Error, Debug)]
pub enum ReduceError {
    /// An intermediate location does not exist and the task does not tolerate it
    #[error("intermediate input {} for map task {map_task} is missing", .path.display())]
    MissingInput { path: PathBuf, map_task: usize },

    /// A location could not be opened
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading an intermediate location failed below the decoder
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record in an intermediate location is malformed or truncated
    #[error("malformed record #{record} in {} (map task {map_task}): {source}", .path.display())]
    Decode {
        path: PathBuf,
        map_task: usize,
        record: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A source expected to be sorted yielded a key smaller than its predecessor
    #[error("source {} is not sorted: key {key:?} follows {previous:?}", .path.display())]
    UnsortedSource {
        path: PathBuf,
        previous: String,
        key: String,
    },

    /// The user reduction failed for a key
    #[error("reduce function failed for key {key:?}: {source}")]
    Reduce {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// A record could not be encoded into the output
    #[error("failed to encode record for key {key:?} into {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Writing or flushing the output failed
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The finished output could not be moved into place
    #[error("failed to commit {} to {}: {source}", .from.display(), .to.display())]
    Commit {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ReduceError {
    /// Whether this error came from malformed intermediate data rather than I/O.
    pub fn is_decode(&self) -> bool {
        matches!(self, ReduceError::Decode { .. })
    }
}
