//! The reduce side of a MapReduce (lite) job.
//!
//! A reduce task collects the intermediate files written by every map task
//! for one reduce partition, orders the records by key, calls the user
//! reduction once per distinct key, and writes a single sorted output file
//! for the final merger to consume.

use serde::{Deserialize, Serialize};

pub mod cmd;
pub mod codec;
pub mod error;
pub mod naming;
pub mod reduce;
pub mod utils;
pub mod workload;

pub use error::ReduceError;
pub use naming::{DirLocator, Locator};
pub use reduce::{do_reduce, MissingInput, Phase, ReduceConfig, ReduceSummary, ReduceTask, Strategy};

/////////////////////////////////////////////////////////////////////////////
// MapReduce application types
/////////////////////////////////////////////////////////////////////////////

/// A reduce function takes in a key and every value recorded under that
/// key across all map outputs of the partition. It returns an
/// [`anyhow::Result`] containing the single output value.
///
/// Values arrive ordered by (map task, position in that map task's output).
/// Reductions should still treat them as a multiset where possible.
pub type ReduceFn = fn(key: &str, values: &[String]) -> anyhow::Result<String>;

/// A named reduce application.
#[derive(Copy, Clone)]
pub struct Workload {
    pub reduce_fn: ReduceFn,
}

/////////////////////////////////////////////////////////////////////////////
// Key-value pairs
/////////////////////////////////////////////////////////////////////////////

/// A single key-value pair.
///
/// On disk this is the JSON object `{"Key": ..., "Value": ...}`, shared by
/// the map phase, the reduce phase and the final merger.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct KeyValue {
    /// The key.
    #[serde(rename = "Key")]
    pub key: String,
    /// The value.
    #[serde(rename = "Value")]
    pub value: String,
}

impl KeyValue {
    /// Construct a new key-value pair from the given key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Get the key of this key-value pair.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the value of this key-value pair.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consumes the key-value pair and returns the key.
    #[inline]
    pub fn into_key(self) -> String {
        self.key
    }

    /// Consumes the key-value pair and returns the value.
    #[inline]
    pub fn into_value(self) -> String {
        self.value
    }
}
