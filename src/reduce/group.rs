//! Turns a key-sorted record stream into key groups by batching consecutive
//! records that share a key.

use itertools::Itertools;

use crate::error::ReduceResult;
use crate::KeyValue;

/// All values recorded under one key, in the order they were visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGroup {
    pub key: String,
    pub values: Vec<String>,
}

/// Calls `f` once for every group of a sorted `ReduceResult<KeyValue>` stream
/// and returns the number of records grouped.
///
/// The input must yield records with equal keys adjacent. Every group,
/// including the last one, is handed to `f` exactly once; an empty input
/// calls it zero times. A group is only handed over once the next key has
/// been seen or the stream ended cleanly, so an upstream error drops the
/// group it interrupted and is returned instead.
pub fn for_each_group<I, F>(records: I, mut f: F) -> ReduceResult<usize>
where
    I: IntoIterator<Item = ReduceResult<KeyValue>>,
    F: FnMut(KeyGroup) -> ReduceResult<()>,
{
    let mut seen = 0;
    let last = itertools::process_results(records, |kvs| -> ReduceResult<Option<KeyGroup>> {
        let mut pending = None;
        for (key, chunk) in &kvs.chunk_by(|kv| kv.key.clone()) {
            let values: Vec<String> = chunk.map(KeyValue::into_value).collect();
            seen += values.len();
            if let Some(done) = pending.replace(KeyGroup { key, values }) {
                f(done)?;
            }
        }
        Ok(pending)
    })??;

    if let Some(group) = last {
        f(group)?;
    }
    Ok(seen)
}
