//! Ordering the records of a partition by key.
//!
//! [`sort_by_key`] orders records that were loaded into memory. [`KWayMerge`]
//! instead streams over sources that are each already sorted, holding only
//! the head record of every source. Both order equal keys by source index,
//! then by position within the source, so they produce the same sequence.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io::Read;

use crate::codec::RecordReader;
use crate::error::{ReduceError, ReduceResult};
use crate::KeyValue;

/// Stable, byte-wise ascending sort by key.
///
/// Records must be laid out source by source in arrival order; equal keys
/// keep that order.
pub fn sort_by_key(records: &mut [KeyValue]) {
    records.sort_by(|a, b| a.key.cmp(&b.key));
}

/// Head record of one source. Ordered by key, then source index.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Head {
    key: String,
    source: usize,
    value: String,
}

/// Merges key-sorted sources into one key-sorted stream.
///
/// A source that yields a key smaller than its previous one fails the merge
/// with [`ReduceError::UnsortedSource`].
pub struct KWayMerge<R: Read> {
    sources: Vec<RecordReader<R>>,
    heap: BinaryHeap<Reverse<Head>>,
    failed: bool,
}

impl<R: Read> KWayMerge<R> {
    /// Pulls the first record of every source.
    pub fn new(mut sources: Vec<RecordReader<R>>) -> ReduceResult<Self> {
        let mut heap = BinaryHeap::with_capacity(sources.len());
        for (source, reader) in sources.iter_mut().enumerate() {
            if let Some(kv) = reader.next() {
                let KeyValue { key, value } = kv?;
                heap.push(Reverse(Head { key, source, value }));
            }
        }
        Ok(Self {
            sources,
            heap,
            failed: false,
        })
    }

    fn advance(&mut self, source: usize, previous: &str) -> ReduceResult<()> {
        let reader = &mut self.sources[source];
        if let Some(kv) = reader.next() {
            let KeyValue { key, value } = kv?;
            if key.as_str() < previous {
                return Err(ReduceError::UnsortedSource {
                    path: reader.path().to_path_buf(),
                    previous: previous.to_string(),
                    key,
                });
            }
            self.heap.push(Reverse(Head { key, source, value }));
        }
        Ok(())
    }
}

impl<R: Read> Iterator for KWayMerge<R> {
    type Item = ReduceResult<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let Reverse(head) = self.heap.pop()?;
        if let Err(err) = self.advance(head.source, &head.key) {
            self.failed = true;
            return Some(Err(err));
        }
        Some(Ok(KeyValue {
            key: head.key,
            value: head.value,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RecordWriter;

    fn encode(pairs: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = RecordWriter::new(Vec::new(), "mem");
        for (k, v) in pairs {
            writer.write(&KeyValue::new(*k, *v)).unwrap();
        }
        writer.finish().unwrap()
    }

    fn merge(sources: &[Vec<u8>]) -> Vec<ReduceResult<KeyValue>> {
        let readers = sources
            .iter()
            .enumerate()
            .map(|(i, buf)| RecordReader::new(buf.as_slice(), format!("src-{}", i), i))
            .collect();
        KWayMerge::new(readers).unwrap().collect()
    }

    #[test]
    fn test_sort_is_stable() {
        let mut records = vec![
            KeyValue::new("b", "1"),
            KeyValue::new("a", "2"),
            KeyValue::new("b", "3"),
            KeyValue::new("a", "4"),
        ];
        sort_by_key(&mut records);
        assert_eq!(
            records,
            vec![
                KeyValue::new("a", "2"),
                KeyValue::new("a", "4"),
                KeyValue::new("b", "1"),
                KeyValue::new("b", "3"),
            ]
        );
    }

    #[test]
    fn test_sort_is_bytewise() {
        let mut records = vec![
            KeyValue::new("b", ""),
            KeyValue::new("B", ""),
            KeyValue::new("é", ""),
            KeyValue::new("a", ""),
        ];
        sort_by_key(&mut records);
        let keys: Vec<&str> = records.iter().map(KeyValue::key).collect();
        assert_eq!(keys, vec!["B", "a", "b", "é"]);
    }

    #[test]
    fn test_merge_matches_stable_sort() {
        let a = [("a", "a0"), ("c", "a1"), ("c", "a2"), ("e", "a3")];
        let b = [("b", "b0"), ("c", "b1"), ("f", "b2")];
        let c = [("a", "c0"), ("c", "c1")];

        let merged: Vec<KeyValue> = merge(&[encode(&a), encode(&b), encode(&c)])
            .into_iter()
            .collect::<ReduceResult<_>>()
            .unwrap();

        let mut sorted: Vec<KeyValue> = a
            .iter()
            .chain(b.iter())
            .chain(c.iter())
            .map(|(k, v)| KeyValue::new(*k, *v))
            .collect();
        sort_by_key(&mut sorted);

        assert_eq!(merged, sorted);
    }

    #[test]
    fn test_merge_of_empty_sources() {
        assert!(merge(&[Vec::new(), Vec::new()]).is_empty());
        assert!(merge(&[]).is_empty());
    }

    #[test]
    fn test_merge_rejects_unsorted_source() {
        let results = merge(&[encode(&[("a", "1"), ("c", "1"), ("b", "1")]), encode(&[("z", "1")])]);
        let err = results
            .into_iter()
            .find_map(Result::err)
            .expect("unsorted source should fail");
        match err {
            ReduceError::UnsortedSource { previous, key, .. } => {
                assert_eq!(previous, "c");
                assert_eq!(key, "b");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_merge_surfaces_decode_error() {
        let mut bad = encode(&[("a", "1")]);
        bad.extend_from_slice(b"{\"Key\":");
        let results = merge(&[bad, encode(&[("b", "1")])]);
        assert!(results.iter().any(|r| matches!(r, Err(e) if e.is_decode())));
    }
}
