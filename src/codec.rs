//! The on-disk record format.
//!
//! A location holds a stream of JSON-encoded [`KeyValue`] objects, one per
//! line. The stream is self-delimiting, so a reader pulls records one at a
//! time and can tell a clean end of stream apart from a record that is
//! malformed or cut short.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde_json::de::IoRead;
use serde_json::StreamDeserializer;

use crate::error::{ReduceError, ReduceResult};
use crate::KeyValue;

/// A lazy, finite sequence of records decoded from one location.
///
/// Yields `None` once the stream is cleanly exhausted. A malformed or
/// truncated record yields a single [`ReduceError::Decode`], after which
/// the reader is fused.
///
/// Decoding is strict: both `Key` and `Value` must be present and must be
/// strings. A record such as `{"Key":"a","Value":null}` or one without a
/// `Value` is a decode error rather than a record with an empty value, and
/// an empty string has to be written out as `""`. Unknown fields are ignored.
pub struct RecordReader<R: Read> {
    records: StreamDeserializer<'static, IoRead<BufReader<R>>, KeyValue>,
    path: PathBuf,
    map_task: usize,
    decoded: usize,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    /// Wraps `reader`. `path` and `map_task` only label errors.
    pub fn new(reader: R, path: impl Into<PathBuf>, map_task: usize) -> Self {
        let de = serde_json::Deserializer::from_reader(BufReader::new(reader));
        Self {
            records: de.into_iter::<KeyValue>(),
            path: path.into(),
            map_task,
            decoded: 0,
            done: false,
        }
    }

    /// Number of records decoded so far.
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn classify(&self, err: serde_json::Error) -> ReduceError {
        if err.is_io() {
            ReduceError::Read {
                path: self.path.clone(),
                source: io::Error::from(err),
            }
        } else {
            ReduceError::Decode {
                path: self.path.clone(),
                map_task: self.map_task,
                record: self.decoded,
                source: err,
            }
        }
    }
}

impl RecordReader<File> {
    /// Opens an existing location for reading. Never creates it.
    pub fn open(path: impl AsRef<Path>, map_task: usize) -> ReduceResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReduceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(file, path, map_task))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = ReduceResult<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.records.next() {
            None => {
                self.done = true;
                None
            }
            Some(Ok(kv)) => {
                self.decoded += 1;
                Some(Ok(kv))
            }
            Some(Err(err)) => {
                self.done = true;
                Some(Err(self.classify(err)))
            }
        }
    }
}

/// Encodes records into a location, one JSON object per line.
pub struct RecordWriter<W: Write> {
    inner: BufWriter<W>,
    path: PathBuf,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W, path: impl Into<PathBuf>) -> Self {
        Self {
            inner: BufWriter::new(writer),
            path: path.into(),
            written: 0,
        }
    }

    pub fn write(&mut self, kv: &KeyValue) -> ReduceResult<()> {
        serde_json::to_writer(&mut self.inner, kv).map_err(|err| {
            if err.is_io() {
                ReduceError::Write {
                    path: self.path.clone(),
                    source: io::Error::from(err),
                }
            } else {
                ReduceError::Encode {
                    path: self.path.clone(),
                    key: kv.key.clone(),
                    source: err,
                }
            }
        })?;
        self.inner.write_all(b"\n").map_err(|source| ReduceError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes buffered records and hands back the underlying writer.
    pub fn finish(self) -> ReduceResult<W> {
        let path = self.path;
        self.inner.into_inner().map_err(|err| ReduceError::Write {
            path,
            source: err.into_error(),
        })
    }
}

/// Reads every record of a location, failing on the first bad one.
pub fn read_records(path: impl AsRef<Path>) -> ReduceResult<Vec<KeyValue>> {
    RecordReader::open(path, 0)?.collect()
}

/// Creates (or truncates) a location and writes `records` into it.
///
/// This is what a map task does with one of its partitions.
pub fn write_records<'a>(
    path: impl AsRef<Path>,
    records: impl IntoIterator<Item = &'a KeyValue>,
) -> ReduceResult<usize> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| ReduceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = RecordWriter::new(file, path);
    for kv in records {
        writer.write(kv)?;
    }
    let written = writer.written();
    writer.finish()?.sync_all().map_err(|source| ReduceError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(written)
}
