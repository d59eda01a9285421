use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::codec::{RecordReader, RecordWriter};
use crate::error::{ReduceError, ReduceResult};
use crate::naming::Locator;
use crate::reduce::group::KeyGroup;
use crate::reduce::{MissingInput, ReduceConfig};
use crate::KeyValue;

/// Opens the intermediate file of every map task for this partition.
///
/// Files are opened read-only. A missing file either fails the task or, under
/// [`MissingInput::TreatAsEmpty`], contributes no records.
pub fn open_sources(
    config: &ReduceConfig,
    locator: &impl Locator,
) -> ReduceResult<Vec<RecordReader<File>>> {
    let mut sources = Vec::with_capacity(config.n_map);
    for map_task in 0..config.n_map {
        let path = locator.intermediate(&config.job, map_task, config.reduce_task);
        match File::open(&path) {
            Ok(file) => sources.push(RecordReader::new(file, path, map_task)),
            Err(err) if err.kind() == ErrorKind::NotFound => match config.missing_input {
                MissingInput::Fail => return Err(ReduceError::MissingInput { path, map_task }),
                MissingInput::TreatAsEmpty => {
                    warn!(path = %path.display(), map_task, "intermediate input missing, treating as empty");
                }
            },
            Err(source) => return Err(ReduceError::Open { path, source }),
        }
    }
    Ok(sources)
}

/// Decodes every source into one collection, source by source.
pub fn load(sources: Vec<RecordReader<File>>) -> ReduceResult<Vec<KeyValue>> {
    let mut records = Vec::new();
    for mut reader in sources {
        for kv in reader.by_ref() {
            records.push(kv?);
        }
        debug!(path = %reader.path().display(), records = reader.decoded(), "loaded intermediate input");
    }
    Ok(records)
}

/// Runs the user reduction on one key group.
pub fn reduce_group<F>(reduce_fn: &F, group: KeyGroup) -> ReduceResult<KeyValue>
where
    F: Fn(&str, &[String]) -> anyhow::Result<String>,
{
    match reduce_fn(&group.key, &group.values) {
        Ok(value) => Ok(KeyValue {
            key: group.key,
            value,
        }),
        Err(source) => Err(ReduceError::Reduce {
            key: group.key,
            source,
        }),
    }
}

/// A temporary file that is removed when dropped, unless disarmed.
struct TempPath {
    path: PathBuf,
    armed: bool,
}

impl TempPath {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), "failed to remove temporary output: {}", err);
        }
    }
}

/// An output file being written under a temporary name.
///
/// Dropping it before [`PendingOutput::commit`] removes the temporary file,
/// so a failed task never leaves a partial output behind.
pub struct PendingOutput {
    // declared before `tmp` so the file is closed before it is removed
    writer: RecordWriter<File>,
    tmp: TempPath,
    dest: PathBuf,
}

impl PendingOutput {
    pub fn create(dest: &Path) -> ReduceResult<Self> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ReduceError::Open {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut name = dest.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".tmp-{}", Uuid::new_v4()));
        let tmp = dest.with_file_name(name);
        let file = File::create(&tmp).map_err(|source| ReduceError::Open {
            path: tmp.clone(),
            source,
        })?;
        Ok(Self {
            writer: RecordWriter::new(file, dest),
            tmp: TempPath {
                path: tmp,
                armed: true,
            },
            dest: dest.to_path_buf(),
        })
    }

    pub fn write(&mut self, kv: &KeyValue) -> ReduceResult<()> {
        self.writer.write(kv)
    }

    pub fn written(&self) -> usize {
        self.writer.written()
    }

    pub fn tmp_path(&self) -> &Path {
        &self.tmp.path
    }

    /// Flushes, syncs and renames the output into place.
    pub fn commit(self) -> ReduceResult<usize> {
        let PendingOutput { writer, tmp, dest } = self;
        let written = writer.written();
        let file = writer.finish()?;
        file.sync_all().map_err(|source| ReduceError::Write {
            path: dest.clone(),
            source,
        })?;
        drop(file);
        fs::rename(&tmp.path, &dest).map_err(|source| ReduceError::Commit {
            from: tmp.path.clone(),
            to: dest.clone(),
            source,
        })?;
        tmp.disarm();
        Ok(written)
    }
}

/// Writes `records` in order to `dest`, replacing any previous output.
pub fn write_output<I>(dest: &Path, records: I) -> ReduceResult<usize>
where
    I: IntoIterator<Item = ReduceResult<KeyValue>>,
{
    let mut output = PendingOutput::create(dest)?;
    for kv in records {
        output.write(&kv?)?;
    }
    output.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::read_records;

    fn kv(key: &str, value: &str) -> KeyValue {
        KeyValue::new(key, value)
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_dropped_output_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("mrtmp.job-res-0");

        let mut pending = PendingOutput::create(&dest).unwrap();
        pending.write(&kv("a", "1")).unwrap();
        assert!(pending.tmp_path().exists());
        drop(pending);

        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn test_commit_leaves_only_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out").join("mrtmp.job-res-0");

        let mut pending = PendingOutput::create(&dest).unwrap();
        pending.write(&kv("a", "1")).unwrap();
        pending.write(&kv("b", "2")).unwrap();
        assert_eq!(pending.written(), 2);
        assert_eq!(pending.commit().unwrap(), 2);

        assert_eq!(entries(&dir.path().join("out")), vec!["mrtmp.job-res-0"]);
        assert_eq!(read_records(&dest).unwrap(), vec![kv("a", "1"), kv("b", "2")]);
    }

    #[test]
    fn test_write_output_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("res");
        write_output(&dest, vec![Ok(kv("old", "1")), Ok(kv("stale", "2"))]).unwrap();

        let n = write_output(&dest, vec![Ok(kv("new", "3"))]).unwrap();
        assert_eq!(n, 1);
        assert_eq!(read_records(&dest).unwrap(), vec![kv("new", "3")]);
        assert_eq!(entries(dir.path()), vec!["res"]);
    }
}
