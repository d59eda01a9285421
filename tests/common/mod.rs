#![allow(dead_code)]

use std::fs;
use std::path::Path;

use mrmerge::codec::{read_records, write_records};
use mrmerge::{DirLocator, KeyValue, Locator};
use tempfile::TempDir;

pub const JOB: &str = "test";

pub fn test_dir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

pub fn kvs(pairs: &[(&str, &str)]) -> Vec<KeyValue> {
    pairs.iter().map(|(k, v)| KeyValue::new(*k, *v)).collect()
}

/// Writes map task `map_task`'s intermediate file for `reduce_task`.
pub fn write_intermediate(
    locator: &DirLocator,
    map_task: usize,
    reduce_task: usize,
    pairs: &[(&str, &str)],
) {
    let path = locator.intermediate(JOB, map_task, reduce_task);
    write_records(&path, &kvs(pairs)).expect("write intermediate file");
}

pub fn read_output(locator: &DirLocator, reduce_task: usize) -> Vec<KeyValue> {
    read_records(locator.output(JOB, reduce_task)).expect("read output file")
}

/// Names of every file left in `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Numeric sum of values, as text.
pub fn sum(_key: &str, values: &[String]) -> anyhow::Result<String> {
    let mut total: i64 = 0;
    for v in values {
        total += v.parse::<i64>()?;
    }
    Ok(total.to_string())
}
