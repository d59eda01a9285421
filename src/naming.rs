//! Where intermediate and output files live.
//!
//! Each reduce task reads `(job, m, r)` for every map task `m` and writes
//! `(job, r)`. Distinct reduce tasks therefore touch disjoint files, which is
//! all the coordination concurrent reduce workers need.

use std::path::{Path, PathBuf};

/// Resolves job/task identifiers to file locations.
///
/// Implementations must be pure: the same arguments always give the same path.
pub trait Locator {
    /// The file map task `map_task` wrote for reduce partition `reduce_task`.
    fn intermediate(&self, job: &str, map_task: usize, reduce_task: usize) -> PathBuf;

    /// The file reduce partition `reduce_task` writes its result to.
    fn output(&self, job: &str, reduce_task: usize) -> PathBuf;
}

impl<L: Locator + ?Sized> Locator for &L {
    fn intermediate(&self, job: &str, map_task: usize, reduce_task: usize) -> PathBuf {
        (**self).intermediate(job, map_task, reduce_task)
    }

    fn output(&self, job: &str, reduce_task: usize) -> PathBuf {
        (**self).output(job, reduce_task)
    }
}

/// The `mrtmp.*` naming scheme rooted at a directory.
#[derive(Debug, Clone)]
pub struct DirLocator {
    dir: PathBuf,
}

impl DirLocator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Default for DirLocator {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Locator for DirLocator {
    fn intermediate(&self, job: &str, map_task: usize, reduce_task: usize) -> PathBuf {
        self.dir
            .join(format!("mrtmp.{}-{}-{}", job, map_task, reduce_task))
    }

    fn output(&self, job: &str, reduce_task: usize) -> PathBuf {
        self.dir.join(format!("mrtmp.{}-res-{}", job, reduce_task))
    }
}
