//! Converts reduce application names to actual application code.
//!
//! # Example
//!
//! To get the word count reduction:
//! ```
//! # use anyhow::Result;
//! use mrmerge::workload;
//! # fn main() -> Result<()> {
//! let wc = workload::named("wc")?;
//! let total = (wc.reduce_fn)("the", &["1".to_string(), "2".to_string()])?;
//! assert_eq!(total, "3");
//! # Ok(())
//! # }
//! ```

use crate::Workload;
use anyhow::{bail, Result};

pub mod count;
pub mod ii;
pub mod wc;

/// Gets the [`Workload`] named `name`.
///
/// Returns [`None`] if no application with the given name was found.
pub fn try_named(name: &str) -> Option<Workload> {
    match name {
        "wc" => Some(Workload {
            reduce_fn: wc::reduce,
        }),
        "count" => Some(Workload {
            reduce_fn: count::reduce,
        }),
        "ii" => Some(Workload {
            reduce_fn: ii::reduce,
        }),
        _ => None,
    }
}

/// Gets the [`Workload`] named `name`.
///
/// Returns an [`anyhow::Error`] if no application with the given name was found.
pub fn named(name: &str) -> Result<Workload> {
    match try_named(name) {
        Some(app) => Ok(app),
        None => bail!("No app named `{}` found.", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_name() {
        assert!(try_named("grep").is_none());
        let err = named("grep").err().unwrap();
        assert_eq!(err.to_string(), "No app named `grep` found.");
    }

    #[test]
    fn test_known_names() {
        for name in ["wc", "count", "ii"] {
            assert!(try_named(name).is_some(), "{} should resolve", name);
        }
    }
}
