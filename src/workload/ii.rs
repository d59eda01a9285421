//! The reduce half of an inverted index.
//!
//! Map tasks emit `(word, document)` for every occurrence. The reduction
//! outputs the number of distinct documents followed by their sorted,
//! comma-separated names, e.g. `"2 pg-a.txt,pg-b.txt"`. Duplicate and
//! reordered values give the same result.

use anyhow::Result;
use itertools::Itertools;

pub fn reduce(_key: &str, values: &[String]) -> Result<String> {
    let documents = values.iter().map(String::as_str).sorted().dedup().collect_vec();
    Ok(format!("{} {}", documents.len(), documents.join(",")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_sorted_documents() {
        let values = ["b.txt", "a.txt", "b.txt"].map(String::from);
        assert_eq!(reduce("word", &values).unwrap(), "2 a.txt,b.txt");
    }

    #[test]
    fn test_order_insensitive() {
        let one = ["x", "y", "z"].map(String::from);
        let two = ["z", "x", "y", "x"].map(String::from);
        assert_eq!(reduce("k", &one).unwrap(), reduce("k", &two).unwrap());
    }
}
