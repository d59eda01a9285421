//! The reduce half of word count: map tasks emit a count per word occurrence,
//! and the reduction adds them up.
//!

use anyhow::{Context, Result};

pub fn reduce(key: &str, values: &[String]) -> Result<String> {
    let mut count: u64 = 0;
    for value in values {
        let n: u64 = value
            .trim()
            .parse()
            .with_context(|| format!("count {:?} for word {:?} is not a number", value, key))?;
        count = count
            .checked_add(n)
            .with_context(|| format!("count for word {:?} overflows u64", key))?;
    }
    Ok(count.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sum() {
        assert_eq!(reduce("a", &strings(&["1", "3"])).unwrap(), "4");
        assert_eq!(reduce("b", &strings(&["2"])).unwrap(), "2");
    }

    #[test]
    fn test_not_a_number() {
        assert!(reduce("a", &strings(&["1", "x"])).is_err());
    }

    #[test]
    fn test_overflow_is_error() {
        let values = vec![u64::MAX.to_string(), "1".to_string()];
        let err = reduce("k", &values).unwrap_err();
        assert!(err.to_string().contains("overflows"), "{}", err);
        assert_eq!(reduce("k", &[u64::MAX.to_string()]).unwrap(), u64::MAX.to_string());
    }
}
