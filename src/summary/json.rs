use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::{Summary, SummarySource, ThreadSummary};
use crate::error::{Error, Result};

#[derive(Deserialize)]
struct RawSummary {
    thread: BTreeMap<String, RawThread>,
}

#[derive(Deserialize)]
struct RawThread {
    histogram: BTreeMap<String, u64>,
    min: u64,
    max: u64,
    avg: f64,
    cycles: u64,
}

/// `{"thread": {"<id>": {"histogram": {"<us>": count}, "min", "max", "avg", "cycles"}}}`
/// Other top-level keys are ignored.
pub struct JsonSummary {
    path: PathBuf,
}

impl JsonSummary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn parse_str(path: &Path, text: &str) -> Result<Summary> {
        let raw: RawSummary = serde_json::from_str(text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let mut threads = Vec::with_capacity(raw.thread.len());
        for (key, t) in raw.thread {
            let id = parse_key(path, &key, "thread id")?;
            let mut histogram = BTreeMap::new();
            for (bucket, count) in t.histogram {
                let what = format!("histogram bucket of thread {key}");
                let bucket = parse_key(path, &bucket, &what)?;
                *histogram.entry(bucket).or_insert(0) += count;
            }
            threads.push(ThreadSummary {
                id,
                histogram,
                min: t.min,
                max: t.max,
                avg: t.avg,
                cycles: t.cycles,
            });
        }
        threads.sort_by_key(|t| t.id);
        Ok(Summary { threads })
    }
}

fn parse_key(path: &Path, key: &str, what: &str) -> Result<u32> {
    key.trim()
        .parse()
        .map_err(|_| Error::parse(path, format!("{what} '{key}' is not a non-negative integer")))
}

impl SummarySource for JsonSummary {
    fn load(&self) -> Result<Summary> {
        let text = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let summary = Self::parse_str(&self.path, &text)?;
        debug!(
            path = %self.path.display(),
            threads = summary.threads.len(),
            "loaded JSON summary"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Summary> {
        JsonSummary::parse_str(Path::new("run.log.json"), text)
    }

    #[test]
    fn totals_and_overflow() {
        let summary = parse(
            r#"{"thread":{"1":{"histogram":{"10":5,"20":3},"min":8,"max":22,"avg":14,"cycles":9}}}"#,
        )
        .unwrap();
        assert_eq!(summary.threads.len(), 1);
        let t = &summary.threads[0];
        assert_eq!(t.id, 1);
        assert_eq!(t.histogram.get(&10), Some(&5));
        assert_eq!(t.total_samples(), 8);
        assert_eq!(t.overflow(), 1);
        assert_eq!(t.avg, 14.0);
    }

    #[test]
    fn threads_sorted_numerically_and_extra_keys_ignored() {
        let summary = parse(
            r#"{
                "file_version": 1,
                "cmdline": "cyclictest -h 400",
                "thread": {
                    "10": {"histogram": {}, "min": 1, "max": 2, "avg": 1.5, "cycles": 4, "cpu": 10},
                    "2":  {"histogram": {"3": 4}, "min": 3, "max": 3, "avg": 3.0, "cycles": 4}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(summary.ids(), vec![2, 10]);
        assert_eq!(summary.threads[1].overflow(), 4);
        assert_eq!(summary.threads[0].overflow(), 0);
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = parse(r#"{"thread":{"1":{"histogram":{},"min":1,"max":2,"avg":1}}}"#).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
        let err = parse(r#"{"threads":{}}"#).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }

    #[test]
    fn non_numeric_keys_are_rejected() {
        let err = parse(
            r#"{"thread":{"main":{"histogram":{},"min":1,"max":2,"avg":1,"cycles":0}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));

        let err = parse(
            r#"{"thread":{"0":{"histogram":{"ten":1},"min":1,"max":2,"avg":1,"cycles":1}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("'ten'"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = JsonSummary::new("/nonexistent/run.log.json")
            .load()
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
