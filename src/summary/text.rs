use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{Summary, SummarySource, ThreadSummary};
use crate::error::{Error, Result};

const LABEL_MAX: &str = "Max Latencies:";
const LABEL_MIN: &str = "Min Latencies:";
const LABEL_AVG: &str = "Avg Latencies:";
const LABEL_TOTAL: &str = "Total:";
const LABEL_OVERFLOWS: &str = "Histogram Overflows:";

const COMMENT: char = '#';

/// Summary block printed at the end of a histogram run:
///
/// ```text
/// # Histogram
/// 000000 000000 000000
/// 000001 000013 000009
/// # Total: 000000013 000000009
/// # Min Latencies: 00001 00001
/// # Avg Latencies: 00001 00001
/// # Max Latencies: 00001 00001
/// # Histogram Overflows: 00000 00000
/// ```
///
/// Columns carry no ids, so threads are numbered 0..N in column order.
pub struct TextReport {
    path: PathBuf,
}

impl TextReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn parse_str(path: &Path, text: &str) -> Result<Summary> {
        let max = labeled(path, text, LABEL_MAX)?;
        let min = labeled(path, text, LABEL_MIN)?;
        let avg = labeled(path, text, LABEL_AVG)?;
        let total = labeled(path, text, LABEL_TOTAL)?;
        let overflows = labeled(path, text, LABEL_OVERFLOWS)?;

        let ncpus = max.len();
        for (label, values) in [
            (LABEL_MIN, &min),
            (LABEL_AVG, &avg),
            (LABEL_TOTAL, &total),
            (LABEL_OVERFLOWS, &overflows),
        ] {
            if values.len() != ncpus {
                return Err(Error::parse(
                    path,
                    format!(
                        "'{label}' lists {} values but '{LABEL_MAX}' lists {ncpus}",
                        values.len()
                    ),
                ));
            }
        }

        let mut histograms: Vec<BTreeMap<u32, u64>> = vec![BTreeMap::new(); ncpus];
        for (lineno, row) in histogram_rows(text) {
            if row.len() != ncpus + 1 {
                return Err(Error::parse(
                    path,
                    format!(
                        "line {lineno}: histogram row has {} count columns, expected {ncpus}",
                        row.len() - 1
                    ),
                ));
            }
            let bucket = u32::try_from(row[0]).map_err(|_| {
                Error::parse(path, format!("line {lineno}: bucket {} out of range", row[0]))
            })?;
            for (hist, &count) in histograms.iter_mut().zip(&row[1..]) {
                *hist.entry(bucket).or_insert(0) += count;
            }
        }

        let threads = histograms
            .into_iter()
            .enumerate()
            .map(|(i, histogram)| {
                let cycles = total[i].checked_add(overflows[i]).ok_or_else(|| {
                    Error::parse(
                        path,
                        format!(
                            "CPU {i}: total {} plus overflows {} does not fit in u64",
                            total[i], overflows[i]
                        ),
                    )
                })?;
                Ok(ThreadSummary {
                    id: i as u32,
                    histogram,
                    min: min[i],
                    max: max[i],
                    avg: avg[i] as f64,
                    cycles,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for (t, &tot) in threads.iter().zip(&total) {
            if t.total_samples() != tot {
                warn!(
                    cpu = t.id,
                    histogram = t.total_samples(),
                    total = tot,
                    "histogram table does not add up to the reported total"
                );
            }
        }

        Ok(Summary { threads })
    }
}

impl SummarySource for TextReport {
    fn load(&self) -> Result<Summary> {
        let text = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let summary = Self::parse_str(&self.path, &text)?;
        debug!(path = %self.path.display(), threads = summary.threads.len(), "loaded text summary");
        Ok(summary)
    }
}

/// Strips the optional comment marker in front of a labeled line.
fn strip_marker(line: &str) -> &str {
    let line = line.trim_start();
    line.strip_prefix(COMMENT).unwrap_or(line).trim_start()
}

fn labeled(path: &Path, text: &str, label: &str) -> Result<Vec<u64>> {
    let line = text
        .lines()
        .map(strip_marker)
        .find_map(|l| l.strip_prefix(label))
        .ok_or_else(|| Error::parse(path, format!("missing '{label}' line")))?;
    integers(line)
        .map(|tok| {
            tok.parse::<u64>()
                .map_err(|_| Error::parse(path, format!("'{label}' value {tok} out of range")))
        })
        .collect()
}

/// All runs of ASCII digits, in order.
fn integers(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_ascii_digit()).filter(|t| !t.is_empty())
}

/// Lines made only of whitespace-separated integers, starting with a digit.
/// Log sample lines (`0: 12: 5`) and comments fall out here.
fn histogram_rows(text: &str) -> impl Iterator<Item = (usize, Vec<u64>)> + '_ {
    text.lines().enumerate().filter_map(|(i, line)| {
        let trimmed = line.trim_start();
        if trimmed.starts_with(COMMENT) || !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        let row: Option<Vec<u64>> = trimmed.split_whitespace().map(|t| t.parse().ok()).collect();
        row.map(|r| (i + 1, r))
    })
}
