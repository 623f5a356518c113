//! Per-thread histogram and summary statistics, from either a cyclictest
//! JSON summary or the text block at the end of a histogram run.

mod json;
mod text;

use std::collections::BTreeMap;

pub use json::JsonSummary;
pub use text::TextReport;

use crate::error::Result;

#[derive(Clone, Debug, PartialEq)]
pub struct ThreadSummary {
    pub id: u32,
    /// Latency bucket (us) -> sample count.
    pub histogram: BTreeMap<u32, u64>,
    pub min: u64,
    pub max: u64,
    pub avg: f64,
    pub cycles: u64,
}

impl ThreadSummary {
    pub fn total_samples(&self) -> u64 {
        self.histogram.values().sum()
    }

    /// Samples beyond the histogram range: counted in `cycles`, not in any bucket.
    pub fn overflow(&self) -> u64 {
        self.cycles.saturating_sub(self.total_samples())
    }

    pub fn max_count(&self) -> u64 {
        self.histogram.values().copied().max().unwrap_or(0)
    }

    pub fn info_text(&self) -> String {
        format!(
            "Total: {}, Min: {}, Avg: {}, Max: {}, Overflows: {}",
            self.total_samples(),
            self.min,
            self.avg,
            self.max,
            self.overflow()
        )
    }

    pub fn legend_label(&self) -> String {
        format!(
            "CPU {}: Total={}, Min={}, Avg={}, Max={}, Overflows={}",
            self.id,
            self.total_samples(),
            self.min,
            self.avg,
            self.max,
            self.overflow()
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    /// Ordered by thread id.
    pub threads: Vec<ThreadSummary>,
}

impl Summary {
    pub fn ids(&self) -> Vec<u32> {
        self.threads.iter().map(|t| t.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

/// Anything that yields per-CPU summary stats plus a bucketed histogram.
pub trait SummarySource {
    fn load(&self) -> Result<Summary>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(histogram: &[(u32, u64)], cycles: u64) -> ThreadSummary {
        ThreadSummary {
            id: 3,
            histogram: histogram.iter().copied().collect(),
            min: 8,
            max: 22,
            avg: 14.5,
            cycles,
        }
    }

    #[test]
    fn overflow_is_cycles_minus_counts() {
        let t = thread(&[(10, 5), (20, 3)], 9);
        assert_eq!(t.total_samples(), 8);
        assert_eq!(t.overflow(), 1);
        assert_eq!(t.max_count(), 5);
    }

    #[test]
    fn overflow_never_underflows() {
        let t = thread(&[(10, 5)], 2);
        assert_eq!(t.overflow(), 0);
    }

    #[test]
    fn annotation_text() {
        let t = thread(&[(10, 5), (20, 3)], 9);
        assert_eq!(t.info_text(), "Total: 8, Min: 8, Avg: 14.5, Max: 22, Overflows: 1");
        assert_eq!(
            t.legend_label(),
            "CPU 3: Total=8, Min=8, Avg=14.5, Max=22, Overflows=1"
        );
    }
}
