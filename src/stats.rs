use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::log::SampleTable;

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatResult {
    pub mean: f64,
    pub stddev: f64,
    pub min: u64,
    pub max: u64,
    pub p50: u64,
    pub p99: u64,
    pub count: usize,
}

impl StatResult {
    /// Sorts `samples` in place.
    pub fn compute(samples: &mut [u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        samples.sort_unstable();
        let n = samples.len();
        let min = samples[0];
        let max = samples[n - 1];
        let p50 = nearest_rank(samples, 0.50);
        let p99 = nearest_rank(samples, 0.99);

        let sum: f64 = samples.iter().map(|&v| v as f64).sum();
        let mean = sum / n as f64;

        let var: f64 = samples
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n as f64;

        Self {
            mean,
            stddev: var.sqrt(),
            min,
            max,
            p50,
            p99,
            count: n,
        }
    }
}

/// Nearest-rank percentile of sorted, non-empty `samples`.
fn nearest_rank(samples: &[u64], q: f64) -> u64 {
    let rank = ((samples.len() as f64 * q).ceil() as usize).clamp(1, samples.len());
    samples[rank - 1]
}

pub fn per_cpu(table: &SampleTable) -> Vec<(u32, StatResult)> {
    table
        .group_by_cpu()
        .into_iter()
        .map(|(cpu, rows)| {
            let mut lat: Vec<u64> = rows.iter().map(|s| s.latency).collect();
            (cpu, StatResult::compute(&mut lat))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rolling smoothing
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmoothingMode {
    Max,
    Mean,
    None,
}

impl SmoothingMode {
    pub const ALL: [SmoothingMode; 3] = [
        SmoothingMode::Max,
        SmoothingMode::Mean,
        SmoothingMode::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SmoothingMode::Max => "max",
            SmoothingMode::Mean => "mean",
            SmoothingMode::None => "none",
        }
    }

    /// Capitalized form used in chart titles.
    pub fn title(self) -> &'static str {
        match self {
            SmoothingMode::Max => "Max",
            SmoothingMode::Mean => "Mean",
            SmoothingMode::None => "None",
        }
    }
}

impl fmt::Display for SmoothingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmoothingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max" => Ok(SmoothingMode::Max),
            "mean" => Ok(SmoothingMode::Mean),
            "none" => Ok(SmoothingMode::None),
            other => Err(format!("unknown smoothing mode '{other}' (expected max, mean or none)")),
        }
    }
}

/// 1% of the group size, never below one sample.
pub fn window_size(rows: usize) -> usize {
    (rows / 100).max(1)
}

/// Trailing rolling aggregate with a minimum period of one, so the first
/// points use whatever samples are available.
pub fn smooth(values: &[u64], mode: SmoothingMode) -> Vec<f64> {
    let window = window_size(values.len());
    match mode {
        SmoothingMode::None => values.iter().map(|&v| v as f64).collect(),
        SmoothingMode::Max => rolling_max(values, window),
        SmoothingMode::Mean => {
            let mut out = Vec::with_capacity(values.len());
            let mut sum: u128 = 0;
            for i in 0..values.len() {
                sum += values[i] as u128;
                if i >= window {
                    sum -= values[i - window] as u128;
                }
                let n = (i + 1).min(window);
                out.push(sum as f64 / n as f64);
            }
            out
        }
    }
}

/// Sliding-window max in O(n): the deque holds indices of a decreasing run,
/// front is the max of the current window.
fn rolling_max(values: &[u64], window: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut run: VecDeque<usize> = VecDeque::with_capacity(window);
    for (i, &v) in values.iter().enumerate() {
        while run.back().is_some_and(|&j| values[j] <= v) {
            run.pop_back();
        }
        run.push_back(i);
        if run.front().is_some_and(|&j| j + window <= i) {
            run.pop_front();
        }
        out.push(run.front().map_or(0, |&j| values[j]) as f64);
    }
    out
}
