use std::fmt;
use std::path::PathBuf;

use crate::stats::StatResult;
use crate::summary::Summary;

/// Everything the console summary shows after a run.
pub struct RunSummary {
    pub input: PathBuf,
    pub cpu_stats: Vec<(u32, StatResult)>,
    pub summary_path: PathBuf,
    pub summary_kind: &'static str,
    pub summary: Summary,
    pub threshold: u64,
    pub high_latency: Option<(usize, PathBuf)>,
    pub charts: Vec<PathBuf>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let samples: usize = self.cpu_stats.iter().map(|(_, s)| s.count).sum();

        writeln!(f, "=== Latency Summary ===")?;
        writeln!(
            f,
            "Input:   {} ({} samples, {} CPUs)",
            self.input.display(),
            format_int(samples as u64),
            self.cpu_stats.len()
        )?;
        writeln!(
            f,
            "Summary: {} ({}, {} threads)",
            self.summary_path.display(),
            self.summary_kind,
            self.summary.threads.len()
        )?;

        if !self.cpu_stats.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "{:>6} {:>12} {:>8} {:>10} {:>8} {:>8} {:>8} {:>10}",
                "CPU", "samples", "min", "mean", "p50", "p99", "max", "stddev"
            )?;
            for (cpu, s) in &self.cpu_stats {
                writeln!(
                    f,
                    "{:>6} {:>12} {:>8} {:>10.2} {:>8} {:>8} {:>8} {:>10.2}",
                    cpu,
                    format_int(s.count as u64),
                    s.min,
                    s.mean,
                    s.p50,
                    s.p99,
                    s.max,
                    s.stddev
                )?;
            }
        }

        if !self.summary.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "{:>6} {:>12} {:>8} {:>10} {:>8} {:>10}",
                "thread", "total", "min", "avg", "max", "overflows"
            )?;
            for t in &self.summary.threads {
                writeln!(
                    f,
                    "{:>6} {:>12} {:>8} {:>10} {:>8} {:>10}",
                    t.id,
                    format_int(t.total_samples()),
                    t.min,
                    t.avg,
                    t.max,
                    format_int(t.overflow())
                )?;
            }
        }

        writeln!(f)?;
        if let Some((rows, path)) = &self.high_latency {
            writeln!(
                f,
                "Above {} us: {} samples -> {}",
                self.threshold,
                format_int(*rows as u64),
                path.display()
            )?;
        }
        writeln!(f, "Charts:  {} written", self.charts.len())
    }
}

pub fn print_summary(run: &RunSummary) {
    println!();
    print!("{run}");
    println!();
}

fn format_int(v: u64) -> String {
    if v >= 1_000_000 {
        format!(
            "{},{:03},{:03}",
            v / 1_000_000,
            (v / 1_000) % 1_000,
            v % 1_000
        )
    } else if v >= 1_000 {
        format!("{},{:03}", v / 1_000, v % 1_000)
    } else {
        format!("{}", v)
    }
}
