use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

/// `<CPU>: <Tick>: <Latency> <ignored>`, e.g. `     1:    20:    1500 0`
const SAMPLE_PATTERN: &str = r"^\s*(\d+):\s+(\d+):\s+(\d+)\s+\d+\s*$";

fn sample_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SAMPLE_PATTERN).expect("sample pattern is valid"))
}

/// One latency measurement. Latency is in microseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub cpu: u32,
    pub tick: u64,
    pub latency: u64,
}

#[derive(Clone, Debug, Default)]
pub struct SampleTable {
    pub rows: Vec<Sample>,
}

impl SampleTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows per CPU in ascending CPU order. File order is kept inside a group.
    pub fn group_by_cpu(&self) -> BTreeMap<u32, Vec<Sample>> {
        let mut groups: BTreeMap<u32, Vec<Sample>> = BTreeMap::new();
        for s in &self.rows {
            groups.entry(s.cpu).or_default().push(*s);
        }
        groups
    }

    pub fn cpus(&self) -> Vec<u32> {
        self.group_by_cpu().into_keys().collect()
    }
}

pub fn parse_line(line: &str) -> Option<Sample> {
    let caps = sample_re().captures(line)?;
    Some(Sample {
        cpu: caps[1].parse().ok()?,
        tick: caps[2].parse().ok()?,
        latency: caps[3].parse().ok()?,
    })
}

pub fn parse_str(text: &str) -> SampleTable {
    SampleTable {
        rows: text.lines().filter_map(parse_line).collect(),
    }
}

pub fn read_log(path: &Path) -> Result<SampleTable> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let table = parse_str(&text);
    debug!(
        path = %path.display(),
        lines = text.lines().count(),
        samples = table.len(),
        "parsed latency log"
    );
    Ok(table)
}
