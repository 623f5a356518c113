use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::log::{Sample, SampleTable};

pub const DEFAULT_THRESHOLD_US: u64 = 1000;

pub fn high_latency(table: &SampleTable, threshold: u64) -> Vec<&Sample> {
    table.rows.iter().filter(|s| s.latency > threshold).collect()
}

pub fn format_sample(s: &Sample) -> String {
    format!("{}: {}: {}", s.cpu, s.tick, s.latency)
}

/// Writes one `<CPU>: <Tick>: <Latency>` line per sample above `threshold`.
/// Returns the number of lines written.
pub fn write_report(table: &SampleTable, threshold: u64, path: &Path) -> Result<usize> {
    let rows = high_latency(table, threshold);
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut out = BufWriter::new(file);
    for s in &rows {
        writeln!(out, "{}", format_sample(s)).map_err(|e| Error::io(path, e))?;
    }
    out.flush().map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), rows = rows.len(), threshold, "wrote high-latency report");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::parse_str;
    use std::fs;

    #[test]
    fn filters_strictly_above_threshold_in_order() {
        let table = parse_str("1: 1: 2000 0\n2: 1: 1000 0\n1: 2: 1001 0\n2: 2: 5 0\n");
        let lines: Vec<String> = high_latency(&table, 1000)
            .into_iter()
            .map(format_sample)
            .collect();
        assert_eq!(lines, vec!["1: 1: 2000", "1: 2: 1001"]);
    }

    #[test]
    fn writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("high_latency.txt");
        let table = parse_str("1: 10: 50 0\n1: 20: 1500 0\n2: 10: 30 0\n");
        assert_eq!(write_report(&table, DEFAULT_THRESHOLD_US, &path).unwrap(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "1: 20: 1500\n");
    }

    #[test]
    fn nothing_above_threshold_gives_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("high_latency.txt");
        let table = parse_str("1: 10: 50 0\n");
        assert_eq!(write_report(&table, DEFAULT_THRESHOLD_US, &path).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        assert_eq!(write_report(&SampleTable::default(), 0, &path).unwrap(), 0);
        assert!(fs::read_to_string(&path).unwrap().is_empty());
    }

    #[test]
    fn unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.txt");
        let err = write_report(&SampleTable::default(), 0, &path).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
