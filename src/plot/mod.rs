//! PNG chart rendering. Every chart owns its drawing area and is presented
//! before the next one is started.

pub mod histogram;
pub mod timeseries;

use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::stats::SmoothingMode;

pub const HISTOGRAM_FILE: &str = "histogram.png";
pub const TIMESERIES_FILE: &str = "timeseries.png";
pub const TIMESERIES_SPLIT_FILE: &str = "timeseries_split.png";

pub(crate) const FONT: &str = "sans-serif";
pub(crate) const CAPTION_SIZE: u32 = 22;
pub(crate) const LABEL_SIZE: u32 = 13;

type DrawResult = std::result::Result<(), Box<dyn StdError>>;

pub fn timeseries_file(mode: SmoothingMode) -> String {
    format!("timeseries_{mode}.png")
}

pub fn timeseries_cpu_file(cpu: u32, mode: SmoothingMode) -> String {
    format!("timeseries_{cpu}_{mode}.png")
}

pub fn histogram_file(id: u32) -> String {
    format!("histogram_{id}.png")
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}

/// Runs a drawing closure and attaches the target path to any failure.
pub(crate) fn render<F>(path: &Path, draw: F) -> Result<PathBuf>
where
    F: FnOnce(&Path) -> DrawResult,
{
    draw(path).map_err(|e| Error::Render {
        path: path.to_path_buf(),
        msg: e.to_string(),
    })?;
    tracing::debug!(path = %path.display(), "chart written");
    Ok(path.to_path_buf())
}

/// Axis range that plotters can map even for a single point.
pub(crate) fn padded_range(lo: f64, hi: f64) -> std::ops::Range<f64> {
    if hi > lo {
        lo..hi
    } else {
        lo..lo + 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(timeseries_file(SmoothingMode::Max), "timeseries_max.png");
        assert_eq!(timeseries_cpu_file(3, SmoothingMode::None), "timeseries_3_none.png");
        assert_eq!(histogram_file(0), "histogram_0.png");
    }

    #[test]
    fn degenerate_ranges_are_widened() {
        assert_eq!(padded_range(5.0, 5.0), 5.0..6.0);
        assert_eq!(padded_range(0.0, 2.0), 0.0..2.0);
    }

    #[test]
    fn ensure_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a").join("graphics");
        ensure_dir(&out).unwrap();
        ensure_dir(&out).unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn render_failure_names_the_file() {
        let err = render(Path::new("out.png"), |_| Err("no fonts".into())).unwrap_err();
        assert_eq!(err.to_string(), "failed to render out.png: no fonts");
    }
}
