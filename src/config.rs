use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::stats::SmoothingMode;
use crate::summary::{JsonSummary, SummarySource, TextReport};

pub const DEFAULT_OUT_DIR: &str = "graphics";
pub const DEFAULT_REPORT_FILE: &str = "high_latency.txt";

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SummaryFormat {
    /// `<input>.json` if it exists, otherwise the text block in the input
    Auto,
    Json,
    Text,
}

/// Where the histogram summary comes from. Also decides the output layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SummaryLocation {
    Json(PathBuf),
    Text(PathBuf),
}

impl SummaryLocation {
    pub fn path(&self) -> &Path {
        match self {
            SummaryLocation::Json(p) | SummaryLocation::Text(p) => p,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SummaryLocation::Json(_) => "json",
            SummaryLocation::Text(_) => "text",
        }
    }

    pub fn source(&self) -> Box<dyn SummarySource> {
        match self {
            SummaryLocation::Json(p) => Box::new(JsonSummary::new(p)),
            SummaryLocation::Text(p) => Box::new(TextReport::new(p)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Histograms per thread, time series for every smoothing mode.
    PerMode,
    /// Histograms per thread, combined + split time series, high-latency report.
    Report,
}

#[derive(Clone, Debug)]
pub struct PlotConfig {
    pub input: PathBuf,
    pub out_dir: PathBuf,
    pub summary: SummaryLocation,
    pub layout: Layout,
    pub step: u32,
    pub threshold: u64,
    pub smoothing: SmoothingMode,
    pub report_path: PathBuf,
}

pub struct Overrides {
    pub out_dir: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub summary_format: SummaryFormat,
    pub step: u32,
    pub threshold: u64,
    pub smoothing: SmoothingMode,
    pub report: Option<PathBuf>,
}

impl PlotConfig {
    pub fn with_overrides(input: PathBuf, o: Overrides) -> Result<Self> {
        if o.step == 0 {
            return Err(Error::InvalidConfig("--step must be greater than zero".into()));
        }
        let out_dir = o.out_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
        let summary = locate_summary(&input, o.summary, o.summary_format);
        let layout = match summary {
            SummaryLocation::Json(_) => Layout::PerMode,
            SummaryLocation::Text(_) => Layout::Report,
        };
        let report_path = o.report.unwrap_or_else(|| out_dir.join(DEFAULT_REPORT_FILE));
        Ok(Self {
            input,
            out_dir,
            summary,
            layout,
            step: o.step,
            threshold: o.threshold,
            smoothing: o.smoothing,
            report_path,
        })
    }
}

/// `run.log` -> `run.log.json`
pub fn json_sidecar(input: &Path) -> PathBuf {
    let mut s = OsString::from(input.as_os_str());
    s.push(".json");
    PathBuf::from(s)
}

fn locate_summary(
    input: &Path,
    explicit: Option<PathBuf>,
    format: SummaryFormat,
) -> SummaryLocation {
    match (format, explicit) {
        (SummaryFormat::Json, p) => SummaryLocation::Json(p.unwrap_or_else(|| json_sidecar(input))),
        (SummaryFormat::Text, p) => SummaryLocation::Text(p.unwrap_or_else(|| input.to_path_buf())),
        (SummaryFormat::Auto, Some(p)) => {
            if p.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
                SummaryLocation::Json(p)
            } else {
                SummaryLocation::Text(p)
            }
        }
        (SummaryFormat::Auto, None) => {
            let sidecar = json_sidecar(input);
            if sidecar.is_file() {
                SummaryLocation::Json(sidecar)
            } else {
                SummaryLocation::Text(input.to_path_buf())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::DEFAULT_THRESHOLD_US;
    use crate::plot::histogram::DEFAULT_STEP;

    fn overrides() -> Overrides {
        Overrides {
            out_dir: None,
            summary: None,
            summary_format: SummaryFormat::Auto,
            step: DEFAULT_STEP,
            threshold: DEFAULT_THRESHOLD_US,
            smoothing: SmoothingMode::Max,
            report: None,
        }
    }

    #[test]
    fn sidecar_appends_extension() {
        assert_eq!(json_sidecar(Path::new("logs/run.log")), PathBuf::from("logs/run.log.json"));
    }

    #[test]
    fn auto_prefers_existing_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("run.log");
        std::fs::write(&input, "").unwrap();

        let cfg = PlotConfig::with_overrides(input.clone(), overrides()).unwrap();
        assert_eq!(cfg.summary, SummaryLocation::Text(input.clone()));
        assert_eq!(cfg.layout, Layout::Report);

        std::fs::write(json_sidecar(&input), "{}").unwrap();
        let cfg = PlotConfig::with_overrides(input.clone(), overrides()).unwrap();
        assert_eq!(cfg.summary, SummaryLocation::Json(json_sidecar(&input)));
        assert_eq!(cfg.layout, Layout::PerMode);
    }

    #[test]
    fn explicit_summary_and_format() {
        let input = PathBuf::from("run.log");
        let cfg = PlotConfig::with_overrides(
            input.clone(),
            Overrides {
                summary: Some(PathBuf::from("stats.JSON")),
                ..overrides()
            },
        )
        .unwrap();
        assert_eq!(cfg.summary.kind(), "json");

        let cfg = PlotConfig::with_overrides(
            input.clone(),
            Overrides {
                summary_format: SummaryFormat::Json,
                ..overrides()
            },
        )
        .unwrap();
        assert_eq!(cfg.summary.path(), Path::new("run.log.json"));

        let cfg = PlotConfig::with_overrides(
            input,
            Overrides {
                summary: Some(PathBuf::from("hist.txt")),
                ..overrides()
            },
        )
        .unwrap();
        assert_eq!(cfg.summary, SummaryLocation::Text(PathBuf::from("hist.txt")));
    }

    #[test]
    fn report_defaults_into_out_dir() {
        let cfg = PlotConfig::with_overrides(
            PathBuf::from("run.log"),
            Overrides {
                out_dir: Some(PathBuf::from("out")),
                summary_format: SummaryFormat::Text,
                ..overrides()
            },
        )
        .unwrap();
        assert_eq!(cfg.report_path, PathBuf::from("out/high_latency.txt"));
    }

    #[test]
    fn zero_step_is_rejected() {
        let err = PlotConfig::with_overrides(
            PathBuf::from("run.log"),
            Overrides {
                step: 0,
                ..overrides()
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
