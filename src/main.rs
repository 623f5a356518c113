mod config;
mod error;
mod export;
mod log;
mod palette;
mod plot;
mod report;
mod stats;
mod summary;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn, Level};

use crate::config::{Layout, Overrides, PlotConfig, SummaryFormat};
use crate::palette::ColorMap;
use crate::plot::{histogram, timeseries};
use crate::report::RunSummary;
use crate::stats::SmoothingMode;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "rtlat-plot",
    version,
    about = "Plot real-time scheduling latency logs: per-CPU time series and histograms"
)]
struct Cli {
    /// Latency log with `CPU: Tick: Latency <x>` lines
    input: PathBuf,

    /// Directory for charts and reports (created if missing)
    #[arg(short, long, default_value = config::DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    /// Histogram tick spacing in microseconds
    #[arg(short, long, default_value_t = histogram::DEFAULT_STEP)]
    step: u32,

    /// Histogram summary file (default: <INPUT>.json or the input itself)
    #[arg(long)]
    summary: Option<PathBuf>,

    /// How to read the histogram summary
    #[arg(long, value_enum, default_value_t = SummaryFormat::Auto)]
    summary_format: SummaryFormat,

    /// Latency above which samples go to the high-latency report (us)
    #[arg(short, long, default_value_t = export::DEFAULT_THRESHOLD_US)]
    threshold: u64,

    /// High-latency report path (default: <OUT_DIR>/high_latency.txt)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Smoothing for timeseries.png and timeseries_split.png: max, mean or none
    #[arg(short = 'm', long, default_value = "max")]
    smoothing: SmoothingMode,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let cfg = PlotConfig::with_overrides(
        cli.input,
        Overrides {
            out_dir: Some(cli.out_dir),
            summary: cli.summary,
            summary_format: cli.summary_format,
            step: cli.step,
            threshold: cli.threshold,
            smoothing: cli.smoothing,
            report: cli.report,
        },
    )?;

    let run = run(&cfg)?;
    if !cli.quiet {
        report::print_summary(&run);
    }
    Ok(())
}

fn run(cfg: &PlotConfig) -> anyhow::Result<RunSummary> {
    let table = log::read_log(&cfg.input).context("failed to read latency log")?;
    if table.is_empty() {
        warn!(path = %cfg.input.display(), "no latency samples found");
    }
    info!(samples = table.len(), cpus = table.cpus().len(), "parsed latency log");

    let summary = cfg
        .summary
        .source()
        .load()
        .with_context(|| format!("failed to load {} histogram summary", cfg.summary.kind()))?;

    plot::ensure_dir(&cfg.out_dir)?;
    let colors = ColorMap::new(table.cpus().into_iter().chain(summary.ids()));

    let mut charts = Vec::new();
    let mut high_latency = None;
    match cfg.layout {
        Layout::PerMode => {
            charts.extend(histogram::render_all(&summary, &cfg.out_dir, cfg.step, &colors)?);
            for mode in SmoothingMode::ALL {
                charts.extend(timeseries::render_mode(&table, mode, &cfg.out_dir, &colors)?);
            }
        }
        Layout::Report => {
            charts.extend(histogram::render_all(&summary, &cfg.out_dir, cfg.step, &colors)?);

            let series = timeseries::series(&table, cfg.smoothing);
            let title = format!("{} CPU Latencies over Time", cfg.smoothing.title());
            charts.push(timeseries::render_combined(
                &cfg.out_dir.join(plot::TIMESERIES_FILE),
                &title,
                cfg.smoothing,
                &series,
                &colors,
            )?);
            charts.push(timeseries::render_split(
                &cfg.out_dir.join(plot::TIMESERIES_SPLIT_FILE),
                cfg.smoothing,
                &series,
                &colors,
            )?);

            let rows = export::write_report(&table, cfg.threshold, &cfg.report_path)?;
            high_latency = Some((rows, cfg.report_path.clone()));
        }
    }
    info!(charts = charts.len(), dir = %cfg.out_dir.display(), "done");

    Ok(RunSummary {
        input: cfg.input.clone(),
        cpu_stats: stats::per_cpu(&table),
        summary_path: cfg.summary.path().to_path_buf(),
        summary_kind: cfg.summary.kind(),
        summary,
        threshold: cfg.threshold,
        high_latency,
        charts,
    })
}
