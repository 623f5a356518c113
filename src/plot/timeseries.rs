use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{debug, info, warn};

use super::{padded_range, render, DrawResult, CAPTION_SIZE, FONT, LABEL_SIZE};
use crate::error::Result;
use crate::log::SampleTable;
use crate::palette::ColorMap;
use crate::stats::{smooth, window_size, SmoothingMode};

const SIZE: (u32, u32) = (1000, 600);
const PANEL_HEIGHT: u32 = 240;
const LINE_ALPHA: f64 = 0.7;

/// One CPU's (tick, latency) points after smoothing.
#[derive(Clone, Debug, PartialEq)]
pub struct CpuSeries {
    pub cpu: u32,
    pub window: usize,
    pub points: Vec<(f64, f64)>,
}

impl CpuSeries {
    fn x_bounds(&self) -> (f64, f64) {
        bounds(self.points.iter().map(|p| p.0))
    }

    fn y_max(&self) -> f64 {
        self.points.iter().map(|p| p.1).fold(0.0, f64::max)
    }
}

pub fn series(table: &SampleTable, mode: SmoothingMode) -> Vec<CpuSeries> {
    table
        .group_by_cpu()
        .into_iter()
        .map(|(cpu, rows)| {
            let latencies: Vec<u64> = rows.iter().map(|s| s.latency).collect();
            let smoothed = smooth(&latencies, mode);
            CpuSeries {
                cpu,
                window: window_size(rows.len()),
                points: rows.iter().map(|s| s.tick as f64).zip(smoothed).collect(),
            }
        })
        .collect()
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo.is_finite() {
        (lo, hi)
    } else {
        (0.0, 1.0)
    }
}

fn y_range(series: &[CpuSeries]) -> std::ops::Range<f64> {
    let max = series.iter().map(CpuSeries::y_max).fold(0.0, f64::max);
    padded_range(0.0, max * 1.05)
}

fn draw_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    title: &str,
    mode: SmoothingMode,
    series: &[CpuSeries],
    colors: &ColorMap,
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let (x_lo, x_hi) = bounds(series.iter().flat_map(|s| {
        let (lo, hi) = s.x_bounds();
        [lo, hi]
    }));

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, CAPTION_SIZE))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(padded_range(x_lo, x_hi), y_range(series))?;

    chart
        .configure_mesh()
        .x_desc("Tick")
        .y_desc(format!("Latency ({})", mode.title()))
        .x_label_formatter(&|x| format!("{x:.0}"))
        .label_style((FONT, LABEL_SIZE))
        .draw()?;

    for s in series {
        let color = colors.color(s.cpu);
        chart
            .draw_series(LineSeries::new(
                s.points.iter().copied(),
                color.mix(LINE_ALPHA).stroke_width(1),
            ))?
            .label(format!("CPU {}", s.cpu))
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    if !series.is_empty() {
        chart
            .configure_series_labels()
            .label_font((FONT, LABEL_SIZE))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }
    Ok(())
}

pub fn render_combined(
    path: &Path,
    title: &str,
    mode: SmoothingMode,
    series: &[CpuSeries],
    colors: &ColorMap,
) -> Result<PathBuf> {
    render(path, |path| {
        let root = BitMapBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        draw_chart(&root, title, mode, series, colors)?;
        root.present()?;
        Ok(())
    })
}

/// All CPUs in one image, one panel per CPU stacked top to bottom.
pub fn render_split(
    path: &Path,
    mode: SmoothingMode,
    series: &[CpuSeries],
    colors: &ColorMap,
) -> Result<PathBuf> {
    let rows = series.len().max(1);
    render(path, |path| {
        let root =
            BitMapBackend::new(path, (SIZE.0, PANEL_HEIGHT * rows as u32)).into_drawing_area();
        root.fill(&WHITE)?;
        if series.is_empty() {
            draw_chart(&root, "No latency samples", mode, series, colors)?;
        }
        for (panel, s) in root.split_evenly((rows, 1)).iter().zip(series) {
            let title = format!("CPU {} {} Latency over Time", s.cpu, mode.title());
            draw_chart(panel, &title, mode, std::slice::from_ref(s), colors)?;
        }
        root.present()?;
        Ok(())
    })
}

/// `timeseries_<mode>.png` with every CPU plus one `timeseries_<cpu>_<mode>.png` per CPU.
pub fn render_mode(
    table: &SampleTable,
    mode: SmoothingMode,
    out_dir: &Path,
    colors: &ColorMap,
) -> Result<Vec<PathBuf>> {
    let all = series(table, mode);
    if all.is_empty() {
        warn!(%mode, "no latency samples, time-series chart will be empty");
    }

    let mut written = Vec::with_capacity(all.len() + 1);
    let title = format!("{} CPU Latencies over Time", mode.title());
    written.push(render_combined(
        &out_dir.join(super::timeseries_file(mode)),
        &title,
        mode,
        &all,
        colors,
    )?);

    for s in &all {
        debug!(cpu = s.cpu, rows = s.points.len(), window = s.window, %mode, "smoothed series");
        let title = format!("CPU {} {} Latency over Time", s.cpu, mode.title());
        written.push(render_combined(
            &out_dir.join(super::timeseries_cpu_file(s.cpu, mode)),
            &title,
            mode,
            std::slice::from_ref(s),
            colors,
        )?);
    }
    info!(%mode, charts = written.len(), "rendered time-series charts");
    Ok(written)
}
