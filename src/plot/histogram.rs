use std::path::{Path, PathBuf};

use plotters::coord::combinators::BindKeyPoints;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::{info, warn};

use super::{render, DrawResult, CAPTION_SIZE, FONT, LABEL_SIZE};
use crate::error::{Error, Result};
use crate::palette::{overlay_alpha, ColorMap};
use crate::summary::{Summary, ThreadSummary};

pub const DEFAULT_STEP: u32 = 50;
/// Upper end of the displayed latency range (us).
pub const X_MAX: u32 = 400;

const SIZE: (u32, u32) = (1000, 400);
const BAR_ALPHA: f64 = 0.9;
/// Log axis floor, just under a single sample.
const Y_FLOOR: f64 = 0.8;

/// Tick positions 0, step, 2*step, .. up to and including `X_MAX`.
pub fn ticks(step: u32) -> Result<Vec<u32>> {
    if step == 0 {
        return Err(Error::InvalidConfig("histogram step must be positive".into()));
    }
    Ok((0..=X_MAX).step_by(step as usize).collect())
}

fn y_top(threads: &[&ThreadSummary]) -> f64 {
    let max = threads.iter().map(|t| t.max_count()).max().unwrap_or(0);
    (max.max(1) as f64) * 2.0
}

fn bars(t: &ThreadSummary, color: RGBAColor) -> impl Iterator<Item = Rectangle<(u32, f64)>> + '_ {
    t.histogram
        .iter()
        .filter(|&(&bucket, &count)| bucket < X_MAX && count > 0)
        .map(move |(&bucket, &count)| {
            Rectangle::new([(bucket, Y_FLOOR), (bucket + 1, count as f64)], color.filled())
        })
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    title: &str,
    threads: &[&ThreadSummary],
    step: u32,
    colors: &ColorMap,
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let overlay = threads.len() > 1;
    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, CAPTION_SIZE))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(
            (0u32..X_MAX).with_key_points(ticks(step)?),
            (Y_FLOOR..y_top(threads)).log_scale(),
        )?;

    chart
        .configure_mesh()
        .x_desc("Latency (us)")
        .y_desc("Number of latency samples")
        .y_label_formatter(&|y| format!("{y:.0}"))
        .label_style((FONT, LABEL_SIZE))
        .draw()?;

    for (i, t) in threads.iter().enumerate() {
        let base = colors.color(t.id);
        let color = base.mix(if overlay { overlay_alpha(i) } else { BAR_ALPHA });
        let anno = chart.draw_series(bars(t, color))?;
        if overlay {
            anno.label(t.legend_label())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
                });
        }
    }

    if overlay {
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

/// Boxed summary text in the upper right corner of the chart.
fn annotate<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    text: &str,
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let style =
        TextStyle::from((FONT, LABEL_SIZE).into_font()).pos(Pos::new(HPos::Right, VPos::Top));
    let (w, h) = root.estimate_text_size(text, &style)?;
    let (width, _) = root.dim_in_pixel();
    let right = width as i32 - 30;
    let top = 60;
    root.draw(&Rectangle::new(
        [(right - w as i32 - 6, top - 4), (right + 6, top + h as i32 + 4)],
        WHITE.mix(0.5).filled(),
    ))?;
    root.draw(&Text::new(text.to_string(), (right, top), style))?;
    Ok(())
}

pub fn render_thread(
    path: &Path,
    thread: &ThreadSummary,
    step: u32,
    colors: &ColorMap,
) -> Result<PathBuf> {
    render(path, |path| {
        let root = BitMapBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let title = format!("CPU {} Latency Histogram", thread.id);
        draw_chart(&root, &title, &[thread], step, colors)?;
        annotate(&root, &thread.info_text())?;
        root.present()?;
        Ok(())
    })
}

pub fn render_combined(
    path: &Path,
    summary: &Summary,
    step: u32,
    colors: &ColorMap,
) -> Result<PathBuf> {
    let threads: Vec<&ThreadSummary> = summary.threads.iter().collect();
    render(path, |path| {
        let root = BitMapBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        draw_chart(&root, "Latency Histogram", &threads, step, colors)?;
        if let [only] = threads.as_slice() {
            annotate(&root, &only.legend_label())?;
        }
        root.present()?;
        Ok(())
    })
}

/// `histogram_<id>.png` per thread plus the combined `histogram.png`.
pub fn render_all(
    summary: &Summary,
    out_dir: &Path,
    step: u32,
    colors: &ColorMap,
) -> Result<Vec<PathBuf>> {
    if summary.is_empty() {
        warn!("summary has no threads, histogram chart will be empty");
    }
    let mut written = Vec::with_capacity(summary.threads.len() + 1);
    for t in &summary.threads {
        let path = out_dir.join(super::histogram_file(t.id));
        written.push(render_thread(&path, t, step, colors)?);
    }
    let path = out_dir.join(super::HISTOGRAM_FILE);
    written.push(render_combined(&path, summary, step, colors)?);
    info!(charts = written.len(), step, "rendered histogram charts");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn thread(id: u32, histogram: &[(u32, u64)]) -> ThreadSummary {
        ThreadSummary {
            id,
            histogram: histogram.iter().copied().collect::<BTreeMap<_, _>>(),
            min: 1,
            max: 500,
            avg: 3.0,
            cycles: 100,
        }
    }

    #[test]
    fn default_ticks() {
        assert_eq!(
            ticks(DEFAULT_STEP).unwrap(),
            vec![0, 50, 100, 150, 200, 250, 300, 350, 400]
        );
    }

    #[test]
    fn uneven_step_stops_inside_range() {
        assert_eq!(ticks(150).unwrap(), vec![0, 150, 300]);
    }

    #[test]
    fn zero_step_is_rejected() {
        assert!(matches!(ticks(0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn bars_skip_empty_and_out_of_range_buckets() {
        let t = thread(0, &[(0, 0), (3, 7), (399, 1), (400, 2), (900, 4)]);
        let n = bars(&t, BLACK.mix(1.0)).count();
        assert_eq!(n, 2);
        // Out-of-range buckets still count toward the totals.
        assert_eq!(t.total_samples(), 14);
        assert_eq!(t.overflow(), 86);
    }

    #[test]
    fn y_axis_covers_largest_bucket() {
        let a = thread(0, &[(1, 10)]);
        let b = thread(1, &[(2, 300)]);
        assert_eq!(y_top(&[&a, &b]), 600.0);
        assert_eq!(y_top(&[]), 2.0);
    }
}
