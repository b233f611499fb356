use chrono::{Datelike, NaiveDate};
use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::analysis::{
    self, AnalysisError, DEFAULT_PERIOD, HISTOGRAM_BINS, Period, Point, ROLLING_WINDOW,
};
use crate::models::rate::RateRecord;
use crate::utils::date::format_day;
use crate::utils::file::ensure_directory_exists;

const FONT: &str = "sans-serif";
const TIME_LABEL: &str = "Time";
const RATE_LABEL: &str = "Exchange rate";

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Chart generation error: {0}")]
    ChartGeneration(String),
    #[error("Invalid size format: {0}. Expected format: WIDTHxHEIGHT")]
    InvalidSizeFormat(String),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Figure-wide settings, built once before any chart is drawn.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub title_font_size: u32,
    pub label_font_size: u32,
    pub background: RGBColor,
    pub grid: RGBColor,
    pub line: RGBColor,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 2000,
            height: 1000,
            title_font_size: 30,
            label_font_size: 16,
            background: WHITE,
            grid: RGBColor(225, 225, 225),
            line: RGBColor(31, 119, 180),
        }
    }
}

impl ChartStyle {
    pub fn with_size(mut self, (width, height): (u32, u32)) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Title and axis descriptions of one chart.
#[derive(Debug, Clone)]
pub struct ChartText {
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
}

impl ChartText {
    fn new(title: &str, xlabel: &str, ylabel: &str) -> Self {
        Self {
            title: title.to_string(),
            xlabel: xlabel.to_string(),
            ylabel: ylabel.to_string(),
        }
    }
}

/// How the x axis is labelled.
#[derive(Debug, Clone, Copy)]
enum XAxis {
    /// Dates stored as days since the common era, `labels` ticks.
    Dates { labels: usize },
    Values,
}

pub struct ChartRenderer {
    style: ChartStyle,
    output_dir: PathBuf,
    prefix: String,
}

impl ChartRenderer {
    pub fn new(style: ChartStyle, output_dir: &Path, prefix: &str) -> anyhow::Result<Self> {
        ensure_directory_exists(output_dir)?;
        Ok(Self {
            style,
            output_dir: output_dir.to_path_buf(),
            prefix: prefix.to_string(),
        })
    }

    pub fn output_path(&self, index: usize, kind: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{:02}_{}.png", self.prefix, index, kind))
    }

    /// Draws the full chart set for `records` and returns the written files.
    pub fn render(&self, records: &[RateRecord], label: &str) -> Result<Vec<PathBuf>, ChartError> {
        if records.is_empty() {
            return Err(ChartError::ChartGeneration(
                "No rate data to plot".to_string(),
            ));
        }

        let daily = analysis::points(records);
        let monthly = analysis::resample_mean(&daily, Period::Month);
        let quarterly = analysis::resample_mean(&daily, Period::Quarter);
        let daily_ticks = analysis::tick_count(daily.len());
        let mut written = Vec::new();

        let path = self.output_path(1, "daily");
        self.plot_graph(
            &path,
            &daily,
            label,
            &ChartText::new("Exchange rate over time (Day)", TIME_LABEL, RATE_LABEL),
            daily_ticks,
        )?;
        written.push(path);

        let path = self.output_path(2, "monthly");
        self.plot_graph(
            &path,
            &monthly,
            label,
            &ChartText::new("Exchange rate over time (Month)", TIME_LABEL, RATE_LABEL),
            analysis::tick_count(monthly.len()),
        )?;
        written.push(path);

        let path = self.output_path(3, "quarterly");
        self.plot_graph(
            &path,
            &quarterly,
            label,
            &ChartText::new("Exchange rate over time (Quarter)", TIME_LABEL, RATE_LABEL),
            analysis::tick_count(quarterly.len()),
        )?;
        written.push(path);

        let path = self.output_path(4, "decomposition");
        match self.plot_decompose(&path, &daily, daily_ticks) {
            Ok(()) => written.push(path),
            Err(ChartError::Analysis(e @ AnalysisError::InsufficientData { .. })) => {
                warn!(error = %e, "skipping seasonal decomposition");
                println!("  ⚠️ Seasonal decomposition skipped: {}", e);
            }
            Err(e) => return Err(e),
        }

        let path = self.output_path(5, "changes");
        self.plot_graph(
            &path,
            &analysis::day_over_day(&daily),
            label,
            &ChartText::new(
                "Exchange rate change over time (Day)",
                TIME_LABEL,
                RATE_LABEL,
            ),
            daily_ticks,
        )?;
        written.push(path);

        let path = self.output_path(6, "histogram");
        self.plot_histogram(
            &path,
            records,
            "Histogram approximation",
            &ChartText::new(
                "Equal-width histogram of exchange rate (Day)",
                RATE_LABEL,
                "Occurrences in interval",
            ),
        )?;
        written.push(path);

        let path = self.output_path(7, "rolling_std");
        self.plot_graph(
            &path,
            &analysis::rolling_std(&daily, ROLLING_WINDOW)?,
            label,
            &ChartText::new(
                "Standard deviation of exchange rate, 5-day window (Day)",
                TIME_LABEL,
                "Standard deviation",
            ),
            daily_ticks,
        )?;
        written.push(path);

        info!(count = written.len(), dir = %self.output_dir.display(), "charts rendered");
        Ok(written)
    }

    fn root<'a>(&self, path: &'a Path) -> Result<DrawingArea<BitMapBackend<'a>, Shift>, ChartError> {
        let root = BitMapBackend::new(path, (self.style.width, self.style.height))
            .into_drawing_area();
        root.fill(&self.style.background)
            .map_err(|e| generation_error("Failed to fill background", e))?;
        Ok(root)
    }

    /// Line chart of a dated series.
    fn plot_graph(
        &self,
        path: &Path,
        series: &[Point],
        label: &str,
        text: &ChartText,
        ticks: usize,
    ) -> Result<(), ChartError> {
        let root = self.root(path)?;
        let data: Vec<(f64, f64)> = series.iter().map(|(d, v)| (date_coord(*d), *v)).collect();

        let mut chart = self.build_chart(&root, &data)?;
        draw_line(&mut chart, &data, self.style.line, 1, Some(label))?;
        finish_chart(&root, &mut chart, text, &self.style, XAxis::Dates { labels: ticks }, true)?;

        present(&root)
    }

    /// Observed, trend, seasonal and residual panels stacked vertically.
    fn plot_decompose(&self, path: &Path, series: &[Point], ticks: usize) -> Result<(), ChartError> {
        let values: Vec<f64> = series.iter().map(|p| p.1).collect();
        let decomposition = analysis::seasonal_decompose(&values, DEFAULT_PERIOD)?;
        let xs: Vec<f64> = series.iter().map(|p| date_coord(p.0)).collect();

        let root = self.root(path)?;
        let panels = root.split_evenly((4, 1));
        let components = [
            ("Observed", &decomposition.observed, false),
            ("Trend", &decomposition.trend, false),
            ("Seasonal", &decomposition.seasonal, false),
            ("Resid", &decomposition.resid, true),
        ];

        for (panel, (name, component, scatter)) in panels.iter().zip(components) {
            let data: Vec<(f64, f64)> = xs.iter().copied().zip(component.iter().copied()).collect();
            let mut chart = self.build_chart(panel, &data)?;
            if scatter {
                chart
                    .draw_series(
                        data.iter()
                            .filter(|(_, y)| y.is_finite())
                            .map(|&(x, y)| Circle::new((x, y), 2, self.style.line.filled())),
                    )
                    .map_err(|e| generation_error("Failed to draw residuals", e))?;
            } else {
                draw_line(&mut chart, &data, self.style.line, 1, None)?;
            }
            let text = ChartText::new("", "", name);
            finish_chart(panel, &mut chart, &text, &self.style, XAxis::Dates { labels: ticks }, false)?;
        }

        draw_title(
            &root,
            &format!("Seasonal decomposition (period {})", decomposition.period),
            &self.style,
        )?;
        present(&root)
    }

    /// Equal-width histogram with a line through bin right edges and counts.
    fn plot_histogram(
        &self,
        path: &Path,
        records: &[RateRecord],
        label: &str,
        text: &ChartText,
    ) -> Result<(), ChartError> {
        let values: Vec<f64> = records.iter().map(|r| r.official_rate).collect();
        let hist = analysis::histogram(&values, HISTOGRAM_BINS)?;
        let first = hist.edges[0];
        let last = hist.edges[hist.edges.len() - 1];
        let top = (hist.max_count().max(1) as f64) * 1.1;

        let root = self.root(path)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .margin_top(70)
            .x_label_area_size(80)
            .y_label_area_size(90)
            .build_cartesian_2d(first..last, 0.0..top)
            .map_err(|e| generation_error("Failed to build chart", e))?;

        let bar_color = self.style.line;
        chart
            .draw_series(hist.counts.iter().enumerate().map(|(i, count)| {
                Rectangle::new(
                    [(hist.edges[i], 0.0), (hist.edges[i + 1], *count as f64)],
                    bar_color.mix(0.6).filled(),
                )
            }))
            .map_err(|e| generation_error("Failed to draw histogram bars", e))?
            .label("Histogram")
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 20, y + 6)], bar_color.filled()));

        draw_line(&mut chart, &hist.right_edge_points(), RED, 5, Some(label))?;
        finish_chart(&root, &mut chart, text, &self.style, XAxis::Values, true)?;

        present(&root)
    }

    fn build_chart<'a, DB: DrawingBackend + 'a>(
        &self,
        area: &'a DrawingArea<DB, Shift>,
        data: &[(f64, f64)],
    ) -> Result<Chart<'a, DB>, ChartError> {
        let (x_min, x_max) = padded_range(data.iter().map(|p| p.0), 0.0, 1.0);
        let (y_min, y_max) = padded_range(data.iter().map(|p| p.1), 0.1, 0.5);

        ChartBuilder::on(area)
            .margin(20)
            .margin_top(70)
            .x_label_area_size(100)
            .y_label_area_size(90)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(|e| generation_error("Failed to build chart", e))
    }
}

/// Title, axis labels, grid and legend shared by every chart. Called after the
/// chart's own content has been drawn.
fn finish_chart<'a, DB: DrawingBackend + 'a>(
    area: &DrawingArea<DB, Shift>,
    chart: &mut Chart<'a, DB>,
    text: &ChartText,
    style: &ChartStyle,
    x_axis: XAxis,
    legend: bool,
) -> Result<(), ChartError> {
    let date_formatter = |x: &f64| coord_date(*x).map(format_day).unwrap_or_default();
    let value_formatter = |x: &f64| format!("{:.4}", x);

    let mut mesh = chart.configure_mesh();
    mesh.light_line_style(style.grid)
        .bold_line_style(style.grid)
        .x_desc(text.xlabel.as_str())
        .y_desc(text.ylabel.as_str())
        .label_style((FONT, style.label_font_size));
    match x_axis {
        XAxis::Dates { labels } => {
            mesh.x_labels(labels.max(2))
                .x_label_formatter(&date_formatter)
                .x_label_style(
                    (FONT, style.label_font_size)
                        .into_font()
                        .transform(FontTransform::Rotate90),
                );
        }
        XAxis::Values => {
            mesh.x_label_formatter(&value_formatter);
        }
    }
    mesh.draw()
        .map_err(|e| generation_error("Failed to configure mesh", e))?;

    if legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .margin(10)
            .label_font((FONT, style.label_font_size))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| generation_error("Failed to draw legend", e))?;
    }

    if !text.title.is_empty() {
        draw_title(area, &text.title, style)?;
    }
    Ok(())
}

fn draw_title<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    style: &ChartStyle,
) -> Result<(), ChartError> {
    let (width, _) = area.dim_in_pixel();
    let font = TextStyle::from((FONT, style.title_font_size).into_font())
        .pos(Pos::new(HPos::Center, VPos::Top));
    area.draw(&Text::new(title.to_string(), ((width / 2) as i32, 15), font))
        .map_err(|e| generation_error("Failed to draw title", e))
}

/// Draws `data` as a line, broken wherever a value is not finite. Only the
/// first segment carries the legend entry.
fn draw_line<'a, DB: DrawingBackend + 'a>(
    chart: &mut Chart<'a, DB>,
    data: &[(f64, f64)],
    color: RGBColor,
    width: u32,
    label: Option<&str>,
) -> Result<(), ChartError> {
    for (i, segment) in finite_segments(data).into_iter().enumerate() {
        let anno = chart
            .draw_series(LineSeries::new(segment, color.stroke_width(width)))
            .map_err(|e| generation_error("Failed to draw series", e))?;
        if let (0, Some(label)) = (i, label) {
            anno.label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width)));
        }
    }
    Ok(())
}

fn finite_segments(data: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for &(x, y) in data {
        if y.is_finite() {
            current.push((x, y));
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Axis range over the finite values, widened by `padding` of the span and
/// by `fallback` on each side when the span is empty.
fn padded_range(values: impl Iterator<Item = f64>, padding: f64, fallback: f64) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return (0.0, 1.0);
    }
    let span = max - min;
    if span == 0.0 {
        return (min - fallback, max + fallback);
    }
    (min - span * padding, max + span * padding)
}

fn date_coord(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn coord_date(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

fn present<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>) -> Result<(), ChartError> {
    root.present()
        .map_err(|e| generation_error("Failed to present chart", e))
}

fn generation_error(context: &str, e: impl std::fmt::Display) -> ChartError {
    ChartError::ChartGeneration(format!("{}: {}", context, e))
}

pub fn parse_size(size_str: &str) -> Result<(u32, u32), ChartError> {
    let parts: Vec<&str> = size_str.split('x').collect();
    if parts.len() != 2 {
        return Err(ChartError::InvalidSizeFormat(size_str.to_string()));
    }

    let width = parts[0]
        .parse::<u32>()
        .map_err(|_| ChartError::InvalidSizeFormat(size_str.to_string()))?;
    let height = parts[1]
        .parse::<u32>()
        .map_err(|_| ChartError::InvalidSizeFormat(size_str.to_string()))?;

    if width == 0 || height == 0 {
        return Err(ChartError::InvalidSizeFormat(size_str.to_string()));
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests;
