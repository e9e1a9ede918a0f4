use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{Days, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ChartOptions;
use crate::models::{
    BarTrace, CandlestickTrace, ChartRow, ChartSpec, IndicatorSet, LineTrace, PriceSeries, Trace,
};

const MA50_COLOR: RGBColor = RGBColor(128, 128, 128);
const MA200_COLOR: RGBColor = RGBColor(255, 165, 0);
const VOLUME_COLOR: RGBColor = RGBColor(255, 0, 0);
const GAIN_COLOR: RGBColor = RGBColor(38, 166, 91);
const LOSS_COLOR: RGBColor = RGBColor(220, 53, 69);

pub const PRICE_ROW_RATIO: f64 = 0.7;
pub const VOLUME_ROW_RATIO: f64 = 0.3;

#[derive(Debug, Error, PartialEq)]
pub enum ChartError {
    #[error("Cannot draw a chart without data")]
    EmptySeries,
    #[error("Trace '{0}' is not aligned with the date axis")]
    Misaligned(String),
    #[error("{0}")]
    Render(String),
    #[error("Failed to open chart viewer: {0}")]
    Display(String),
}

/// Consumes a finished chart description and shows it
pub trait ChartRenderer {
    fn render(&self, spec: &ChartSpec) -> Result<(), ChartError>;
}

/// Assemble the two-row figure: candlesticks with MA50/MA200 over volume bars,
/// all sharing the series' date index.
pub fn build_chart_spec(series: &PriceSeries, indicators: &IndicatorSet, options: &ChartOptions) -> ChartSpec {
    let bars = series.bars();

    let candles = CandlestickTrace {
        name: "OHLC".to_string(),
        open: bars.iter().map(|b| b.open).collect(),
        high: bars.iter().map(|b| b.high).collect(),
        low: bars.iter().map(|b| b.low).collect(),
        close: bars.iter().map(|b| b.adjclose).collect(),
    };

    let price_row = ChartRow {
        title: "Price".to_string(),
        height_ratio: PRICE_ROW_RATIO,
        traces: vec![
            Trace::Candlestick(candles),
            Trace::Line(LineTrace {
                name: "MA50".to_string(),
                color: MA50_COLOR,
                values: indicators.ma50.clone(),
            }),
            Trace::Line(LineTrace {
                name: "MA200".to_string(),
                color: MA200_COLOR,
                values: indicators.ma200.clone(),
            }),
        ],
    };

    let volume_row = ChartRow {
        title: "Volume".to_string(),
        height_ratio: VOLUME_ROW_RATIO,
        traces: vec![Trace::Bar(BarTrace {
            name: "Volume".to_string(),
            color: VOLUME_COLOR,
            values: bars.iter().map(|b| b.volume).collect(),
        })],
    };

    let spec = ChartSpec {
        title: format!("{} Daily Price", series.symbol),
        dates: series.dates(),
        rows: vec![price_row, volume_row],
        width: options.width,
        height: options.height,
        vertical_spacing: 0.1,
        range_slider: false,
    };

    debug_assert!(spec.is_aligned());
    debug!(
        "Built chart with {} traces over {} dates",
        spec.trace_count(),
        spec.dates.len()
    );
    spec
}

/// Draws with plotters into a PNG and hands it to the desktop image viewer
pub struct PlottersRenderer {
    output_dir: PathBuf,
}

impl PlottersRenderer {
    pub fn new() -> Self {
        Self {
            output_dir: std::env::temp_dir(),
        }
    }

    /// One hand-off file per chart title, overwritten on every run
    fn image_path(&self, spec: &ChartSpec) -> PathBuf {
        let stem: String = spec
            .title
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        self.output_dir.join(format!("stock_chart_{}.png", stem))
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(&self, spec: &ChartSpec) -> Result<(), ChartError> {
        let path = self.image_path(spec);

        {
            let root = BitMapBackend::new(&path, (spec.width, spec.height)).into_drawing_area();
            draw_chart(&root, spec)?;
            root.present()
                .map_err(|e| ChartError::Render(format!("Failed to render chart: {}", e)))?;
        }

        info!("Chart image written to {}", path.display());
        open_in_viewer(&path).map_err(|e| ChartError::Display(e.to_string()))
    }
}

/// Draw the whole figure onto any plotters backend
pub fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
) -> Result<(), ChartError> {
    if spec.dates.is_empty() || spec.rows.is_empty() {
        return Err(ChartError::EmptySeries);
    }
    if let Some(trace) = spec
        .rows
        .iter()
        .flat_map(|r| r.traces.iter())
        .find(|t| t.len() != spec.dates.len())
    {
        return Err(ChartError::Misaligned(trace.name().to_string()));
    }

    root.fill(&WHITE)
        .map_err(|e| ChartError::Render(format!("Failed to fill canvas: {}", e)))?;
    let body = root
        .titled(&spec.title, ("sans-serif", 30).into_font())
        .map_err(|e| ChartError::Render(format!("Failed to draw title: {}", e)))?;

    let (_, body_height) = body.dim_in_pixel();
    let gaps = spec.rows.len().saturating_sub(1) as f64;
    let spacing = body_height as f64 * spec.vertical_spacing;
    let usable = body_height as f64 - spacing * gaps;

    // Peel rows off the top; the last row takes whatever remains
    let mut remaining = body;
    let last = spec.rows.len() - 1;
    for (i, row) in spec.rows.iter().enumerate() {
        let is_last = i == last;
        let area = if is_last {
            remaining.clone()
        } else {
            let split_at = (usable * row.height_ratio + spacing / 2.0) as i32;
            let (upper, lower) = remaining.split_vertically(split_at);
            remaining = lower;
            upper
        };
        draw_row(&area, row, &spec.dates, is_last)?;
    }

    Ok(())
}

fn draw_row<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    row: &ChartRow,
    dates: &[NaiveDate],
    show_dates: bool,
) -> Result<(), ChartError> {
    let (x_min, x_max) = date_bounds(dates)?;
    let (y_min, y_max) = value_bounds(row);

    let mut chart = ChartBuilder::on(area)
        .caption(&row.title, ("sans-serif", 22).into_font())
        .margin(10)
        .x_label_area_size(if show_dates { 35 } else { 0 })
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| ChartError::Render(format!("Failed to build chart: {}", e)))?;

    chart
        .configure_mesh()
        .x_labels(if show_dates { 10 } else { 0 })
        .x_label_formatter(&|d: &NaiveDate| d.format("%Y-%m-%d").to_string())
        .y_labels(6)
        .y_label_formatter(&|v: &f64| format_axis_value(*v))
        .light_line_style(RGBColor(235, 235, 235))
        .draw()
        .map_err(|e| ChartError::Render(format!("Failed to draw mesh: {}", e)))?;

    let (plot_width, _) = chart.plotting_area().dim_in_pixel();
    let slot = (plot_width as f64 / dates.len() as f64 * 0.7).max(1.0) as u32;

    for trace in &row.traces {
        match trace {
            Trace::Candlestick(t) => {
                chart
                    .draw_series(dates.iter().enumerate().map(|(i, d)| {
                        CandleStick::new(
                            *d,
                            t.open[i],
                            t.high[i],
                            t.low[i],
                            t.close[i],
                            GAIN_COLOR.filled(),
                            LOSS_COLOR.filled(),
                            slot,
                        )
                    }))
                    .map_err(|e| ChartError::Render(format!("Failed to draw candles: {}", e)))?
                    .label(t.name.as_str())
                    .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], GAIN_COLOR.filled()));
            }
            Trace::Line(t) => {
                let color = t.color;
                for (k, segment) in defined_segments(dates, &t.values).into_iter().enumerate() {
                    let series = chart
                        .draw_series(LineSeries::new(segment, color.stroke_width(2)))
                        .map_err(|e| ChartError::Render(format!("Failed to draw {}: {}", t.name, e)))?;
                    if k == 0 {
                        series
                            .label(t.name.as_str())
                            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
                    }
                }
            }
            Trace::Bar(t) => {
                let color = t.color;
                chart
                    .draw_series(dates.iter().zip(t.values.iter()).map(|(d, v)| {
                        let mut bar = Rectangle::new([(*d, 0.0), (*d + Days::new(1), *v)], color.filled());
                        bar.set_margin(0, 0, 1, 1);
                        bar
                    }))
                    .map_err(|e| ChartError::Render(format!("Failed to draw {}: {}", t.name, e)))?
                    .label(t.name.as_str())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| ChartError::Render(format!("Failed to draw legend: {}", e)))?;

    Ok(())
}

/// Split a gappy line into runs of consecutive defined points
pub fn defined_segments(dates: &[NaiveDate], values: &[Option<f64>]) -> Vec<Vec<(NaiveDate, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();

    for (date, value) in dates.iter().zip(values.iter()) {
        match value {
            Some(v) => current.push((*date, *v)),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn date_bounds(dates: &[NaiveDate]) -> Result<(NaiveDate, NaiveDate), ChartError> {
    let first = dates.first().ok_or(ChartError::EmptySeries)?;
    let last = dates.last().ok_or(ChartError::EmptySeries)?;
    Ok((*first - Days::new(1), *last + Days::new(2)))
}

/// Vertical extent of everything drawn in a row, padded by 5%
fn value_bounds(row: &ChartRow) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut has_bars = false;

    for trace in &row.traces {
        let values: Box<dyn Iterator<Item = f64> + '_> = match trace {
            // Adjusted closes can sit outside the unadjusted low/high
            Trace::Candlestick(t) => Box::new(
                t.low
                    .iter()
                    .chain(t.high.iter())
                    .chain(t.open.iter())
                    .chain(t.close.iter())
                    .copied(),
            ),
            Trace::Line(t) => Box::new(t.values.iter().flatten().copied()),
            Trace::Bar(t) => {
                has_bars = true;
                Box::new(t.values.iter().copied())
            }
        };
        for v in values {
            min = min.min(v);
            max = max.max(v);
        }
    }

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if has_bars {
        min = min.min(0.0);
    }

    let padding = ((max - min) * 0.05).max(1e-8);
    let lower = if has_bars { min } else { min - padding };
    (lower, max + padding)
}

fn format_axis_value(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", v / 1e3)
    } else {
        format!("{:.2}", v)
    }
}

fn open_in_viewer(path: &Path) -> std::io::Result<()> {
    viewer_command(path).spawn().map(|_| ())
}

#[cfg(target_os = "macos")]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(target_os = "windows")]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}
