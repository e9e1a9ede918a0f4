//! Declarative chart description
//!
//! A [`ChartSpec`] owns the one date axis shared by every row. Traces carry only
//! their values, each vector index-aligned with `ChartSpec::dates`.

use chrono::NaiveDate;
use plotters::style::RGBColor;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<ChartRow>,
    pub width: u32,
    pub height: u32,
    /// Gap between rows as a fraction of the figure height
    pub vertical_spacing: f64,
    pub range_slider: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub title: String,
    /// Fraction of the plot height given to this row
    pub height_ratio: f64,
    pub traces: Vec<Trace>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Trace {
    Candlestick(CandlestickTrace),
    Line(LineTrace),
    Bar(BarTrace),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandlestickTrace {
    pub name: String,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

/// Line overlay; `None` values are drawn as gaps
#[derive(Debug, Clone, PartialEq)]
pub struct LineTrace {
    pub name: String,
    pub color: RGBColor,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarTrace {
    pub name: String,
    pub color: RGBColor,
    pub values: Vec<f64>,
}

impl Trace {
    pub fn name(&self) -> &str {
        match self {
            Trace::Candlestick(t) => &t.name,
            Trace::Line(t) => &t.name,
            Trace::Bar(t) => &t.name,
        }
    }

    /// Number of points in the trace
    pub fn len(&self) -> usize {
        match self {
            Trace::Candlestick(t) => t.close.len(),
            Trace::Line(t) => t.values.len(),
            Trace::Bar(t) => t.values.len(),
        }
    }
}

impl ChartSpec {
    pub fn trace_count(&self) -> usize {
        self.rows.iter().map(|r| r.traces.len()).sum()
    }

    /// Whether every trace has exactly one value per date on the shared axis
    pub fn is_aligned(&self) -> bool {
        self.rows
            .iter()
            .flat_map(|r| r.traces.iter())
            .all(|t| t.len() == self.dates.len())
    }
}
