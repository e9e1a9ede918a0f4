//! Daily price history models

use chrono::NaiveDate;

/// Parameters of a single history download
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// One trading day of OHLCV data. `adjclose` is the canonical close used downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjclose: f64,
    pub volume: f64,
}

/// Date-ordered, date-unique daily history for one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Normalize raw provider rows: keep only dates inside `start..=end`, sort
    /// ascending, and drop repeated dates (the first row for a date wins).
    pub fn from_bars(symbol: &str, mut bars: Vec<PriceBar>, start: NaiveDate, end: NaiveDate) -> Self {
        bars.retain(|b| b.date >= start && b.date <= end);
        // Stable sort keeps provider order among equal dates
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        Self {
            symbol: symbol.to_string(),
            bars,
        }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn adjclose(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.adjclose).collect()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}
