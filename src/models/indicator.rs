//! Derived indicator columns

/// Moving averages aligned index-for-index with a [`PriceSeries`](super::PriceSeries).
/// `None` marks a position where the trailing window is not yet full.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub ma50: Vec<Option<f64>>,
    pub ma200: Vec<Option<f64>>,
}
