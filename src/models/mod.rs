//! Data models for the chart pipeline
//!
//! Typed records flow forward only: price bars from the provider, indicator
//! columns derived from them, and the declarative chart built from both.

pub mod price;
pub mod indicator;
pub mod chart;

// Re-export commonly used types for convenience
pub use price::{HistoryRequest, PriceBar, PriceSeries};
pub use indicator::IndicatorSet;
pub use chart::{BarTrace, CandlestickTrace, ChartRow, ChartSpec, LineTrace, Trace};
