use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::PriceBar;

/// Top-level body of GET /v8/finance/chart/{symbol}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartBody {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ErrorResponse>,
}

/// Error object returned by the chart endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: Option<String>,
    pub currency: Option<String>,
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    pub gmtoffset: i64,
    pub exchange_timezone_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteColumns>,
    pub adjclose: Option<Vec<AdjCloseColumn>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteColumns {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjCloseColumn {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

/// Error type for provider operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// 400 Bad Request
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// 401 / 403, usually the provider refusing scripted clients
    #[error("Unauthorized ({0}): {1}")]
    Unauthorized(u16, String),
    /// 404 Not Found
    #[error("Not Found: {0}")]
    NotFound(String),
    /// 429 Too Many Requests
    #[error("Too Many Requests: {0}")]
    RateLimited(String),
    /// 5xx Server Error
    #[error("Server Error ({0}): {1}")]
    ServerError(u16, String),
    /// Other HTTP errors
    #[error("HTTP Error ({0}): {1}")]
    HttpError(u16, String),
    /// Error object reported inside a 200 body
    #[error("{code}: {description}")]
    Provider { code: String, description: String },
    /// Network/request error
    #[error("Request Error: {0}")]
    RequestError(String),
    /// Deserialization error
    #[error("Deserialization Error: {0}")]
    DeserializationError(String),
    /// A required column was absent from an otherwise valid response
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

impl From<ErrorResponse> for ApiError {
    fn from(err: ErrorResponse) -> Self {
        ApiError::Provider {
            code: err.code.unwrap_or_else(|| "Error".to_string()),
            description: err.description.unwrap_or_default(),
        }
    }
}

impl ChartResult {
    /// Zip the column-oriented response into rows.
    ///
    /// Rows missing any price are skipped; a missing volume counts as zero.
    pub fn into_bars(self) -> Result<Vec<PriceBar>, ApiError> {
        let adjclose = self
            .indicators
            .adjclose
            .and_then(|cols| cols.into_iter().next())
            .ok_or(ApiError::MissingField("adjclose"))?
            .adjclose;
        let quote = self.indicators.quote.into_iter().next().unwrap_or_default();
        let offset = self.meta.gmtoffset;

        let bars = self
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                Some(PriceBar {
                    date: trading_date(ts, offset)?,
                    open: column_value(&quote.open, i)?,
                    high: column_value(&quote.high, i)?,
                    low: column_value(&quote.low, i)?,
                    close: column_value(&quote.close, i)?,
                    adjclose: column_value(&adjclose, i)?,
                    volume: column_value(&quote.volume, i).unwrap_or(0.0),
                })
            })
            .collect();

        Ok(bars)
    }
}

fn column_value(column: &[Option<f64>], index: usize) -> Option<f64> {
    column.get(index).copied().flatten().filter(|v| v.is_finite())
}

/// Calendar date at the exchange for a UTC epoch timestamp
fn trading_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}

/// Parse a chart endpoint body into daily bars.
///
/// An envelope without a result or without timestamps is an empty history, not
/// an error. The caller decides what an empty history means.
pub fn parse_chart_body(body: &str) -> Result<Vec<PriceBar>, ApiError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| ApiError::DeserializationError(format!("Failed to parse response: {}", e)))?;

    if let Some(err) = envelope.chart.error {
        return Err(err.into());
    }

    match envelope.chart.result.and_then(|r| r.into_iter().next()) {
        Some(result) => {
            debug!(
                symbol = result.meta.symbol.as_deref().unwrap_or("?"),
                currency = result.meta.currency.as_deref().unwrap_or("?"),
                timezone = result.meta.exchange_timezone_name.as_deref().unwrap_or("?"),
                rows = result.timestamp.len(),
                "Parsed chart response"
            );
            if result.timestamp.is_empty() {
                Ok(Vec::new())
            } else {
                result.into_bars()
            }
        }
        None => Ok(Vec::new()),
    }
}
