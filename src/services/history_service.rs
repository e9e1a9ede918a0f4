use tracing::{info, warn};

use crate::api::yahoo::ApiError;
use crate::config::AppConfig;
use crate::models::{HistoryRequest, PriceBar, PriceSeries};
use crate::services::analysis_service::AnalysisError;

/// Source of daily OHLCV history
pub trait HistoryProvider {
    async fn daily_history(&self, request: &HistoryRequest) -> Result<Vec<PriceBar>, ApiError>;
}

/// Download and normalize the configured symbol's history.
///
/// A response without adjusted closes or with no rows in range means the provider
/// is degraded and maps to [`AnalysisError::DataUnavailable`]. Any other provider
/// failure is passed through as a connection error.
pub async fn fetch_price_series<P: HistoryProvider>(
    provider: &P,
    config: &AppConfig,
) -> Result<PriceSeries, AnalysisError> {
    let request = HistoryRequest {
        symbol: config.symbol.clone(),
        start_date: config.start_date,
        end_date: config.end_date,
    };

    let bars = match provider.daily_history(&request).await {
        Ok(bars) => bars,
        Err(ApiError::MissingField(field)) => {
            warn!("Response for {} has no '{}' column", request.symbol, field);
            return Err(AnalysisError::DataUnavailable);
        }
        Err(e) => return Err(e.into()),
    };

    let raw_rows = bars.len();
    let series = PriceSeries::from_bars(&request.symbol, bars, request.start_date, request.end_date);

    if series.is_empty() {
        warn!("No rows for {} between {} and {}", request.symbol, request.start_date, request.end_date);
        return Err(AnalysisError::DataUnavailable);
    }

    info!(
        "Loaded {} trading days for {} ({} raw rows)",
        series.len(),
        series.symbol,
        raw_rows
    );
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        info!(
            "{} .. {}: close {:.2} -> {:.2}, adjusted {:.2} -> {:.2}",
            first.date, last.date, first.close, last.close, first.adjclose, last.adjclose
        );
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct StubProvider {
        result: Result<Vec<PriceBar>, ApiError>,
    }

    impl HistoryProvider for StubProvider {
        async fn daily_history(&self, _request: &HistoryRequest) -> Result<Vec<PriceBar>, ApiError> {
            self.result.clone()
        }
    }

    fn bar(date: NaiveDate) -> PriceBar {
        PriceBar {
            date,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            adjclose: 1.0,
            volume: 10.0,
        }
    }

    #[tokio::test]
    async fn test_fetch_normalizes_rows() {
        let config = AppConfig::default();
        let inside = config.start_date;
        let outside = config.end_date.succ_opt().unwrap();
        let provider = StubProvider {
            result: Ok(vec![bar(outside), bar(inside), bar(inside)]),
        };

        let series = fetch_price_series(&provider, &config).await.unwrap();
        assert_eq!(series.dates(), vec![inside]);
    }

    #[tokio::test]
    async fn test_empty_history_is_unavailable() {
        let provider = StubProvider { result: Ok(Vec::new()) };
        let err = fetch_price_series(&provider, &AppConfig::default()).await.unwrap_err();
        assert_eq!(err, AnalysisError::DataUnavailable);
    }

    #[tokio::test]
    async fn test_rows_outside_range_only_is_unavailable() {
        let config = AppConfig::default();
        let provider = StubProvider {
            result: Ok(vec![bar(config.start_date.pred_opt().unwrap())]),
        };
        let err = fetch_price_series(&provider, &config).await.unwrap_err();
        assert_eq!(err, AnalysisError::DataUnavailable);
    }

    #[tokio::test]
    async fn test_missing_adjclose_is_unavailable() {
        let provider = StubProvider {
            result: Err(ApiError::MissingField("adjclose")),
        };
        let err = fetch_price_series(&provider, &AppConfig::default()).await.unwrap_err();
        assert_eq!(err, AnalysisError::DataUnavailable);
    }

    #[tokio::test]
    async fn test_transport_error_is_connection_error() {
        let provider = StubProvider {
            result: Err(ApiError::RequestError("Request failed: dns error".to_string())),
        };
        let err = fetch_price_series(&provider, &AppConfig::default()).await.unwrap_err();
        assert_eq!(
            err,
            AnalysisError::Connection("Request Error: Request failed: dns error".to_string())
        );
    }
}
