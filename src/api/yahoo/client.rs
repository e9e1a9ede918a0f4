use chrono::{Days, NaiveDate, NaiveTime};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use super::models::{parse_chart_body, ApiError, ChartEnvelope};
use crate::config::ProviderOptions;
use crate::models::{HistoryRequest, PriceBar};
use crate::services::history_service::HistoryProvider;

/// The chart endpoint rejects requests that do not look like a browser
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Yahoo Finance chart API client for daily OHLCV history
pub struct YahooClient {
    http_client: HttpClient,
    base_url: String,
}

impl YahooClient {
    /// Create a client from the provider options
    pub fn new(options: &ProviderOptions) -> Result<Self, ApiError> {
        let http_client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| ApiError::RequestError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn create_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Pull the provider's own description out of an error body when it has one
    fn error_description(body_text: &str) -> String {
        serde_json::from_str::<ChartEnvelope>(body_text)
            .ok()
            .and_then(|env| env.chart.error)
            .and_then(|err| err.description)
            .unwrap_or_else(|| body_text.trim().to_string())
    }

    /// Parse error response based on HTTP status code
    async fn handle_error_response(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ApiError {
        let status_code = status.as_u16();
        let body_text = response.text().await.unwrap_or_default();
        let message = Self::error_description(&body_text);

        match status_code {
            400 => ApiError::BadRequest(message),
            401 | 403 => ApiError::Unauthorized(status_code, message),
            404 => ApiError::NotFound(message),
            429 => {
                warn!("Rate limited by Yahoo: {}", message);
                ApiError::RateLimited(message)
            }
            500..=599 => {
                warn!("Server error {}: {}", status_code, message);
                ApiError::ServerError(status_code, message)
            }
            _ => ApiError::HttpError(status_code, message),
        }
    }

    /// GET /v8/finance/chart/{symbol}
    ///
    /// Retrieves daily bars covering `start_date` to `end_date`. The window is
    /// widened by a day on each side; callers clip to the exact range.
    pub async fn get_daily_history(&self, request: &HistoryRequest) -> Result<Vec<PriceBar>, ApiError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, request.symbol);
        let (period1, period2) = query_window(request);

        debug!(%url, period1, period2, "Requesting daily history");

        let response = self
            .http_client
            .get(&url)
            .headers(Self::create_headers())
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,split".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::RequestError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::RequestError(format!("Failed to read response: {}", e)))?;

        let bars = parse_chart_body(&body)?;
        debug!("Received {} daily bars for {}", bars.len(), request.symbol);
        Ok(bars)
    }
}

impl HistoryProvider for YahooClient {
    async fn daily_history(&self, request: &HistoryRequest) -> Result<Vec<PriceBar>, ApiError> {
        self.get_daily_history(request).await
    }
}

/// `period1`/`period2` for a request.
///
/// Sessions east of UTC open before UTC midnight of their trading date, so the
/// lower bound starts a day early. `period2` is exclusive, so the upper bound is
/// the midnight after `end_date`.
fn query_window(request: &HistoryRequest) -> (i64, i64) {
    let from = request
        .start_date
        .checked_sub_days(Days::new(1))
        .unwrap_or(request.start_date);
    let to = request
        .end_date
        .checked_add_days(Days::new(1))
        .unwrap_or(request.end_date);
    (epoch_seconds(from), epoch_seconds(to))
}

fn epoch_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_seconds() {
        let date = NaiveDate::from_ymd_opt(2016, 6, 1).unwrap();
        assert_eq!(epoch_seconds(date), 1_464_739_200);
    }

    #[test]
    fn test_query_window_covers_sessions_east_of_utc() {
        let request = HistoryRequest {
            symbol: "CBA.AX".to_string(),
            start_date: NaiveDate::from_ymd_opt(2016, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2017, 6, 1).unwrap(),
        };
        let (period1, period2) = query_window(&request);

        // An ASX open at 23:00 UTC on the previous calendar day is inside the window
        let asx_open = epoch_seconds(request.start_date) - 3_600;
        assert!(period1 <= asx_open);
        assert_eq!(period1, epoch_seconds(NaiveDate::from_ymd_opt(2016, 5, 31).unwrap()));
        assert_eq!(period2, epoch_seconds(NaiveDate::from_ymd_opt(2017, 6, 2).unwrap()));
    }

    #[test]
    fn test_error_description_prefers_provider_text() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert_eq!(
            YahooClient::error_description(body),
            "No data found, symbol may be delisted"
        );
    }

    #[test]
    fn test_error_description_falls_back_to_body() {
        assert_eq!(YahooClient::error_description("  Too Many Requests\n"), "Too Many Requests");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let options = ProviderOptions {
            base_url: "http://localhost:9000/".to_string(),
            ..ProviderOptions::default()
        };
        let client = YahooClient::new(&options).unwrap();
        assert_eq!(client.base_url, "http://localhost:9000");
    }
}
