use thiserror::Error;
use tracing::info;

use crate::api::yahoo::ApiError;
use crate::config::AppConfig;
use crate::models::ChartSpec;
use crate::services::chart_service::{build_chart_spec, ChartError, ChartRenderer};
use crate::services::history_service::{fetch_price_series, HistoryProvider};
use crate::services::indicator_service::compute_indicators;

/// Everything that can stop a run, already phrased for the operator
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// The provider answered but had no usable adjusted history
    #[error("Still blocked by Yahoo. Please try again in 15 minutes.")]
    DataUnavailable,
    #[error("Connection Error: {0}")]
    Connection(String),
}

impl From<ApiError> for AnalysisError {
    fn from(err: ApiError) -> Self {
        AnalysisError::Connection(err.to_string())
    }
}

impl From<ChartError> for AnalysisError {
    fn from(err: ChartError) -> Self {
        AnalysisError::Connection(err.to_string())
    }
}

/// Fetch, derive the moving averages, assemble the figure and render it.
///
/// `on_ready` runs once the chart is assembled and before the renderer takes it.
/// Returns the chart that was handed to the renderer. Stops at the first failure;
/// nothing after a failed step runs.
pub async fn run_analysis<P, R, F>(
    config: &AppConfig,
    provider: &P,
    renderer: &R,
    on_ready: F,
) -> Result<ChartSpec, AnalysisError>
where
    P: HistoryProvider,
    R: ChartRenderer,
    F: FnOnce(&ChartSpec),
{
    let series = fetch_price_series(provider, config).await?;

    let indicators = compute_indicators(&series);
    info!(
        "Computed MA50 ({} points) and MA200 ({} points)",
        indicators.ma50.iter().flatten().count(),
        indicators.ma200.iter().flatten().count()
    );

    let spec = build_chart_spec(&series, &indicators, &config.chart);
    on_ready(&spec);
    renderer.render(&spec)?;

    Ok(spec)
}
