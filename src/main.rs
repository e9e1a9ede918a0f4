use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod models;
mod services;

use api::yahoo::YahooClient;
use config::AppConfig;
use services::analysis_service::{run_analysis, AnalysisError};
use services::chart_service::PlottersRenderer;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing; stdout is reserved for operator messages
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stock_chart=info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            println!("Configuration Error: {}", e);
            return;
        }
    };

    println!("Downloading data for {} using alternative engine...", config.symbol);
    info!(
        "Fetching {} from {} to {}",
        config.symbol, config.start_date, config.end_date
    );

    let outcome = match YahooClient::new(&config.provider) {
        Ok(client) => {
            run_analysis(&config, &client, &PlottersRenderer::new(), |_| {
                println!("Success! Opening chart...");
            })
            .await
        }
        Err(e) => Err(AnalysisError::from(e)),
    };

    match outcome {
        Ok(spec) => {
            info!("Rendered {} with {} traces", spec.title, spec.trace_count());
        }
        Err(e) => {
            error!("Run failed: {:?}", e);
            println!("{}", e);
        }
    }
}
