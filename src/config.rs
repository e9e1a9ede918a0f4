//! Run configuration
//!
//! Everything the pipeline needs is fixed once at startup and passed down by
//! reference. The defaults reproduce the original one-shot run; a `.env` file or
//! environment variables may override them.

use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_SYMBOL: &str = "CBA.AX";
pub const DEFAULT_START_DATE: NaiveDate = calendar_date(2016, 6, 1);
pub const DEFAULT_END_DATE: NaiveDate = calendar_date(2017, 6, 1);
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date constant checked at compile time
const fn calendar_date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid calendar date"),
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid date '{value}' for {key}, expected YYYY-MM-DD")]
    InvalidDate { key: &'static str, value: String },
    #[error("Symbol cannot be empty")]
    EmptySymbol,
    #[error("Start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Size of the rendered figure in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOptions {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub chart: ChartOptions,
    pub provider: ProviderOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            start_date: DEFAULT_START_DATE,
            end_date: DEFAULT_END_DATE,
            chart: ChartOptions::default(),
            provider: ProviderOptions::default(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from the defaults plus any overrides found in
    /// `.env` or the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(symbol) = lookup("STOCK_CHART_SYMBOL") {
            config.symbol = symbol.trim().to_uppercase();
        }
        if let Some(start) = lookup("STOCK_CHART_START") {
            config.start_date = parse_date("STOCK_CHART_START", &start)?;
        }
        if let Some(end) = lookup("STOCK_CHART_END") {
            config.end_date = parse_date("STOCK_CHART_END", &end)?;
        }
        if let Some(base_url) = lookup("STOCK_CHART_BASE_URL") {
            config.provider.base_url = base_url.trim_end_matches('/').to_string();
        }

        config.validate()?;
        debug!(?config, "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.start_date > self.end_date {
            return Err(ConfigError::InvalidRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }
}

fn parse_date(key: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ConfigError::InvalidDate {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_original_run() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.symbol, DEFAULT_SYMBOL);
        assert_eq!(config.start_date, parse_date("start", "2016-06-01").unwrap());
        assert_eq!(config.end_date, parse_date("end", "2017-06-01").unwrap());
        assert_eq!(config.chart.height, 800);
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("STOCK_CHART_SYMBOL", " msft "),
            ("STOCK_CHART_START", "2020-01-01"),
            ("STOCK_CHART_END", "2020-12-31"),
            ("STOCK_CHART_BASE_URL", "http://localhost:9000/"),
        ]))
        .unwrap();

        assert_eq!(config.symbol, "MSFT");
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2020, 12, 31).unwrap());
        assert_eq!(config.provider.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("STOCK_CHART_START", "01/06/2016")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDate { key: "STOCK_CHART_START", .. }));
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("STOCK_CHART_START", "2018-01-01"),
            ("STOCK_CHART_END", "2017-01-01"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRange { .. }));
    }

    #[test]
    fn test_blank_symbol_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("STOCK_CHART_SYMBOL", "   ")])).unwrap_err();
        assert_eq!(err, ConfigError::EmptySymbol);
    }
}
