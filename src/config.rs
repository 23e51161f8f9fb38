use std::path::Path;

use chrono::NaiveDate;
use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_output_dir() -> String {
    "./output".into()
}

fn default_provider_name() -> String {
    "yahoo".into()
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".into()
}

fn default_requests_per_second() -> u32 {
    2
}

fn default_symbol() -> String {
    "BTC-USD".into()
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default()
}

fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 12, 31).unwrap_or_default()
}

fn default_bollinger_window() -> usize {
    20
}

fn default_bollinger_deviation() -> f64 {
    2.0
}

fn default_chart_title() -> String {
    "Adjusted Close Price, Bollinger Bands, Volume, and ADI".into()
}

fn default_chart_width() -> u32 {
    1000
}

fn default_chart_height() -> u32 {
    600
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub chart: ChartConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    /// Accepted values: `"yahoo"` | `"csv"`
    #[serde(default = "default_provider_name")]
    pub name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    /// Source file for the `csv` provider.
    pub csv_path: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: default_base_url(),
            requests_per_second: default_requests_per_second(),
            csv_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_start")]
    pub start: NaiveDate,
    #[serde(default = "default_end")]
    pub end: NaiveDate,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            start: default_start(),
            end: default_end(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "default_bollinger_window")]
    pub bollinger_window: usize,
    #[serde(default = "default_bollinger_deviation")]
    pub bollinger_deviation: f64,
    /// Backfill band values inside the warm-up region instead of leaving
    /// them undefined.
    #[serde(default)]
    pub fill_warmup: bool,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            bollinger_window: default_bollinger_window(),
            bollinger_deviation: default_bollinger_deviation(),
            fill_warmup: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_chart_title")]
    pub title: String,
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: default_chart_title(),
            width: default_chart_width(),
            height: default_chart_height(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_PROVIDERS: &[&str] = &["yahoo", "csv"];
const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

pub fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(config)?;
    validate_provider(config)?;
    validate_query(config)?;
    validate_indicators(config)?;
    validate_chart(config)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_LOG_FORMATS.contains(&config.general.log_format.as_str()) {
        return Err(invalid(format!(
            "general.log_format \"{}\" is not valid",
            config.general.log_format
        )));
    }
    Ok(())
}

fn validate_provider(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let provider = &config.provider;
    if !VALID_PROVIDERS.contains(&provider.name.as_str()) {
        return Err(invalid(format!(
            "provider.name \"{}\" is not a known provider",
            provider.name
        )));
    }
    if provider.name == "csv" && provider.csv_path.is_none() {
        return Err(invalid(
            "provider.csv_path is required for provider \"csv\"".into(),
        ));
    }
    if provider.requests_per_second == 0 {
        return Err(invalid("provider.requests_per_second must be > 0".into()));
    }
    Ok(())
}

fn validate_query(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if config.query.start > config.query.end {
        return Err(invalid(format!(
            "query.start {} is after query.end {}",
            config.query.start, config.query.end
        )));
    }
    Ok(())
}

fn validate_indicators(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let indicators = &config.indicators;
    if indicators.bollinger_window == 0 {
        return Err(invalid("indicators.bollinger_window must be > 0".into()));
    }
    if indicators.bollinger_deviation.is_nan() || indicators.bollinger_deviation <= 0.0 {
        return Err(invalid("indicators.bollinger_deviation must be > 0".into()));
    }
    Ok(())
}

fn validate_chart(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if config.chart.width == 0 || config.chart.height == 0 {
        return Err(invalid(format!(
            "chart size {}x{} must be positive",
            config.chart.width, config.chart.height
        )));
    }
    Ok(())
}
