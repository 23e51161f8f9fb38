pub mod csv;
pub mod yahoo;

use error_stack::{Report, bail};
use futures::future::BoxFuture;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::model::{PriceQuery, RawTable};

/// Source of daily OHLCV history.
///
/// Uses `BoxFuture` (from `futures` crate) instead of `async fn` in trait
/// to keep the trait object-safe (`dyn PriceProvider`).
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch daily rows for `query.symbol` in `[query.start, query.end)`.
    ///
    /// An unknown symbol or an empty range yields an empty table.
    fn fetch(&self, query: &PriceQuery) -> BoxFuture<'_, Result<RawTable, Report<ProviderError>>>;
}

/// Build the provider named in `[provider]`.
pub fn build(config: &ProviderConfig) -> Result<Box<dyn PriceProvider>, Report<ProviderError>> {
    match config.name.as_str() {
        "yahoo" => Ok(Box::new(yahoo::YahooProvider::new(config)?)),
        "csv" => match &config.csv_path {
            Some(path) => Ok(Box::new(csv::CsvProvider::new(path))),
            None => bail!(ProviderError::ReadFile),
        },
        other => bail!(ProviderError::Request {
            provider: other.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_configured_provider() {
        let yahoo = build(&ProviderConfig::default()).unwrap();
        assert_eq!(yahoo.name(), "yahoo");

        let config = ProviderConfig {
            name: "csv".into(),
            csv_path: Some("prices.csv".into()),
            ..ProviderConfig::default()
        };
        assert_eq!(build(&config).unwrap().name(), "csv");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = ProviderConfig {
            name: "bloomberg".into(),
            ..ProviderConfig::default()
        };
        assert!(build(&config).is_err());
    }
}
