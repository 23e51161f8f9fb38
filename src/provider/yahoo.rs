use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime};
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::model::{ADJ_CLOSE, CLOSE, HIGH, LOW, OPEN, PriceQuery, RawColumn, RawTable, VOLUME};
use crate::provider::PriceProvider;

const PROVIDER: &str = "yahoo";
const USER_AGENT: &str = "Mozilla/5.0";
const FALLBACK_REQUESTS_PER_SECOND: NonZeroU32 = nonzero!(2u32);

pub struct YahooProvider {
    base_url: String,
    client: reqwest::Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, Report<ProviderError>> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .change_context(ProviderError::Request {
                provider: PROVIDER.into(),
            })?;
        let rps =
            NonZeroU32::new(config.requests_per_second).unwrap_or(FALLBACK_REQUESTS_PER_SECOND);
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            client,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        })
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn fetch(&self, query: &PriceQuery) -> BoxFuture<'_, Result<RawTable, Report<ProviderError>>> {
        let query = query.clone();
        Box::pin(async move {
            if query.start >= query.end {
                debug!(query = %query, "empty date range, skipping request");
                return Ok(RawTable::default());
            }

            self.rate_limiter.until_ready().await;

            let url = format!("{}/v8/finance/chart/{}", self.base_url, query.symbol);
            let period1 = day_timestamp(query.start).to_string();
            let period2 = day_timestamp(query.end).to_string();
            let params = [
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("includeAdjustedClose", "true"),
            ];

            let response = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .await
                .change_context(ProviderError::Request {
                    provider: PROVIDER.into(),
                })
                .attach_with(|| format!("query: {query}"))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                warn!(symbol = %query.symbol, "symbol not found upstream");
                return Ok(RawTable::default());
            }
            if !status.is_success() {
                return Err(Report::new(ProviderError::Request {
                    provider: PROVIDER.into(),
                })
                .attach(format!("HTTP status: {status}")));
            }

            let body: ChartResponse =
                response
                    .json()
                    .await
                    .change_context(ProviderError::ResponseParse {
                        provider: PROVIDER.into(),
                    })?;

            let table = into_raw_table(body)?;
            info!(
                symbol = %query.symbol,
                rows = table.len(),
                "yahoo history fetch complete"
            );
            Ok(table)
        })
    }
}

/// Midnight UTC of `day` as a unix timestamp.
fn day_timestamp(day: NaiveDate) -> i64 {
    day.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

impl ChartError {
    fn is_no_data(&self) -> bool {
        self.code == "Not Found" || self.description.contains("No data found")
    }
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds; bars are dated in exchange time.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Vec<AdjCloseBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

fn into_raw_table(body: ChartResponse) -> Result<RawTable, Report<ProviderError>> {
    if let Some(error) = body.chart.error {
        if error.is_no_data() {
            warn!(code = %error.code, "{}", error.description);
            return Ok(RawTable::default());
        }
        return Err(Report::new(ProviderError::ResponseParse {
            provider: PROVIDER.into(),
        })
        .attach(format!("{}: {}", error.code, error.description)));
    }

    let Some(data) = body.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(RawTable::default());
    };
    if data.timestamp.is_empty() {
        return Ok(RawTable::default());
    }

    let offset = data.meta.gmtoffset;
    let index = data
        .timestamp
        .iter()
        .map(|&ts| {
            DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    Report::new(ProviderError::ResponseParse {
                        provider: PROVIDER.into(),
                    })
                    .attach(format!("invalid timestamp: {ts}"))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let rows = index.len();
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let mut columns = vec![
        RawColumn::flat(OPEN, padded(quote.open, rows)),
        RawColumn::flat(HIGH, padded(quote.high, rows)),
        RawColumn::flat(LOW, padded(quote.low, rows)),
        RawColumn::flat(CLOSE, padded(quote.close, rows)),
    ];
    if let Some(adj) = data.indicators.adjclose.into_iter().next() {
        columns.push(RawColumn::flat(ADJ_CLOSE, padded(adj.adjclose, rows)));
    }
    columns.push(RawColumn::flat(VOLUME, padded(quote.volume, rows)));

    Ok(RawTable { index, columns })
}

/// Align an upstream array with the timestamp index; short arrays pad with
/// undefined values, long ones are cut.
fn padded(mut values: Vec<Option<f64>>, rows: usize) -> Vec<Option<f64>> {
    values.resize(rows, None);
    values
}
