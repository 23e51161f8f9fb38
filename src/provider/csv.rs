use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::model::{DATE, PriceQuery, RawColumn, RawTable, Series};
use crate::provider::PriceProvider;

const PROVIDER: &str = "csv";

/// Reads daily history exported as `Date,Open,High,Low,Close,Adj Close,Volume`.
///
/// Every numeric header other than `Date` becomes a column, so a file
/// missing a required field fails later in normalization with the field
/// named. Columns holding text (a `Currency` or `Symbol` field) are skipped.
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PriceProvider for CsvProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn fetch(&self, query: &PriceQuery) -> BoxFuture<'_, Result<RawTable, Report<ProviderError>>> {
        let query = query.clone();
        Box::pin(async move {
            let table = load(&self.path, query.start, query.end)
                .attach_with(|| format!("path: {}", self.path.display()))?;
            info!(
                symbol = %query.symbol,
                rows = table.len(),
                "csv history load complete"
            );
            Ok(table)
        })
    }
}

/// Load rows dated within `[start, end)`.
fn load(path: &Path, start: NaiveDate, end: NaiveDate) -> Result<RawTable, Report<ProviderError>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .from_path(path)
        .change_context(ProviderError::ReadFile)?;

    let headers = reader
        .headers()
        .change_context(ProviderError::ReadFile)?
        .clone();
    let Some(date_col) = headers.iter().position(|h| h == DATE) else {
        return Err(Report::new(ProviderError::ResponseParse {
            provider: PROVIDER.into(),
        })
        .attach("no Date header"));
    };

    let mut index = Vec::new();
    let mut values: Vec<Series> = vec![Vec::new(); headers.len()];
    let mut textual = vec![false; headers.len()];
    let mut skipped = 0usize;

    for (line, record) in reader.records().enumerate() {
        let record = record.change_context(ProviderError::ReadFile)?;
        let raw_date = record.get(date_col).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .change_context(ProviderError::ResponseParse {
                provider: PROVIDER.into(),
            })
            .attach_with(|| format!("row {}: bad date {raw_date:?}", line + 1))?;
        if date < start || date >= end {
            skipped += 1;
            continue;
        }

        index.push(date);
        for (col, series) in values.iter_mut().enumerate() {
            let cell = record.get(col).unwrap_or_default();
            let value = cell.parse::<f64>().ok();
            if value.is_none() && !cell.is_empty() {
                textual[col] = true;
            }
            series.push(value);
        }
    }

    debug!(kept = index.len(), skipped, "csv rows filtered to range");

    let columns = headers
        .iter()
        .zip(values)
        .enumerate()
        .filter(|(col, (name, _))| {
            if *col == date_col {
                return false;
            }
            if textual[*col] {
                warn!(column = %name, "non-numeric column, skipping");
                return false;
            }
            true
        })
        .map(|(_, (name, series))| RawColumn::flat(name, series))
        .collect();

    Ok(RawTable { index, columns })
}
