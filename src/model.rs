use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// A numeric column aligned with a table index. `None` marks an undefined
/// value (missing upstream, or inside an indicator's warm-up region).
pub type Series = Vec<Option<f64>>;

pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const ADJ_CLOSE: &str = "Adj Close";
pub const VOLUME: &str = "Volume";
pub const DATE: &str = "Date";

/// Columns every normalized table must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[OPEN, HIGH, LOW, CLOSE, VOLUME];

/// Column set reported for a table with no rows.
pub const CANONICAL_EMPTY_COLUMNS: &[&str] = &[DATE, CLOSE, OPEN, VOLUME, ADJ_CLOSE];

/// Symbol and date range of one dashboard run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuery {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for PriceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} .. {})", self.symbol, self.start, self.end)
    }
}

/// Values of a provider column. Some providers hand back a 2-D block for a
/// single field (one sub-column per ticker); those arrive as `Nested`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Flat(Series),
    Nested(Vec<Series>),
}

impl ColumnData {
    pub fn width(&self) -> usize {
        match self {
            Self::Flat(_) => 1,
            Self::Nested(parts) => parts.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub data: ColumnData,
}

impl RawColumn {
    pub fn flat(name: impl Into<String>, values: Series) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Flat(values),
        }
    }
}

/// Table as delivered by a price provider, before any cleaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub index: Vec<NaiveDate>,
    pub columns: Vec<RawColumn>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }
}

/// Cleaned OHLCV table: one row per date, strictly ascending, every value
/// defined and usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceTable {
    pub dates: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    /// Absent when the provider does not publish adjusted prices.
    pub adj_close: Option<Vec<f64>>,
    pub volume: Vec<f64>,
}

impl PriceTable {
    /// Empty table with the canonical column set.
    pub fn empty() -> Self {
        Self {
            adj_close: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Adjusted close when available, plain close otherwise.
    pub fn reference_close(&self) -> &[f64] {
        self.adj_close.as_deref().unwrap_or(&self.close)
    }
}

/// Two-level column name: a display category and a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub category: String,
    pub field: String,
}

impl ColumnKey {
    pub fn new(category: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            field: field.into(),
        }
    }

    /// Single-level name: `"{category}_{field}"`, or the bare field when the
    /// category is empty.
    pub fn flat_name(&self) -> String {
        if self.category.is_empty() {
            self.field.clone()
        } else {
            format!("{}_{}", self.category, self.field)
        }
    }
}

/// Flatten two-level keys in order.
pub fn flatten_names<'a>(keys: impl IntoIterator<Item = &'a ColumnKey>) -> Vec<String> {
    keys.into_iter().map(ColumnKey::flat_name).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSeries {
    pub name: String,
    pub values: Series,
}

/// Price table plus indicator columns, addressed by flattened name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichedTable {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<NamedSeries>,
}

impl EnrichedTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.values)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn push(&mut self, key: &ColumnKey, values: Series) {
        self.columns.push(NamedSeries {
            name: key.flat_name(),
            values,
        });
    }
}

pub fn defined(values: &[f64]) -> Series {
    values.iter().copied().map(Some).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_joins_category_and_field() {
        let keys = [
            ColumnKey::new("Bollinger Bands", "Middle"),
            ColumnKey::new("", "Date"),
        ];
        assert_eq!(
            flatten_names(&keys),
            vec!["Bollinger Bands_Middle".to_owned(), "Date".to_owned()]
        );
    }

    #[test]
    fn reference_close_falls_back_to_close() {
        let mut table = PriceTable {
            dates: vec![NaiveDate::from_ymd_opt(2021, 1, 4).unwrap()],
            open: vec![1.0],
            high: vec![2.0],
            low: vec![0.5],
            close: vec![1.5],
            adj_close: None,
            volume: vec![10.0],
        };
        assert_eq!(table.reference_close(), &[1.5]);

        table.adj_close = Some(vec![1.4]);
        assert_eq!(table.reference_close(), &[1.4]);
    }

    #[test]
    fn empty_table_has_adjusted_close_column() {
        let table = PriceTable::empty();
        assert!(table.is_empty());
        assert!(table.adj_close.is_some());
    }

    #[test]
    fn enriched_column_lookup_by_flat_name() {
        let mut table = EnrichedTable::default();
        table.push(&ColumnKey::new("Indicators", "ADI"), vec![Some(1.0)]);
        assert_eq!(table.column("Indicators_ADI"), Some(&vec![Some(1.0)]));
        assert!(table.column("ADI").is_none());
    }

    #[test]
    fn query_display() {
        let query = PriceQuery {
            symbol: "BTC-USD".into(),
            start: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(),
        };
        assert_eq!(query.to_string(), "BTC-USD [2021-01-01 .. 2021-12-31)");
    }
}
