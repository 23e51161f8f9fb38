use std::collections::HashSet;

use chrono::NaiveDate;
use error_stack::{Report, bail};
use tracing::{info, warn};

use crate::error::NormalizeError;
use crate::model::{
    ADJ_CLOSE, CLOSE, ColumnData, HIGH, LOW, OPEN, PriceTable, REQUIRED_COLUMNS, RawColumn,
    RawTable, Series, VOLUME,
};

/// Turn a provider table into a [`PriceTable`].
///
/// Empty input short-circuits to [`PriceTable::empty`]. Otherwise duplicate
/// column names keep their first occurrence, every column is flattened to one
/// dimension, required columns are checked, rows holding any unusable value
/// are dropped and the index is sorted with duplicate dates removed.
pub fn normalize(raw: RawTable) -> Result<PriceTable, Report<NormalizeError>> {
    if raw.is_empty() {
        info!("provider returned no rows, using empty canonical table");
        return Ok(PriceTable::empty());
    }

    let rows = raw.len();
    let columns = dedup_columns(raw.columns);
    let columns = columns
        .into_iter()
        .map(|c| flatten(c, rows))
        .collect::<Result<Vec<_>, _>>()?;

    check_required(&columns)?;

    let keep: Vec<bool> = (0..rows)
        .map(|i| columns.iter().all(|(_, values)| is_usable(values[i])))
        .collect();
    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped > 0 {
        info!(dropped, rows, "dropped rows with unusable values");
    }

    let order = ordered_rows(&raw.index, &keep);

    let pick = |name: &str| -> Option<Vec<f64>> {
        columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| order.iter().filter_map(|&i| values[i]).collect())
    };

    // `check_required` guarantees these are present.
    let table = PriceTable {
        dates: order.iter().map(|&i| raw.index[i]).collect(),
        open: pick(OPEN).unwrap_or_default(),
        high: pick(HIGH).unwrap_or_default(),
        low: pick(LOW).unwrap_or_default(),
        close: pick(CLOSE).unwrap_or_default(),
        adj_close: pick(ADJ_CLOSE),
        volume: pick(VOLUME).unwrap_or_default(),
    };

    info!(
        rows_in = rows,
        rows_out = table.len(),
        adjusted = table.adj_close.is_some(),
        "normalized price table"
    );

    Ok(table)
}

fn dedup_columns(columns: Vec<RawColumn>) -> Vec<RawColumn> {
    let mut seen = HashSet::new();
    columns
        .into_iter()
        .filter(|c| {
            let first = seen.insert(c.name.clone());
            if !first {
                warn!(column = %c.name, "duplicate column name, keeping first occurrence");
            }
            first
        })
        .collect()
}

fn flatten(column: RawColumn, rows: usize) -> Result<(String, Series), Report<NormalizeError>> {
    let width = column.data.width();
    let values = match column.data {
        ColumnData::Flat(values) => values,
        ColumnData::Nested(mut parts) if parts.len() == 1 => parts.remove(0),
        ColumnData::Nested(_) => bail!(NormalizeError::AmbiguousColumn {
            name: column.name,
            width,
        }),
    };

    if values.len() != rows {
        bail!(NormalizeError::LengthMismatch {
            name: column.name,
            expected: rows,
            actual: values.len(),
        });
    }

    Ok((column.name, values))
}

fn check_required(columns: &[(String, Series)]) -> Result<(), Report<NormalizeError>> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !columns.iter().any(|(n, _)| n == *name))
        .map(|name| (*name).to_owned())
        .collect();

    if !missing.is_empty() {
        bail!(NormalizeError::MissingColumn { missing });
    }
    Ok(())
}

/// Values that are absent, non-finite, overflow-sized or exactly zero carry
/// no usable information.
fn is_usable(value: Option<f64>) -> bool {
    value.is_some_and(|v| v.is_finite() && v != 0.0 && v.abs() < 709f64.exp())
}

/// Indices of kept rows in ascending date order, first occurrence of each date.
fn ordered_rows(index: &[NaiveDate], keep: &[bool]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..index.len()).filter(|&i| keep[i]).collect();
    // Stable sort keeps the original order among equal dates.
    order.sort_by_key(|&i| index[i]);

    let before = order.len();
    order.dedup_by_key(|i| index[*i]);
    if order.len() < before {
        warn!(
            duplicates = before - order.len(),
            "duplicate dates in provider data, keeping first row"
        );
    }
    order
}
