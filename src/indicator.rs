pub mod adi;
pub mod bollinger;
pub mod ma;
pub mod rescale;

use error_stack::Report;

use crate::error::IndicatorError;
use crate::model::{ColumnKey, PriceTable, Series};

/// A technical analysis indicator computed over a whole price table.
///
/// Every returned series has exactly one value per table row; rows inside
/// the warm-up region are `None`.
pub trait Indicator: Send + Sync {
    /// Unique name of this indicator (e.g., "bollinger", "adi").
    fn name(&self) -> &str;

    /// Number of leading rows without a defined value.
    fn warmup(&self) -> usize;

    /// Calculate the indicator's output columns, in display order.
    fn calculate(
        &self,
        table: &PriceTable,
    ) -> Result<Vec<(ColumnKey, Series)>, Report<IndicatorError>>;
}

/// Right-align `values` in a series of `total_len` rows, leaving the leading
/// rows undefined.
pub fn align_series(total_len: usize, values: Vec<f64>) -> Series {
    let offset = total_len.saturating_sub(values.len());
    let mut output = vec![None; total_len];
    for (index, value) in values.into_iter().take(total_len).enumerate() {
        output[offset + index] = Some(value);
    }
    output
}

/// Fill undefined leading rows with the first defined value.
pub fn backfill(series: &mut Series) {
    let Some(first) = series.iter().flatten().next().copied() else {
        return;
    };
    for value in series.iter_mut() {
        if value.is_some() {
            break;
        }
        *value = Some(first);
    }
}
