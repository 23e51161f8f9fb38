use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::model::{ColumnKey, PriceTable, Series, defined};

pub const CATEGORY: &str = "Indicators";

/// Accumulation/Distribution Index: running sum of close-location value
/// times volume.
///
/// `CLV = ((close - low) - (high - close)) / (high - low)`, taken as zero on
/// bars where `high == low`.
pub struct AccDistIndex;

impl AccDistIndex {
    pub fn calculate_series(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
        volume: &[f64],
    ) -> Result<Vec<f64>, Report<IndicatorError>> {
        let expected = close.len();
        for actual in [high.len(), low.len(), volume.len()] {
            if actual != expected {
                bail!(IndicatorError::LengthMismatch { expected, actual });
            }
        }

        let mut acc = 0.0;
        Ok((0..expected)
            .map(|i| {
                let range = high[i] - low[i];
                let clv = if range == 0.0 {
                    0.0
                } else {
                    ((close[i] - low[i]) - (high[i] - close[i])) / range
                };
                acc += clv * volume[i];
                acc
            })
            .collect())
    }
}

impl Indicator for AccDistIndex {
    fn name(&self) -> &str {
        "adi"
    }

    fn warmup(&self) -> usize {
        0
    }

    fn calculate(
        &self,
        table: &PriceTable,
    ) -> Result<Vec<(ColumnKey, Series)>, Report<IndicatorError>> {
        let adi = self.calculate_series(&table.high, &table.low, &table.close, &table.volume)?;
        Ok(vec![(ColumnKey::new(CATEGORY, "ADI"), defined(&adi))])
    }
}
