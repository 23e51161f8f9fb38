use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::ma::Sma;
use crate::indicator::{Indicator, align_series, backfill};
use crate::model::{ColumnKey, PriceTable, Series};

pub const CATEGORY: &str = "Bollinger Bands";

/// Bands and breach flags, one value per input row.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerOutput {
    pub middle: Series,
    pub upper: Series,
    pub lower: Series,
    /// 1.0 where close is above the upper band.
    pub high_flag: Series,
    /// 1.0 where close is below the lower band.
    pub low_flag: Series,
}

pub struct BollingerBands {
    sma: Sma,
    deviation: f64,
    fill_warmup: bool,
}

impl BollingerBands {
    pub fn new(window: usize, deviation: f64) -> Result<Self, Report<IndicatorError>> {
        if window == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "window must be > 0".into(),
            });
        }
        if deviation.is_nan() || deviation <= 0.0 {
            bail!(IndicatorError::InvalidParameter {
                name: "deviation must be > 0".into(),
            });
        }
        Ok(Self {
            sma: Sma::new(window)?,
            deviation,
            fill_warmup: false,
        })
    }

    /// Backfill band values and zero the flags inside the warm-up region.
    pub fn with_fill_warmup(mut self, fill: bool) -> Self {
        self.fill_warmup = fill;
        self
    }

    pub fn calculate_bands(&self, close: &[f64]) -> BollingerOutput {
        let len = close.len();
        let middle = self.sma.calculate_prices(close);
        let std = self.sma.rolling_std(close, &middle);

        let upper: Vec<f64> = middle
            .iter()
            .zip(&std)
            .map(|(m, s)| m + self.deviation * s)
            .collect();
        let lower: Vec<f64> = middle
            .iter()
            .zip(&std)
            .map(|(m, s)| m - self.deviation * s)
            .collect();

        let tail = &close[len - middle.len()..];
        let high_flag = tail
            .iter()
            .zip(&upper)
            .map(|(c, u)| if c > u { 1.0 } else { 0.0 })
            .collect();
        let low_flag = tail
            .iter()
            .zip(&lower)
            .map(|(c, l)| if c < l { 1.0 } else { 0.0 })
            .collect();

        let mut output = BollingerOutput {
            middle: align_series(len, middle),
            upper: align_series(len, upper),
            lower: align_series(len, lower),
            high_flag: align_series(len, high_flag),
            low_flag: align_series(len, low_flag),
        };

        if self.fill_warmup {
            backfill(&mut output.middle);
            backfill(&mut output.upper);
            backfill(&mut output.lower);
            for flag in output.high_flag.iter_mut().chain(output.low_flag.iter_mut()) {
                flag.get_or_insert(0.0);
            }
        }

        output
    }
}

impl Indicator for BollingerBands {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn warmup(&self) -> usize {
        self.sma.period() - 1
    }

    fn calculate(
        &self,
        table: &PriceTable,
    ) -> Result<Vec<(ColumnKey, Series)>, Report<IndicatorError>> {
        let bands = self.calculate_bands(&table.close);
        Ok(vec![
            (ColumnKey::new(CATEGORY, "Middle"), bands.middle),
            (ColumnKey::new(CATEGORY, "High"), bands.upper),
            (ColumnKey::new(CATEGORY, "Low"), bands.lower),
            (ColumnKey::new(CATEGORY, "High Indicator"), bands.high_flag),
            (ColumnKey::new(CATEGORY, "Low Indicator"), bands.low_flag),
        ])
    }
}
