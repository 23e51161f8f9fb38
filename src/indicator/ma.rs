use error_stack::{Report, bail};

use crate::error::IndicatorError;

/// Simple Moving Average.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// One value per full window; empty when `prices` is shorter than the
    /// period.
    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<f64> {
        prices
            .windows(self.period)
            .map(|w| w.iter().sum::<f64>() / self.period as f64)
            .collect()
    }

    /// Population standard deviation of each window around its mean.
    pub fn rolling_std(&self, prices: &[f64], means: &[f64]) -> Vec<f64> {
        prices
            .windows(self.period)
            .zip(means)
            .map(|(window, &mean)| {
                let variance =
                    window.iter().map(|&p| (p - mean).powi(2)).sum::<f64>() / self.period as f64;
                variance.sqrt()
            })
            .collect()
    }
}
