use error_stack::{Report, ResultExt};
use tracing::{debug, info};

use crate::config::IndicatorConfig;
use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::adi::AccDistIndex;
use crate::indicator::bollinger::BollingerBands;
use crate::indicator::rescale::rescale_into;
use crate::model::{
    ADJ_CLOSE, CANONICAL_EMPTY_COLUMNS, CLOSE, ColumnKey, DATE, EnrichedTable, HIGH, LOW, OPEN,
    PriceTable, VOLUME, defined, flatten_names,
};

pub const PRICE_CATEGORY: &str = "Price Data";
pub const SCALED_CATEGORY: &str = "Scaled";

/// Flattened names of the columns the chart and renderers look up.
pub mod columns {
    pub const ADJ_CLOSE: &str = "Price Data_Adj Close";
    pub const CLOSE: &str = "Price Data_Close";
    pub const VOLUME: &str = "Price Data_Volume";
    pub const BB_MIDDLE: &str = "Bollinger Bands_Middle";
    pub const BB_HIGH: &str = "Bollinger Bands_High";
    pub const BB_LOW: &str = "Bollinger Bands_Low";
    pub const BB_HIGH_INDICATOR: &str = "Bollinger Bands_High Indicator";
    pub const BB_LOW_INDICATOR: &str = "Bollinger Bands_Low Indicator";
    pub const ADI: &str = "Indicators_ADI";
    pub const SCALED_ADI: &str = "Scaled_ADI";
}

/// Appends indicator columns to a normalized price table.
pub struct IndicatorEngine {
    indicators: Vec<Box<dyn Indicator>>,
}

impl IndicatorEngine {
    pub fn new(config: &IndicatorConfig) -> Result<Self, Report<IndicatorError>> {
        let bollinger = BollingerBands::new(config.bollinger_window, config.bollinger_deviation)?
            .with_fill_warmup(config.fill_warmup);
        Ok(Self::with_indicators(vec![
            Box::new(bollinger),
            Box::new(AccDistIndex),
        ]))
    }

    pub fn with_indicators(indicators: Vec<Box<dyn Indicator>>) -> Self {
        Self { indicators }
    }

    /// Build the enriched table.
    ///
    /// An empty table skips every indicator and keeps only the canonical
    /// column set. Otherwise the price columns come first under
    /// `Price Data`, followed by each indicator's columns and finally the
    /// ADI rescaled into the reference close range as `Scaled_ADI`.
    pub fn enrich(&self, table: &PriceTable) -> Result<EnrichedTable, Report<IndicatorError>> {
        if table.is_empty() {
            info!("empty price table, skipping indicators");
            return Ok(empty_enriched());
        }

        let mut enriched = EnrichedTable {
            dates: table.dates.clone(),
            columns: Vec::new(),
        };
        push_price_columns(&mut enriched, table);

        for indicator in &self.indicators {
            let outputs = indicator
                .calculate(table)
                .attach_with(|| format!("indicator: {}", indicator.name()))?;
            debug!(
                indicator = indicator.name(),
                columns = ?flatten_names(outputs.iter().map(|(key, _)| key)),
                warmup = indicator.warmup(),
                "indicator computed"
            );
            for (key, values) in outputs {
                if values.len() != table.len() {
                    return Err(Report::new(IndicatorError::LengthMismatch {
                        expected: table.len(),
                        actual: values.len(),
                    })
                    .attach(format!("column: {}", key.flat_name())));
                }
                enriched.push(&key, values);
            }
        }

        if let Some(adi) = enriched.column(columns::ADI) {
            let scaled = rescale_into(adi, table.reference_close());
            enriched.push(&ColumnKey::new(SCALED_CATEGORY, "ADI"), scaled);
        }

        info!(
            rows = enriched.len(),
            columns = enriched.columns.len(),
            "indicators applied"
        );
        debug!(columns = ?enriched.column_names(), "enriched column order");

        Ok(enriched)
    }
}

fn push_price_columns(enriched: &mut EnrichedTable, table: &PriceTable) {
    let price = |field: &str| ColumnKey::new(PRICE_CATEGORY, field);
    enriched.push(&price(OPEN), defined(&table.open));
    enriched.push(&price(HIGH), defined(&table.high));
    enriched.push(&price(LOW), defined(&table.low));
    enriched.push(&price(CLOSE), defined(&table.close));
    if let Some(adj) = &table.adj_close {
        enriched.push(&price(ADJ_CLOSE), defined(adj));
    }
    enriched.push(&price(VOLUME), defined(&table.volume));
}

fn empty_enriched() -> EnrichedTable {
    let mut enriched = EnrichedTable::default();
    for name in CANONICAL_EMPTY_COLUMNS.iter().filter(|n| **n != DATE) {
        enriched.push(&ColumnKey::new("", *name), Vec::new());
    }
    enriched
}
