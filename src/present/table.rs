use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{EnrichedTable, NamedSeries};

/// Descriptive statistics of one numeric column. Undefined values are
/// ignored; statistics of a column with no defined value are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; needs at least two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub q50: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    pub fn describe(column: &NamedSeries) -> Self {
        let mut values: Vec<f64> = column.values.iter().flatten().copied().collect();
        values.sort_by(f64::total_cmp);

        let count = values.len();
        let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
        let std = mean.filter(|_| count > 1).map(|mean| {
            let ss = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (ss / (count - 1) as f64).sqrt()
        });

        Self {
            name: column.name.clone(),
            count,
            mean,
            std,
            min: values.first().copied(),
            q25: quantile(&values, 0.25),
            q50: quantile(&values, 0.50),
            q75: quantile(&values, 0.75),
            max: values.last().copied(),
        }
    }
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// The enriched table as displayed, with its statistics summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularView {
    #[serde(rename = "Date")]
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<NamedSeries>,
    pub summary: Vec<ColumnSummary>,
}

impl TabularView {
    pub fn new(table: EnrichedTable) -> Self {
        let summary = table.columns.iter().map(ColumnSummary::describe).collect();
        Self {
            dates: table.dates,
            columns: table.columns,
            summary,
        }
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn summary_for(&self, name: &str) -> Option<&ColumnSummary> {
        self.summary.iter().find(|s| s.name == name)
    }
}
