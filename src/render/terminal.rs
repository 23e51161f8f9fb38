use error_stack::Report;

use crate::engine::columns;
use crate::error::RenderError;
use crate::pipeline::Dashboard;
use crate::present::table::TabularView;
use crate::render::Renderer;

/// Rows where a Bollinger breach flag is set.
fn breaches(table: &TabularView, flag: &str) -> usize {
    table
        .columns
        .iter()
        .find(|c| c.name == flag)
        .map_or(0, |c| c.values.iter().filter(|v| **v == Some(1.0)).count())
}

/// Logs a one-glance summary of the run.
pub struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn render(&self, dashboard: &Dashboard) -> Result<(), Report<RenderError>> {
        let table = &dashboard.presentation.table;
        let last_close = table
            .columns
            .iter()
            .find(|c| c.name == columns::CLOSE)
            .and_then(|c| c.values.iter().rev().find_map(|v| *v));
        let close_stats = table.summary_for(columns::CLOSE);

        tracing::info!(
            run_id = %dashboard.run_id,
            symbol = %dashboard.query.symbol,
            start = %dashboard.query.start,
            end = %dashboard.query.end,
            rows = table.row_count(),
            last_close = ?last_close,
            close_min = ?close_stats.and_then(|s| s.min),
            close_max = ?close_stats.and_then(|s| s.max),
            upper_breaches = breaches(table, columns::BB_HIGH_INDICATOR),
            lower_breaches = breaches(table, columns::BB_LOW_INDICATOR),
            traces = dashboard.presentation.charts.combined.data.len(),
            notes = dashboard.annotations.text_annotations.len(),
            "dashboard ready"
        );

        if table.row_count() == 0 {
            tracing::warn!(symbol = %dashboard.query.symbol, "no price data for range");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::annotation::AnnotationSet;
    use crate::config::ChartConfig;
    use crate::model::{ColumnKey, EnrichedTable, PriceQuery};
    use crate::present::assemble;

    #[test]
    fn terminal_renderer_handles_empty_dashboard() {
        let dashboard = Dashboard {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            query: PriceQuery {
                symbol: "KRW-BTC".into(),
                start: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            },
            presentation: assemble(EnrichedTable::default(), &ChartConfig::default()),
            annotations: AnnotationSet::default(),
        };
        assert!(TerminalRenderer.render(&dashboard).is_ok());
    }

    #[test]
    fn breach_flags_are_counted() {
        let mut enriched = EnrichedTable {
            dates: vec![
                NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 2, 2).unwrap(),
                NaiveDate::from_ymd_opt(2021, 2, 3).unwrap(),
            ],
            columns: Vec::new(),
        };
        enriched.push(
            &ColumnKey::new("Bollinger Bands", "High Indicator"),
            vec![None, Some(1.0), Some(1.0)],
        );
        enriched.push(
            &ColumnKey::new("Bollinger Bands", "Low Indicator"),
            vec![None, Some(0.0), Some(0.0)],
        );
        let view = TabularView::new(enriched);
        assert_eq!(breaches(&view, columns::BB_HIGH_INDICATOR), 2);
        assert_eq!(breaches(&view, columns::BB_LOW_INDICATOR), 0);
        assert_eq!(breaches(&view, columns::ADI), 0);
    }
}
