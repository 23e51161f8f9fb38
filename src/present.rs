pub mod chart;
pub mod table;

use serde::Serialize;
use tracing::debug;

use crate::config::ChartConfig;
use crate::model::EnrichedTable;
use chart::{ChartSpec, Trace, adi_chart, combined_chart, price_chart, volume_chart};
use table::TabularView;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Charts {
    /// Price, bands, volume and ADI on shared axes.
    pub combined: ChartSpec,
    pub price: ChartSpec,
    pub volume: ChartSpec,
    pub adi: ChartSpec,
}

/// Everything the renderers need from one enriched table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub table: TabularView,
    pub charts: Charts,
}

pub fn assemble(table: EnrichedTable, config: &ChartConfig) -> Presentation {
    let charts = Charts {
        combined: combined_chart(&table, config),
        price: price_chart(&table, config),
        volume: volume_chart(&table, config),
        adi: adi_chart(&table, config),
    };
    debug!(
        rows = table.len(),
        traces = charts.combined.data.len(),
        points = charts.combined.data.first().map_or(0, Trace::point_count),
        "presentation assembled"
    );

    Presentation {
        table: TabularView::new(table),
        charts,
    }
}
