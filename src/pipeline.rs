use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::annotation::AnnotationSet;
use crate::config::{ChartConfig, IndicatorConfig};
use crate::engine::IndicatorEngine;
use crate::error::PipelineError;
use crate::model::{PriceQuery, RawTable};
use crate::normalize::normalize;
use crate::present::{Presentation, assemble};

/// Output of one dashboard run.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub query: PriceQuery,
    #[serde(flatten)]
    pub presentation: Presentation,
    pub annotations: AnnotationSet,
}

/// Run normalize → enrich → assemble over one provider table.
///
/// Missing required columns abort the run; every other condition (empty
/// input, short history, flat indicator) still produces a dashboard.
pub fn run(
    raw: RawTable,
    query: PriceQuery,
    indicators: &IndicatorConfig,
    chart: &ChartConfig,
    annotations: AnnotationSet,
) -> Result<Dashboard, Report<PipelineError>> {
    let engine = IndicatorEngine::new(indicators).change_context(PipelineError::Indicators)?;

    let prices = normalize(raw)
        .change_context(PipelineError::Normalize)
        .attach_with(|| format!("query: {query}"))?;

    let enriched = engine
        .enrich(&prices)
        .change_context(PipelineError::Indicators)
        .attach_with(|| format!("query: {query}"))?;

    let presentation = assemble(enriched, chart);

    let dashboard = Dashboard {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        query,
        presentation,
        annotations,
    };

    info!(
        run_id = %dashboard.run_id,
        symbol = %dashboard.query.symbol,
        rows = dashboard.presentation.table.row_count(),
        "dashboard built"
    );

    Ok(dashboard)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;
    use crate::engine::columns;
    use crate::error::NormalizeError;
    use crate::model::{ADJ_CLOSE, CLOSE, HIGH, LOW, OPEN, RawColumn, Series, VOLUME};

    fn query() -> PriceQuery {
        PriceQuery {
            symbol: "BTC-USD".into(),
            start: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(),
        }
    }

    fn trading_year(rows: usize) -> RawTable {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let close: Vec<f64> = (0..rows)
            .map(|i| 30_000.0 + (i as f64 / 9.0).sin() * 4_000.0 + i as f64 * 40.0)
            .collect();
        let series = |f: &dyn Fn(f64) -> f64| -> Series {
            close.iter().map(|c| Some(f(*c))).collect()
        };
        RawTable {
            index: (0..rows)
                .map(|i| start + Duration::days(i as i64))
                .collect(),
            columns: vec![
                RawColumn::flat(OPEN, series(&|c| c - 50.0)),
                RawColumn::flat(HIGH, series(&|c| c + 300.0)),
                RawColumn::flat(LOW, series(&|c| c - 250.0)),
                RawColumn::flat(CLOSE, series(&|c| c)),
                RawColumn::flat(ADJ_CLOSE, series(&|c| c)),
                RawColumn::flat(VOLUME, series(&|c| c * 1_000.0)),
            ],
        }
    }

    #[test]
    fn one_trading_year_end_to_end() {
        let dashboard = run(
            trading_year(252),
            query(),
            &IndicatorConfig::default(),
            &ChartConfig::default(),
            AnnotationSet::default(),
        )
        .unwrap();

        let table = &dashboard.presentation.table;
        assert_eq!(table.row_count(), 252);

        let middle = table
            .columns
            .iter()
            .find(|c| c.name == columns::BB_MIDDLE)
            .unwrap();
        assert!(middle.values[..19].iter().all(Option::is_none));
        assert!(middle.values[19..].iter().all(Option::is_some));

        let combined = &dashboard.presentation.charts.combined;
        assert_eq!(combined.data.len(), 7);
        assert_eq!(combined.data[0].point_count(), 252);
        assert_eq!(combined.data[0].name, "Adj Close");
    }

    #[test]
    fn empty_provider_result_yields_empty_dashboard() {
        let dashboard = run(
            RawTable::default(),
            query(),
            &IndicatorConfig::default(),
            &ChartConfig::default(),
            AnnotationSet::default(),
        )
        .unwrap();
        assert_eq!(dashboard.presentation.table.row_count(), 0);
        assert!(
            dashboard
                .presentation
                .charts
                .combined
                .data
                .iter()
                .all(|t| t.point_count() == 0)
        );
    }

    #[test]
    fn missing_columns_abort_with_names() {
        let mut raw = trading_year(30);
        raw.columns.retain(|c| c.name != VOLUME && c.name != LOW);
        let err = run(
            raw,
            query(),
            &IndicatorConfig::default(),
            &ChartConfig::default(),
            AnnotationSet::default(),
        )
        .unwrap_err();

        assert!(matches!(err.current_context(), PipelineError::Normalize));
        let missing = err
            .downcast_ref::<NormalizeError>()
            .map(|e| e.to_string())
            .unwrap();
        assert_eq!(missing, "missing required columns: Low, Volume");
    }

    #[test]
    fn dashboard_serializes_flat_sections() {
        let mut notes = AnnotationSet::default();
        notes.add_note("watch the 20-day band");
        let dashboard = run(
            trading_year(25),
            query(),
            &IndicatorConfig::default(),
            &ChartConfig::default(),
            notes,
        )
        .unwrap();
        let json = serde_json::to_value(&dashboard).unwrap();
        assert!(json.get("table").is_some());
        assert!(json["charts"]["combined"]["data"].is_array());
        assert_eq!(json["query"]["symbol"], "BTC-USD");
        assert_eq!(
            json["annotations"]["text_annotations"][0],
            "watch the 20-day band"
        );
    }
}
